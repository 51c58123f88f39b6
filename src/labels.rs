//! Symbolic names for ROM addresses.
//!
//! Labels are discovered by scanning an assembly listing. A label line is
//! anchored to a ROM address by the comment that follows it:
//!
//! ```text
//! SECTION "bank5", ROMX, BANK[$5]
//! HelloWorld: ; 0x14050
//! Unknown: ; 5:4050
//! Later: ; $4050          <- resolved under the section bank
//! ```

use std::collections::HashMap;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::address::{parse_hex, to_pointer, BankedPointer, BANK_SIZE};
use crate::error::{DisasmError, Result};
use crate::map_names::MapConstants;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub name: String,
    pub address: u32,
    pub line_number: Option<usize>,
}

impl Label {
    pub fn new(name: &str, address: u32, line_number: Option<usize>) -> Result<Self> {
        if name.is_empty() {
            return Err(DisasmError::malformed(name, "label name is empty"));
        }
        Ok(Label {
            name: name.to_string(),
            address,
            line_number,
        })
    }

    pub fn bank(&self) -> u8 {
        (self.address / BANK_SIZE) as u8
    }

    /// Offset as the CPU sees it once the bank is switched in
    pub fn offset(&self) -> u16 {
        match BankedPointer::from_address(self.address) {
            Ok(pointer) => pointer.offset(),
            // outside the cartridge, the address is already CPU space
            Err(_) => self.address as u16,
        }
    }

    pub fn to_record(&self) -> LabelRecord {
        LabelRecord {
            label: self.name.clone(),
            address: self.address,
            bank: self.bank(),
            offset: self.offset(),
            line_number: self.line_number,
        }
    }
}

/// A label definition with no resolvable address comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddresslessLabel {
    pub name: String,
    pub line_number: usize,
}

/// Persisted form of a label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRecord {
    pub label: String,
    pub address: u32,
    pub bank: u8,
    pub offset: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<usize>,
}

impl LabelRecord {
    fn into_label(self) -> Result<Label> {
        let label = Label::new(&self.label, self.address, self.line_number)?;
        if label.bank() != self.bank || label.offset() != self.offset {
            return Err(DisasmError::malformed(
                &self.label,
                &format!(
                    "bank {:02x} offset {:04x} disagree with address {:#x}",
                    self.bank, self.offset, self.address
                ),
            ));
        }
        Ok(label)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LabelFile {
    #[serde(default)]
    labels: Vec<LabelRecord>,
}

/// Address resolved from a label comment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentAddress {
    pub bank: Option<u8>,
    pub address: u32,
}

/// Split a line at its first `;` that is not inside a string literal
fn split_comment(line: &str) -> (&str, Option<&str>) {
    let mut quote: Option<char> = None;
    for (i, c) in line.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == ';' => return (&line[..i], Some(&line[i + 1..])),
            None => {}
        }
    }
    (line, None)
}

/// Drop every quoted string, quotes included
pub fn remove_quoted_text(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut quote: Option<char> = None;
    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None => out.push(c),
        }
    }
    out
}

/// Name defined by a `Name:` at the very start of the line
pub fn label_from_line(line: &str) -> Option<&str> {
    let (code, _) = split_comment(line);
    let colon = code.find(':')?;
    let name = &code[..colon];
    let mut chars = name.chars();
    let first = chars.next()?;
    if !(first.is_ascii_alphabetic() || first == '_' || first == '.') {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.') {
        return None;
    }
    Some(name)
}

pub fn line_has_label(line: &str) -> bool {
    label_from_line(line).is_some()
}

fn is_prefixed(token: &str) -> bool {
    token.contains('$') || token.contains("0x") || token.contains("0X")
}

/// Parse the address in a line's trailing comment.
///
/// The first token after the first unquoted `;` is examined. It may be
/// `$hex`, `0xhex`, bare hex, or `bank:offset`. A bare token is only
/// accepted when it is the whole comment, so prose such as `; Face left`
/// is not read as an address. Offsets in the switchable window are
/// resolved under the bank from the token, else under `bank`.
pub fn comment_address(line: &str, bank: Option<u8>) -> Result<Option<CommentAddress>> {
    let comment = match split_comment(line).1 {
        Some(comment) => comment.trim(),
        None => return Ok(None),
    };
    let token = match comment.split_whitespace().next() {
        Some(token) => token,
        None => return Ok(None),
    };
    if !is_prefixed(token) && token != comment {
        return Ok(None);
    }

    let (bank, offset) = match token.split_once(':') {
        Some((b, o)) => {
            let b = match parse_hex(b) {
                Some(b) if b <= 0xFF => b as u8,
                _ => return Ok(None),
            };
            match parse_hex(o) {
                Some(o) => (Some(b), o),
                None => return Ok(None),
            }
        }
        None => match parse_hex(token) {
            Some(value) => (bank, value),
            None => return Ok(None),
        },
    };

    if (0x4000..0x8000).contains(&offset) {
        return match bank {
            Some(0) => Err(DisasmError::malformed(
                line,
                "bank 0 has no switchable window",
            )),
            Some(b) => Ok(Some(CommentAddress {
                bank: Some(b),
                address: to_pointer(offset, Some(b))?,
            })),
            // no bank known: read it as a file offset
            None => Ok(Some(CommentAddress {
                bank: None,
                address: offset,
            })),
        };
    }
    Ok(Some(CommentAddress {
        bank,
        address: offset,
    }))
}

pub fn line_has_comment_address(line: &str) -> bool {
    matches!(comment_address(line, None), Ok(Some(_)))
}

/// Bank selected by a `SECTION` directive. `None` when the line is not one,
/// `Some(None)` for a section whose bank cannot be read from it.
fn section_bank(line: &str) -> Option<Option<u8>> {
    let trimmed = line.trim_start();
    if !trimmed.to_ascii_uppercase().starts_with("SECTION") {
        return None;
    }
    Some(declared_bank(split_comment(trimmed).0))
}

fn declared_bank(code: &str) -> Option<u8> {
    if let Some(start) = code.find("BANK[") {
        let rest = &code[start + 5..];
        let inner = &rest[..rest.find(']')?];
        return parse_hex(inner).and_then(|b| u8::try_from(b).ok());
    }
    if code.contains("ROM0") {
        return Some(0);
    }
    let lower = code.to_ascii_lowercase();
    let start = lower.find("\"bank")? + 5;
    let digits: String = lower[start..]
        .chars()
        .take_while(|c| c.is_ascii_hexdigit())
        .collect();
    parse_hex(&digits).and_then(|b| u8::try_from(b).ok())
}

enum LineLabel<'a> {
    Anchored(&'a str, u32),
    Addressless(&'a str),
}

fn classify(line: &str, bank: Option<u8>) -> Option<LineLabel<'_>> {
    let name = label_from_line(line)?;
    match comment_address(line, bank) {
        Ok(Some(found)) => Some(LineLabel::Anchored(name, found.address)),
        Ok(None) => Some(LineLabel::Addressless(name)),
        Err(e) => {
            warn!("{}", e);
            Some(LineLabel::Addressless(name))
        }
    }
}

/// Anchored labels among `lines[start..end]`, addresses resolved under
/// `bank`
pub fn scan_range(lines: &[String], start: usize, end: usize, bank: Option<u8>) -> Vec<Label> {
    let end = end.min(lines.len());
    let mut found = Vec::new();
    for (line_number, line) in lines.iter().enumerate().take(end).skip(start) {
        if let Some(LineLabel::Anchored(name, address)) = classify(line, bank) {
            found.push(Label {
                name: name.to_string(),
                address,
                line_number: Some(line_number),
            });
        }
    }
    found
}

/// Label definitions whose comment does not give an address
pub fn find_labels_without_addresses(lines: &[String]) -> Vec<AddresslessLabel> {
    lines
        .iter()
        .enumerate()
        .filter_map(|(line_number, line)| match classify(line, None) {
            Some(LineLabel::Addressless(name)) => Some(AddresslessLabel {
                name: name.to_string(),
                line_number,
            }),
            _ => None,
        })
        .collect()
}

/// Result of scanning one listing
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub labels: Vec<Label>,
    pub addressless: Vec<AddresslessLabel>,
}

/// Mapping between ROM addresses and names.
///
/// When several labels share an address, the first one seen resolves.
#[derive(Debug, Default, Clone)]
pub struct LabelRegistry {
    labels: Vec<Label>,
    by_address: HashMap<u32, usize>,
    by_name: HashMap<String, usize>,
    map_constants: Option<MapConstants>,
    generated: IndexMap<(u8, u8), String>,
}

impl LabelRegistry {
    pub fn new() -> Self {
        LabelRegistry::default()
    }

    pub fn with_map_constants(map_constants: MapConstants) -> Self {
        LabelRegistry {
            map_constants: Some(map_constants),
            ..LabelRegistry::default()
        }
    }

    pub fn set_map_constants(&mut self, map_constants: MapConstants) {
        self.map_constants = Some(map_constants);
        self.generated.clear();
    }

    pub fn from_labels<I: IntoIterator<Item = Label>>(labels: I) -> Self {
        let mut registry = LabelRegistry::new();
        for label in labels {
            registry.insert(label);
        }
        registry
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// All labels in discovery order
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Add a label. Returns true when it became the resolving name for its
    /// address.
    pub fn insert(&mut self, label: Label) -> bool {
        let index = self.labels.len();
        let resolves = !self.by_address.contains_key(&label.address);
        if resolves {
            self.by_address.insert(label.address, index);
        } else {
            debug!(
                "{} shares {:#x} with an earlier label, keeping the earlier one",
                label.name, label.address
            );
        }
        self.by_name.entry(label.name.clone()).or_insert(index);
        self.labels.push(label);
        resolves
    }

    /// Walk a listing, tracking the bank from `SECTION` lines, and register
    /// every anchored label
    pub fn scan(&mut self, lines: &[String]) -> ScanReport {
        let mut report = ScanReport::default();
        let mut bank: Option<u8> = None;
        for (line_number, line) in lines.iter().enumerate() {
            if let Some(section) = section_bank(line) {
                debug!("line {}: now in bank {:02x?}", line_number, section);
                bank = section;
                continue;
            }
            match classify(line, bank) {
                Some(LineLabel::Anchored(name, address)) => {
                    let label = Label {
                        name: name.to_string(),
                        address,
                        line_number: Some(line_number),
                    };
                    self.insert(label.clone());
                    report.labels.push(label);
                }
                Some(LineLabel::Addressless(name)) => {
                    debug!("line {}: label {} has no address", line_number, name);
                    report.addressless.push(AddresslessLabel {
                        name: name.to_string(),
                        line_number,
                    });
                }
                None => {}
            }
        }
        debug!(
            "scanned {} lines: {} labels, {} without address",
            lines.len(),
            report.labels.len(),
            report.addressless.len()
        );
        report
    }

    pub fn resolve(&self, address: u32) -> Option<&str> {
        self.by_address
            .get(&address)
            .map(|&i| self.labels[i].name.as_str())
    }

    pub fn resolve_banked(&self, bank: u8, offset: u16) -> Option<&str> {
        let address = to_pointer(offset as u32, Some(bank)).ok()?;
        self.resolve(address)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Label> {
        self.by_name.get(name).map(|&i| &self.labels[i])
    }

    /// Constant naming a map, generated from the attached map names
    pub fn constants_for_map(&mut self, group: u8, id: u8) -> Result<String> {
        if let Some(name) = self.generated.get(&(group, id)) {
            return Ok(name.clone());
        }
        let constants = self
            .map_constants
            .as_ref()
            .ok_or_else(|| DisasmError::NotFound("map names were never loaded".to_string()))?;
        let name = constants
            .label_for(group, id)
            .ok_or_else(|| DisasmError::NotFound(format!("map {}.{}", group, id)))?
            .to_string();
        self.generated.insert((group, id), name.clone());
        Ok(name)
    }

    /// Map constants handed out so far, in request order
    pub fn generated_map_constants(&self) -> impl Iterator<Item = (u8, u8, &str)> + '_ {
        self.generated
            .iter()
            .map(|(&(group, id), name)| (group, id, name.as_str()))
    }
}

/// Serialize labels as TOML `[[labels]]` records, in the order given
pub fn write<W: Write>(labels: &[Label], mut destination: W) -> Result<()> {
    let file = LabelFile {
        labels: labels.iter().map(Label::to_record).collect(),
    };
    let text = toml::to_string(&file).map_err(|e| DisasmError::Config(e.to_string()))?;
    destination.write_all(text.as_bytes())?;
    Ok(())
}

pub fn read<R: Read>(mut source: R) -> Result<Vec<Label>> {
    let mut text = String::new();
    source.read_to_string(&mut text)?;
    let file: LabelFile = toml::from_str(&text).map_err(|e| DisasmError::Config(e.to_string()))?;
    file.labels.into_iter().map(LabelRecord::into_label).collect()
}

pub fn write_to_path<P: AsRef<Path>>(labels: &[Label], path: P) -> Result<()> {
    let file = fs::File::create(path)?;
    write(labels, file)
}

pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Label>> {
    let file = fs::File::open(path)?;
    read(file)
}
