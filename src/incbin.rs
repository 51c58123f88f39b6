//! Raw `INCBIN` regions of an assembly listing.
//!
//! Each undecoded region appears in the listing as
//!
//! ```text
//! INCBIN "baserom.gbc",$90,$200 - $90
//! ```
//!
//! that is, a start offset and an end written relative to the start.
//! Carving a decoded structure out of a region replaces that one line with
//! up to three lines and produces a unified diff of the edit.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::ops::Range;

use log::{debug, warn};

use crate::address::parse_hex;
use crate::error::{DisasmError, Result};
use crate::interval_map::IntervalMap;
use crate::romstr::AsmList;

const INCBIN: &str = "INCBIN";

/// One undecoded region, `[start, end)` in ROM offsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncbinSpan {
    pub start: u32,
    pub end: u32,
    pub line_number: usize,
    pub rom_file: String,
}

impl IncbinSpan {
    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, address: u32) -> bool {
        (self.start..self.end).contains(&address)
    }

    pub fn range(&self) -> Range<u32> {
        self.start..self.end
    }

    /// Source line for this span
    pub fn to_line(&self) -> String {
        format!(
            "INCBIN \"{}\",${:x},${:x} - ${:x}",
            self.rom_file, self.start, self.end, self.start
        )
    }
}

fn strict_hex(text: &str, line: &str) -> Result<u32> {
    let text = text.trim();
    if !text.starts_with('$') {
        return Err(DisasmError::malformed(line, "offsets must be written as $hex"));
    }
    parse_hex(text).ok_or_else(|| DisasmError::malformed(line, "bad hex offset"))
}

/// Parse one `INCBIN "<file>",$start,$end - $start` line
pub fn parse_incbin(line: &str, line_number: usize) -> Result<IncbinSpan> {
    let rest = line
        .trim()
        .strip_prefix(INCBIN)
        .ok_or_else(|| DisasmError::malformed(line, "not an INCBIN line"))?
        .trim_start();
    let rest = rest
        .strip_prefix('"')
        .ok_or_else(|| DisasmError::malformed(line, "missing file name"))?;
    let close = rest
        .find('"')
        .ok_or_else(|| DisasmError::malformed(line, "unterminated file name"))?;
    let rom_file = &rest[..close];
    let rest = rest[close + 1..].split(';').next().unwrap_or("").trim();
    let rest = rest
        .strip_prefix(',')
        .ok_or_else(|| DisasmError::malformed(line, "missing start offset"))?;

    let (start_text, end_expr) = rest
        .split_once(',')
        .ok_or_else(|| DisasmError::malformed(line, "missing length expression"))?;
    let start = strict_hex(start_text, line)?;
    let (end_text, base_text) = end_expr
        .split_once('-')
        .ok_or_else(|| DisasmError::malformed(line, "length must be written as $end - $start"))?;
    let end = strict_hex(end_text, line)?;
    let base = strict_hex(base_text, line)?;
    if base != start {
        return Err(DisasmError::malformed(
            line,
            &format!("length is relative to ${:x}, not the start ${:x}", base, start),
        ));
    }
    if end < start {
        return Err(DisasmError::malformed(line, "end comes before start"));
    }
    Ok(IncbinSpan {
        start,
        end,
        line_number,
        rom_file: rom_file.to_string(),
    })
}

/// Indices of lines that look like INCBIN directives
pub fn isolate_incbins(lines: &AsmList) -> Vec<usize> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.trim_start().starts_with(INCBIN))
        .map(|(i, _)| i)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitRole {
    Prefix,
    Carved,
    Suffix,
}

/// One line produced by splitting a span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitLine {
    pub role: SplitRole,
    pub span: IncbinSpan,
}

impl SplitLine {
    pub fn text(&self) -> String {
        self.span.to_line()
    }
}

/// Outcome of carving one region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Carve {
    pub line_number: usize,
    pub lines: Vec<String>,
    pub diff: String,
}

/// INCBIN regions of one in-memory listing
#[derive(Debug, Clone)]
pub struct IncbinAnalyzer {
    asm: AsmList,
    trailing_newline: bool,
    name: String,
    spans: BTreeMap<usize, IncbinSpan>,
    index: IntervalMap<u32, usize>,
    overlapping: bool,
    malformed: Vec<(usize, DisasmError)>,
    classified: IntervalMap<u32, String>,
}

impl IncbinAnalyzer {
    pub fn from_source(text: &str) -> Self {
        let mut analyzer = IncbinAnalyzer::from_lines(AsmList::from_source(text));
        analyzer.trailing_newline = text.ends_with('\n');
        analyzer
    }

    pub fn from_lines(asm: AsmList) -> Self {
        let mut analyzer = IncbinAnalyzer {
            asm,
            trailing_newline: true,
            name: "main.asm".to_string(),
            spans: BTreeMap::new(),
            index: IntervalMap::new(),
            overlapping: false,
            malformed: Vec::new(),
            classified: IntervalMap::new(),
        };
        analyzer.reset();
        analyzer
    }

    /// File name used in diff headers
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Rebuild the span index from the current listing
    pub fn reset(&mut self) {
        self.spans.clear();
        self.index = IntervalMap::new();
        self.overlapping = false;
        self.malformed.clear();

        for line_number in isolate_incbins(&self.asm) {
            let line = self.asm.get(line_number).unwrap_or("");
            match parse_incbin(line, line_number) {
                Ok(span) => {
                    if span.is_empty() {
                        continue;
                    }
                    if self.index.overlapping(span.range()).next().is_some() {
                        warn!("INCBIN on line {} overlaps another one", line_number);
                        self.overlapping = true;
                    }
                    self.index.set(span.range(), line_number);
                    self.spans.insert(line_number, span);
                }
                Err(e) => {
                    warn!("skipping line {}: {}", line_number, e);
                    self.malformed.push((line_number, e));
                }
            }
        }
        debug!(
            "{} INCBIN spans, {} malformed",
            self.spans.len(),
            self.malformed.len()
        );
    }

    pub fn asm(&self) -> &AsmList {
        &self.asm
    }

    pub fn spans(&self) -> impl Iterator<Item = &IncbinSpan> + '_ {
        self.spans.values()
    }

    pub fn span_at(&self, line_number: usize) -> Option<&IncbinSpan> {
        self.spans.get(&line_number)
    }

    /// INCBIN lines that could not be parsed
    pub fn malformed(&self) -> &[(usize, DisasmError)] {
        &self.malformed
    }

    /// Spans ordered by length, largest first
    pub fn largest(&self) -> Vec<&IncbinSpan> {
        let mut spans: Vec<&IncbinSpan> = self.spans.values().collect();
        spans.sort_by(|a, b| b.len().cmp(&a.len()).then(a.start.cmp(&b.start)));
        spans
    }

    /// Ranges carved so far, tagged with what they were decoded as
    pub fn classified(&self) -> &IntervalMap<u32, String> {
        &self.classified
    }

    /// Line of the span containing `address`
    pub fn locate(&self, address: u32) -> Result<usize> {
        if self.overlapping {
            let lines: Vec<usize> = self
                .spans
                .values()
                .filter(|span| span.contains(address))
                .map(|span| span.line_number)
                .collect();
            if lines.len() > 1 {
                return Err(DisasmError::AmbiguousSpan { address, lines });
            }
        }
        self.index
            .lookup(address)
            .copied()
            .ok_or_else(|| DisasmError::NotFound(format!("no INCBIN contains {:#x}", address)))
    }

    /// Replacement lines carving `[address, address + length)` out of the
    /// span on `line_number`. Empty prefix or suffix pieces are left out.
    pub fn split(&self, line_number: usize, address: u32, length: u32) -> Result<Vec<SplitLine>> {
        let span = self
            .spans
            .get(&line_number)
            .ok_or_else(|| DisasmError::NotFound(format!("no INCBIN on line {}", line_number)))?;
        let out_of_bounds = DisasmError::OutOfBounds {
            address,
            length,
            span_start: span.start,
            span_end: span.end,
        };
        let end = address.checked_add(length).ok_or(out_of_bounds.clone())?;
        if length == 0 || address < span.start || end > span.end {
            return Err(out_of_bounds);
        }

        let piece = |role, start, end| SplitLine {
            role,
            span: IncbinSpan {
                start,
                end,
                line_number,
                rom_file: span.rom_file.clone(),
            },
        };
        let mut lines = Vec::with_capacity(3);
        if address > span.start {
            lines.push(piece(SplitRole::Prefix, span.start, address));
        }
        lines.push(piece(SplitRole::Carved, address, end));
        if end < span.end {
            lines.push(piece(SplitRole::Suffix, end, span.end));
        }
        Ok(lines)
    }

    /// Unified diff replacing `line_number` with `replacement`, with
    /// `context` unchanged lines on either side
    pub fn diff(&self, line_number: usize, replacement: &[String], context: usize) -> Result<String> {
        let original = self
            .asm
            .get(line_number)
            .ok_or_else(|| DisasmError::NotFound(format!("line {}", line_number)))?;
        let before = line_number.saturating_sub(context);
        let after = (line_number + 1 + context).min(self.asm.len());
        let lead = line_number - before;
        let trail = after - (line_number + 1);

        let old_count = lead + 1 + trail;
        let new_count = lead + replacement.len() + trail;
        let new_start = if new_count == 0 { before } else { before + 1 };

        let mut out = String::new();
        let _ = writeln!(out, "--- a/{}", self.name);
        let _ = writeln!(out, "+++ b/{}", self.name);
        let _ = writeln!(
            out,
            "@@ -{},{} +{},{} @@",
            before + 1,
            old_count,
            new_start,
            new_count
        );
        for line in self.asm.as_slice()[before..line_number].iter() {
            let _ = writeln!(out, " {}", line);
        }
        let _ = writeln!(out, "-{}", original);
        for line in replacement {
            let _ = writeln!(out, "+{}", line);
        }
        for line in self.asm.as_slice()[line_number + 1..after].iter() {
            let _ = writeln!(out, " {}", line);
        }
        Ok(out)
    }

    /// Replace one line and rebuild the span index
    pub fn apply(&mut self, line_number: usize, replacement: Vec<String>) -> Result<()> {
        self.asm.splice_line(line_number, replacement)?;
        self.reset();
        Ok(())
    }

    /// Locate, split, diff and apply in one step, recording the carved
    /// range under `tag`
    pub fn carve(&mut self, address: u32, length: u32, tag: &str, context: usize) -> Result<Carve> {
        let line_number = self.locate(address)?;
        let lines: Vec<String> = self
            .split(line_number, address, length)?
            .iter()
            .map(SplitLine::text)
            .collect();
        let diff = self.diff(line_number, &lines, context)?;
        self.apply(line_number, lines.clone())?;
        self.classified.set(address..address + length, tag.to_string());
        debug!(
            "carved {:#x}..{:#x} as {} from line {}",
            address,
            address + length,
            tag,
            line_number
        );
        Ok(Carve {
            line_number,
            lines,
            diff,
        })
    }

    /// Listing text, with the trailing newline it was loaded with
    pub fn to_source(&self) -> String {
        let mut text = self.asm.to_printable();
        if self.trailing_newline && !self.asm.is_empty() {
            text.push('\n');
        }
        text
    }
}
