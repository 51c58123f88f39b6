//! Script engine decoder.
//!
//! A script is a stream of variable-length commands. Decoding walks
//! strictly forward from the start address and stops right after the first
//! command whose table entry is a terminator.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Error, Formatter};

use log::{debug, trace};

use crate::address::{is_valid_address, to_pointer, BankedPointer};
use crate::error::{DisasmError, Result};
use crate::items::ItemTable;
use crate::labels::{Label, LabelRegistry};
use crate::opcode_tables::{
    lookup_command, BankSource, CommandSpec, ParamKind, ParamSpec, PointerTarget,
};
use crate::revision::Revision;
use crate::romstr::RomStr;

/// Decoded value of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamValue {
    Byte(u8),
    Multi(u32),
    Pointer {
        bank: Option<u8>,
        pointer: u16,
        /// ROM address, when the pointer lands in the cartridge
        target: Option<u32>,
    },
}

/// One decoded command parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub kind: ParamKind,
    /// ROM address of the first byte
    pub address: u32,
    pub value: ParamValue,
    /// Bytes consumed
    pub size: usize,
}

/// ROM address a CPU pointer refers to, if it refers to ROM at all
fn resolve_pointer(pointer: u16, bank: Option<u8>) -> Option<u32> {
    let pointer = pointer as u32;
    if pointer < 0x4000 {
        return Some(pointer);
    }
    if pointer >= 0x8000 {
        // RAM or VRAM
        return None;
    }
    match bank {
        Some(bank) if bank != 0 => to_pointer(pointer, Some(bank))
            .ok()
            .filter(|&address| is_valid_address(address)),
        _ => None,
    }
}

impl Param {
    pub fn decode(
        rom: &RomStr,
        address: u32,
        spec: &ParamSpec,
        script_bank: Option<u8>,
    ) -> Result<Self> {
        let size = spec.kind.width();
        let raw = rom.interval(address, size)?;
        let value = match spec.kind {
            ParamKind::Byte | ParamKind::HexByte | ParamKind::Decimal | ParamKind::ItemLabel => {
                ParamValue::Byte(raw[0])
            }
            ParamKind::MultiByte(_) => {
                ParamValue::Multi(raw.iter().rev().fold(0u32, |acc, &b| (acc << 8) | b as u32))
            }
            ParamKind::PointerLabel(pointer_spec) => {
                let (bank, lo, hi) = match pointer_spec.bank {
                    BankSource::None => (None, raw[0], raw[1]),
                    BankSource::Current => (script_bank, raw[0], raw[1]),
                    BankSource::Before => (Some(raw[0]), raw[1], raw[2]),
                    BankSource::After => (Some(raw[2]), raw[0], raw[1]),
                };
                let pointer = u16::from_le_bytes([lo, hi]);
                ParamValue::Pointer {
                    bank,
                    pointer,
                    target: resolve_pointer(pointer, bank),
                }
            }
        };
        Ok(Param {
            name: spec.name,
            kind: spec.kind,
            address,
            value,
            size,
        })
    }

    /// Numeric value regardless of kind
    pub fn raw_value(&self) -> u32 {
        match self.value {
            ParamValue::Byte(b) => b as u32,
            ParamValue::Multi(v) => v,
            ParamValue::Pointer { pointer, .. } => pointer as u32,
        }
    }

    pub fn target(&self) -> Option<u32> {
        match self.value {
            ParamValue::Pointer { target, .. } => target,
            _ => None,
        }
    }

    pub fn pointer_target(&self) -> Option<PointerTarget> {
        match self.kind {
            ParamKind::PointerLabel(spec) => Some(spec.target),
            _ => None,
        }
    }

    pub fn to_asm(&self, labels: &LabelRegistry, items: Option<&ItemTable>) -> String {
        match (self.kind, self.value) {
            (ParamKind::HexByte, ParamValue::Byte(b)) => format!("${:02x}", b),
            (ParamKind::Decimal, ParamValue::Byte(b)) => format!("{}", b),
            (ParamKind::ItemLabel, ParamValue::Byte(b)) => {
                match items.and_then(|items| items.find_label_by_id(b)) {
                    Some(name) => name.to_string(),
                    None => format!("${:02x}", b),
                }
            }
            (ParamKind::PointerLabel(spec), ParamValue::Pointer { bank, pointer, target }) => {
                if let Some(name) = target.and_then(|address| labels.resolve(address)) {
                    return name.to_string();
                }
                match (spec.bank, bank) {
                    (BankSource::Before, Some(bank)) => format!("${:x}, ${:x}", bank, pointer),
                    (BankSource::After, Some(bank)) => format!("${:x}, ${:x}", pointer, bank),
                    _ => format!("${:x}", pointer),
                }
            }
            _ => format!("${:x}", self.raw_value()),
        }
    }
}

/// One decoded script command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub address: u32,
    pub opcode: u8,
    pub mnemonic: &'static str,
    pub params: Vec<Param>,
    /// Bytes consumed, opcode included
    pub size: usize,
    pub terminator: bool,
}

impl Command {
    fn decode(
        rom: &RomStr,
        address: u32,
        spec: &CommandSpec,
        script_bank: Option<u8>,
    ) -> Result<Self> {
        let mut cursor = address + 1;
        let mut params = Vec::with_capacity(spec.params.len());
        for param_spec in spec.params {
            let param = Param::decode(rom, cursor, param_spec, script_bank)?;
            cursor += param.size as u32;
            params.push(param);
        }
        if let Some(trailing) = spec.trailing {
            let present = params
                .get(trailing.flag)
                .map(|flag| flag.raw_value() != 0)
                .unwrap_or(false);
            if present {
                for param_spec in trailing.params {
                    let param = Param::decode(rom, cursor, param_spec, script_bank)?;
                    cursor += param.size as u32;
                    params.push(param);
                }
            }
        }
        Ok(Command {
            address,
            opcode: spec.opcode,
            mnemonic: spec.mnemonic,
            params,
            size: (cursor - address) as usize,
            terminator: spec.terminator,
        })
    }

    /// Address just past this command
    pub fn next_address(&self) -> u32 {
        self.address + self.size as u32
    }

    pub fn to_asm(&self, labels: &LabelRegistry, items: Option<&ItemTable>) -> String {
        if self.params.is_empty() {
            return format!("\t{}", self.mnemonic);
        }
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| p.to_asm(labels, items))
            .collect();
        format!("\t{} {}", self.mnemonic, params.join(", "))
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::result::Result<(), Error> {
        write!(f, "{:06x}: {}", self.address, self.mnemonic)?;
        for (i, param) in self.params.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{}{}=${:x}", sep, param.name, param.raw_value())?;
        }
        Ok(())
    }
}

/// Commands decoded from one start address up to a terminator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub address: u32,
    pub revision: Revision,
    pub commands: Vec<Command>,
}

impl Script {
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Address just past the terminator
    pub fn end_address(&self) -> u32 {
        self.commands
            .last()
            .map(Command::next_address)
            .unwrap_or(self.address)
    }

    /// Targets of pointer parameters of one kind, in command order
    pub fn pointers_to(&self, kind: PointerTarget) -> Vec<u32> {
        self.commands
            .iter()
            .flat_map(|c| c.params.iter())
            .filter(|p| p.pointer_target() == Some(kind))
            .filter_map(Param::target)
            .collect()
    }

    pub fn to_asm(&self, labels: &LabelRegistry, items: Option<&ItemTable>) -> String {
        let name = match labels.resolve(self.address) {
            Some(name) => name.to_string(),
            None => format!("UnknownScript_0x{:x}", self.address),
        };
        let mut out = format!("{}: ; 0x{:x}\n", name, self.address);
        for command in &self.commands {
            out.push_str(&command.to_asm(labels, items));
            out.push('\n');
        }
        out
    }
}

/// Decodes scripts out of one ROM image under one revision's command table
pub struct ScriptParser<'a> {
    rom: &'a RomStr,
    revision: Revision,
}

impl<'a> ScriptParser<'a> {
    pub fn new(rom: &'a RomStr, revision: Revision) -> Self {
        ScriptParser { rom, revision }
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    pub fn parse_at(&self, address: u32) -> Result<Script> {
        let bank = match BankedPointer::from_address(address)?.bank() {
            0 => None,
            bank => Some(bank),
        };
        debug!(
            "parsing {} script at {:06x} (bank {:?})",
            self.revision, address, bank
        );

        let mut commands = Vec::new();
        let mut cursor = address;
        loop {
            let opcode = self.rom.read_u8(cursor)?;
            let spec = lookup_command(opcode, self.revision).ok_or(DisasmError::UnknownOpcode {
                opcode,
                address: cursor,
            })?;
            let command = Command::decode(self.rom, cursor, spec, bank)?;
            trace!("{}", command);
            cursor = command.next_address();
            let done = command.terminator;
            commands.push(command);
            if done {
                break;
            }
        }

        debug!(
            "script at {:06x}: {} commands, ends at {:06x}",
            address,
            commands.len(),
            cursor
        );
        Ok(Script {
            address,
            revision: self.revision,
            commands,
        })
    }

    /// Decode `address` and every script reachable from it through script
    /// pointer parameters
    pub fn parse_reachable(&self, address: u32) -> Result<BTreeMap<u32, Script>> {
        let mut scripts = BTreeMap::new();
        let mut pending = vec![address];
        let mut seen = BTreeSet::new();
        while let Some(next) = pending.pop() {
            if !seen.insert(next) {
                continue;
            }
            let script = self.parse_at(next)?;
            for target in script.pointers_to(PointerTarget::Script) {
                if !seen.contains(&target) {
                    pending.push(target);
                }
            }
            scripts.insert(next, script);
        }
        debug!("{} scripts reachable from {:06x}", scripts.len(), address);
        Ok(scripts)
    }
}

fn synthesized_name(kind: PointerTarget, address: u32) -> String {
    let prefix = match kind {
        PointerTarget::Script => "UnknownScript",
        PointerTarget::Text => "UnknownText",
        PointerTarget::Movement => "MovementData",
        PointerTarget::Asm => "UnknownAsm",
        PointerTarget::Data => "UnknownData",
    };
    format!("{}_0x{:x}", prefix, address)
}

/// Register a generated label for the script itself and every pointer
/// target that has none yet. Returns how many labels were added.
pub fn synthesize_labels(script: &Script, registry: &mut LabelRegistry) -> usize {
    let mut wanted = vec![(PointerTarget::Script, script.address)];
    for param in script.commands.iter().flat_map(|c| c.params.iter()) {
        if let (Some(kind), Some(target)) = (param.pointer_target(), param.target()) {
            wanted.push((kind, target));
        }
    }
    let mut added = 0;
    for (kind, address) in wanted {
        if registry.resolve(address).is_some() {
            continue;
        }
        let name = synthesized_name(kind, address);
        if let Ok(label) = Label::new(&name, address, None) {
            registry.insert(label);
            added += 1;
        }
    }
    added
}
