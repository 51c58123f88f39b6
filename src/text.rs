use std::collections::BTreeSet;
use std::fmt::{Display, Error, Formatter};

use log::{debug, trace};

use crate::address::{is_valid_address, to_pointer, BankedPointer};
use crate::charmap::{CharacterTable, Control, Entry, LINE_BREAK_BYTES};
use crate::error::{DisasmError, Result};
use crate::opcode_tables::PointerTarget;
use crate::romstr::RomStr;
use crate::script::Command;

/// One decoded unit of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Glyph(String),
    Control(Control),
    /// Byte with no table entry
    Raw(u8),
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::result::Result<(), Error> {
        match self {
            Token::Glyph(glyph) => write!(f, "{}", glyph),
            Token::Control(control) => write!(f, "{}", control.token()),
            Token::Raw(b) => write!(f, "<${:02x}>", b),
        }
    }
}

/// Decoded text, one token list per line. A line keeps the control that
/// broke it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBlock {
    pub lines: Vec<Vec<Token>>,
    /// Bytes consumed, terminator included
    pub length: usize,
    /// The block ended on a done-class control
    pub terminated: bool,
}

impl TextBlock {
    /// Control that ended the block, if any
    pub fn ending(&self) -> Option<Control> {
        if !self.terminated {
            return None;
        }
        match self.lines.last().and_then(|line| line.last()) {
            Some(Token::Control(control)) => Some(*control),
            _ => None,
        }
    }

    pub fn line_strings(&self) -> Vec<String> {
        self.lines
            .iter()
            .map(|line| line.iter().map(|t| t.to_string()).collect())
            .collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.to_string().contains(needle)
    }
}

impl Display for TextBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::result::Result<(), Error> {
        for line in &self.lines {
            for token in line {
                write!(f, "{}", token)?;
            }
        }
        Ok(())
    }
}

/// Decoder over one character table
pub struct TextDecoder<'a> {
    table: &'a CharacterTable,
}

impl Default for TextDecoder<'static> {
    fn default() -> Self {
        TextDecoder {
            table: CharacterTable::stock(),
        }
    }
}

impl<'a> TextDecoder<'a> {
    pub fn new(table: &'a CharacterTable) -> Self {
        TextDecoder { table }
    }

    /// Decode until a done-class control or the end of `bytes`
    pub fn decode_bytes(&self, bytes: &[u8]) -> TextBlock {
        let mut block = TextBlock {
            lines: vec![Vec::new()],
            length: 0,
            terminated: false,
        };
        let mut alternate = false;
        let mut i = 0;
        while i < bytes.len() {
            let byte = bytes[i];
            if self.table.shift == Some(byte) {
                alternate = !alternate;
                trace!("{:02x}: switch glyph set", byte);
                i += 1;
                continue;
            }
            let (token, width) = match self.table.lookup(byte, alternate) {
                Some(Entry::Glyph(glyph)) => (Token::Glyph(glyph.clone()), 1),
                Some(Entry::Wide { glyph, width }) if i + width <= bytes.len() => {
                    (Token::Glyph(glyph.clone()), *width)
                }
                Some(Entry::Wide { .. }) => (Token::Raw(byte), 1),
                Some(Entry::Control(control)) => (Token::Control(*control), 1),
                None => (Token::Raw(byte), 1),
            };
            i += width;

            let control = match &token {
                Token::Control(control) => Some(*control),
                _ => None,
            };
            if let Some(line) = block.lines.last_mut() {
                line.push(token);
            }
            match control {
                Some(control) if control.is_done() => {
                    block.terminated = true;
                    break;
                }
                Some(control) if control.is_line_break() => block.lines.push(Vec::new()),
                _ => {}
            }
        }
        if block.lines.len() > 1 && block.lines.last().map(Vec::is_empty).unwrap_or(false) {
            block.lines.pop();
        }
        block.length = i;
        block
    }

    /// Decode text at a ROM address. Reading stops at a done-class control
    /// or after `known_length` bytes; with no known length only the end of
    /// the ROM bounds the read.
    pub fn decode_at(
        &self,
        rom: &RomStr,
        address: u32,
        known_length: Option<usize>,
    ) -> Result<TextBlock> {
        if !is_valid_address(address) {
            return Err(DisasmError::InvalidAddress(address));
        }
        let bytes = match known_length {
            Some(length) => rom.interval(address, length)?,
            None => {
                let start = address as usize;
                if start >= rom.len() {
                    return Err(DisasmError::RomOverrun { address, length: 1 });
                }
                &rom.as_bytes()[start..]
            }
        };
        let block = self.decode_bytes(bytes);
        debug!(
            "text at {}: {} bytes, {} lines",
            BankedPointer::from_address(address)?,
            block.length,
            block.lines.len()
        );
        Ok(block)
    }
}

/// Decode with the stock table
pub fn decode_bytes(bytes: &[u8]) -> TextBlock {
    TextDecoder::default().decode_bytes(bytes)
}

pub fn decode_at(rom: &RomStr, address: u32, known_length: Option<usize>) -> Result<TextBlock> {
    TextDecoder::default().decode_at(rom, address, known_length)
}

/// Split raw text into lines, each ending with its line-break byte
pub fn split_lines(bytes: &[u8]) -> Vec<Vec<u8>> {
    let mut lines = Vec::new();
    let mut current = Vec::new();
    for &b in bytes {
        current.push(b);
        if LINE_BREAK_BYTES.contains(&b) {
            lines.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Addresses of text referenced by script commands, ascending
pub fn find_text_pointers_in(commands: &[Command]) -> BTreeSet<u32> {
    commands
        .iter()
        .flat_map(|c| c.params.iter())
        .filter(|p| p.pointer_target() == Some(PointerTarget::Text))
        .filter_map(|p| p.target())
        .collect()
}

/// Body of one text engine command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextCommandBody {
    None,
    Text(TextBlock),
    Ram(u16),
    Bcd { address: u16, flags: u8 },
    Move(u16),
    Box { address: u16, height: u8, width: u8 },
    Decimal { address: u16, format: u8 },
    Dots(u8),
    Buffer(u8),
    Far { bank: u8, pointer: u16, target: Option<u32> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextCommand {
    pub address: u32,
    pub opcode: u8,
    pub name: &'static str,
    pub body: TextCommandBody,
    pub size: usize,
}

fn text_command_name(opcode: u8) -> Option<&'static str> {
    let name = match opcode {
        0x00 => "text_start",
        0x01 => "text_ram",
        0x02 => "text_bcd",
        0x03 => "text_move",
        0x04 => "text_box",
        0x05 => "text_low",
        0x06 => "text_promptbutton",
        0x07 => "text_scroll",
        0x08 => "text_asm",
        0x09 => "text_decimal",
        0x0A => "text_pause",
        0x0B => "sound_dex_fanfare_50_79",
        0x0C => "text_dots",
        0x0D => "text_waitbutton",
        0x0E => "sound_dex_fanfare_20_49",
        0x0F => "sound_item",
        0x10 => "sound_caught_mon",
        0x11 => "sound_dex_fanfare_80_109",
        0x12 => "sound_fanfare",
        0x13 => "sound_slot_machine_start",
        0x14 => "text_buffer",
        0x15 => "text_today",
        0x16 => "text_far",
        0x50 => "text_end",
        _ => return None,
    };
    Some(name)
}

/// Text engine command stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextScript {
    pub address: u32,
    pub commands: Vec<TextCommand>,
}

impl TextScript {
    /// Decode commands until `text_end`, `text_asm`, or a text run that
    /// ends with `<DONE>` or `<PROMPT>`
    pub fn parse_at(rom: &RomStr, address: u32) -> Result<Self> {
        TextScript::parse_with(&TextDecoder::default(), rom, address)
    }

    pub fn parse_with(decoder: &TextDecoder<'_>, rom: &RomStr, address: u32) -> Result<Self> {
        if !is_valid_address(address) {
            return Err(DisasmError::InvalidAddress(address));
        }
        let mut commands = Vec::new();
        let mut cursor = address;
        loop {
            let opcode = rom.read_u8(cursor)?;
            let name = text_command_name(opcode).ok_or(DisasmError::UnknownOpcode {
                opcode,
                address: cursor,
            })?;
            let word = |offset: u32| -> Result<u16> {
                let raw = rom.interval(cursor + offset, 2)?;
                Ok(u16::from_le_bytes([raw[0], raw[1]]))
            };
            let (body, size) = match opcode {
                0x00 => {
                    let block = decoder.decode_at(rom, cursor + 1, None)?;
                    let size = 1 + block.length;
                    (TextCommandBody::Text(block), size)
                }
                0x01 => (TextCommandBody::Ram(word(1)?), 3),
                0x02 => (
                    TextCommandBody::Bcd {
                        address: word(1)?,
                        flags: rom.read_u8(cursor + 3)?,
                    },
                    4,
                ),
                0x03 => (TextCommandBody::Move(word(1)?), 3),
                0x04 => (
                    TextCommandBody::Box {
                        address: word(1)?,
                        height: rom.read_u8(cursor + 3)?,
                        width: rom.read_u8(cursor + 4)?,
                    },
                    5,
                ),
                0x09 => (
                    TextCommandBody::Decimal {
                        address: word(1)?,
                        format: rom.read_u8(cursor + 3)?,
                    },
                    4,
                ),
                0x0C => (TextCommandBody::Dots(rom.read_u8(cursor + 1)?), 2),
                0x14 => (TextCommandBody::Buffer(rom.read_u8(cursor + 1)?), 2),
                0x16 => {
                    let pointer = word(1)?;
                    let bank = rom.read_u8(cursor + 3)?;
                    let target = to_pointer(pointer as u32, Some(bank))
                        .ok()
                        .filter(|&a| is_valid_address(a));
                    (TextCommandBody::Far { bank, pointer, target }, 4)
                }
                _ => (TextCommandBody::None, 1),
            };
            trace!("{:06x}: {}", cursor, name);

            let stop = match (&body, opcode) {
                (_, 0x08) | (_, 0x50) => true,
                (TextCommandBody::Text(block), _) => {
                    matches!(block.ending(), Some(Control::Done) | Some(Control::Prompt))
                }
                _ => false,
            };
            commands.push(TextCommand {
                address: cursor,
                opcode,
                name,
                body,
                size,
            });
            cursor += size as u32;
            if stop {
                break;
            }
        }
        debug!(
            "text script at {:06x}: {} commands",
            address,
            commands.len()
        );
        Ok(TextScript { address, commands })
    }

    pub fn end_address(&self) -> u32 {
        self.commands
            .last()
            .map(|c| c.address + c.size as u32)
            .unwrap_or(self.address)
    }

    /// Targets of `text_far` commands
    pub fn far_targets(&self) -> Vec<u32> {
        self.commands
            .iter()
            .filter_map(|c| match c.body {
                TextCommandBody::Far { target, .. } => target,
                _ => None,
            })
            .collect()
    }

    /// All decoded text runs joined together
    pub fn text(&self) -> String {
        self.commands
            .iter()
            .filter_map(|c| match &c.body {
                TextCommandBody::Text(block) => Some(block.to_string()),
                _ => None,
            })
            .collect()
    }
}
