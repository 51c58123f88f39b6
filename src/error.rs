// Disassembler Error Handling

use std::fmt;

use crate::revision::Revision;

#[derive(Debug, Clone, PartialEq)]
pub enum DisasmError {
    // Address space errors
    InvalidAddress(u32),
    RomOverrun { address: u32, length: usize },

    // Decode errors
    UnknownOpcode { opcode: u8, address: u32 },
    InvalidRevision(String),
    UntranslatableOpcode { opcode: u8, revision: Revision },

    // Lookup errors
    NotFound(String),
    AmbiguousSpan { address: u32, lines: Vec<usize> },

    // Source listing errors
    OutOfBounds { address: u32, length: u32, span_start: u32, span_end: u32 },
    MalformedSyntax { line: String, reason: String },

    // IO and configuration errors
    Io(String),
    Config(String),
}

pub type Result<T> = std::result::Result<T, DisasmError>;

impl DisasmError {
    pub fn malformed(line: &str, reason: &str) -> Self {
        DisasmError::MalformedSyntax {
            line: line.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for DisasmError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DisasmError::InvalidAddress(address) => {
                write!(f, "Invalid address {:#x}", address)
            }
            DisasmError::RomOverrun { address, length } => {
                write!(
                    f,
                    "Read of {} byte(s) at {:#x} runs past the end of the ROM",
                    length, address
                )
            }
            DisasmError::UnknownOpcode { opcode, address } => {
                write!(f, "Unknown script command {:#04x} at {:#x}", opcode, address)
            }
            DisasmError::InvalidRevision(msg) => {
                write!(f, "Invalid revision: {}", msg)
            }
            DisasmError::UntranslatableOpcode { opcode, revision } => {
                write!(
                    f,
                    "Command byte {:#04x} is past the last known {} command",
                    opcode, revision
                )
            }
            DisasmError::NotFound(what) => write!(f, "Not found: {}", what),
            DisasmError::AmbiguousSpan { address, lines } => {
                write!(
                    f,
                    "Address {:#x} is covered by more than one INCBIN (lines {:?})",
                    address, lines
                )
            }
            DisasmError::OutOfBounds {
                address,
                length,
                span_start,
                span_end,
            } => {
                write!(
                    f,
                    "Range {:#x}+{:#x} is not inside INCBIN {:#x}..{:#x}",
                    address, length, span_start, span_end
                )
            }
            DisasmError::MalformedSyntax { line, reason } => {
                write!(f, "Malformed line '{}': {}", line, reason)
            }
            DisasmError::Io(msg) => write!(f, "IO error: {}", msg),
            DisasmError::Config(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl std::error::Error for DisasmError {}

impl From<std::io::Error> for DisasmError {
    fn from(e: std::io::Error) -> Self {
        DisasmError::Io(e.to_string())
    }
}
