//! Banked address model.
//!
//! The cartridge is mapped in 16 KiB banks. Bank 0 is always visible at
//! `0x0000..0x4000`; every other bank is switched into `0x4000..0x8000`.
//! A flat ROM file offset therefore corresponds to a `(bank, offset)` pair
//! as the CPU sees it.

use std::fmt::{Display, Error, Formatter};

use crate::error::{DisasmError, Result};

/// Size of one switchable bank
pub const BANK_SIZE: u32 = 0x4000;
/// Size of the full cartridge space (2 MiB)
pub const ROM_SIZE: u32 = 0x200000;

/// Start and end of the switchable window in CPU address space
const SWITCHABLE_START: u32 = 0x4000;
const SWITCHABLE_END: u32 = 0x7FFF;

/// True when the address is a ROM file offset inside the cartridge space
pub fn is_valid_address(address: u32) -> bool {
    address < ROM_SIZE
}

/// Bank that owns a flat ROM address.
///
/// Addresses in `0x4000..=0x7FFF` are refused: by convention they are never
/// used as input here, since they look like CPU pointers rather than file
/// offsets.
pub fn bank_of(address: u32) -> Result<u8> {
    if !is_valid_address(address) {
        return Err(DisasmError::InvalidAddress(address));
    }
    if (SWITCHABLE_START..=SWITCHABLE_END).contains(&address) {
        return Err(DisasmError::InvalidAddress(address));
    }
    Ok((address / BANK_SIZE) as u8)
}

/// `bank_of` for textual addresses: `0x9000`, `$9000` or bare hex `9000`
pub fn bank_of_str(address: &str) -> Result<u8> {
    let address = parse_hex(address)
        .ok_or_else(|| DisasmError::malformed(address, "not a hexadecimal address"))?;
    bank_of(address)
}

/// Resolve a CPU-visible pointer to a ROM file offset.
///
/// Pointers outside the switchable window are returned unchanged; the bank
/// is irrelevant for them. Pointers inside it need the nonzero bank they
/// were read under, and must land inside the cartridge.
pub fn to_pointer(pointer: u32, bank: Option<u8>) -> Result<u32> {
    if !(SWITCHABLE_START..=SWITCHABLE_END).contains(&pointer) {
        return Ok(pointer);
    }
    let bank = match bank {
        Some(bank) if bank != 0 => bank,
        _ => return Err(DisasmError::InvalidAddress(pointer)),
    };
    let address = (pointer - SWITCHABLE_START) + bank as u32 * BANK_SIZE;
    if !is_valid_address(address) {
        return Err(DisasmError::InvalidAddress(address));
    }
    Ok(address)
}

/// Build a ROM address from a little-endian pointer read under `bank`
pub fn pointer_from_bytes(lo: u8, hi: u8, bank: Option<u8>) -> Result<u32> {
    to_pointer(u16::from_le_bytes([lo, hi]) as u32, bank)
}

/// Parse `$ff`, `0xff` or bare `ff`
pub fn parse_hex(text: &str) -> Option<u32> {
    let text = text.trim();
    let digits = text
        .strip_prefix('$')
        .or_else(|| text.strip_prefix("0x"))
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.is_empty() {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

/// An address as the CPU sees it: a bank number and an offset into the
/// visible window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BankedPointer {
    bank: u8,
    offset: u16,
}

impl BankedPointer {
    pub fn new(bank: u8, offset: u16) -> Result<Self> {
        let offset32 = offset as u32;
        if offset32 > SWITCHABLE_END {
            return Err(DisasmError::InvalidAddress(offset32));
        }
        if offset32 >= SWITCHABLE_START {
            // switchable window needs a real bank tag
            if bank == 0 {
                return Err(DisasmError::InvalidAddress(offset32));
            }
            let pointer = BankedPointer { bank, offset };
            if !is_valid_address(pointer.to_address()) {
                return Err(DisasmError::InvalidAddress(pointer.to_address()));
            }
            return Ok(pointer);
        }
        // fixed space carries no bank
        Ok(BankedPointer { bank: 0, offset })
    }

    /// Split a flat ROM offset into its bank and CPU-visible offset
    pub fn from_address(address: u32) -> Result<Self> {
        if !is_valid_address(address) {
            return Err(DisasmError::InvalidAddress(address));
        }
        let bank = address / BANK_SIZE;
        if bank == 0 {
            return Ok(BankedPointer {
                bank: 0,
                offset: address as u16,
            });
        }
        Ok(BankedPointer {
            bank: bank as u8,
            offset: (address % BANK_SIZE + SWITCHABLE_START) as u16,
        })
    }

    pub fn bank(&self) -> u8 {
        self.bank
    }

    pub fn offset(&self) -> u16 {
        self.offset
    }

    pub fn is_fixed(&self) -> bool {
        (self.offset as u32) < SWITCHABLE_START
    }

    /// Flat ROM offset for this pointer
    pub fn to_address(&self) -> u32 {
        if self.is_fixed() {
            self.offset as u32
        } else {
            (self.offset as u32 - SWITCHABLE_START) + self.bank as u32 * BANK_SIZE
        }
    }
}

impl Display for BankedPointer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::result::Result<(), Error> {
        write!(f, "{:02x}:{:04x}", self.bank, self.offset)
    }
}
