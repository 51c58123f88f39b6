//! Value wrappers for the ROM image and the assembly listing.
//!
//! Both wrap large sequences that should never be dumped by accident, so
//! `Debug` prints a summary. The contents are available only through an
//! explicit `to_printable()`.

use std::fmt::{Debug, Error, Formatter, Write};
use std::ops::Index;
use std::slice::SliceIndex;

use log::trace;

use crate::address::{pointer_from_bytes, to_pointer};
use crate::error::{DisasmError, Result};

/// Raw ROM bytes
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RomStr {
    bytes: Vec<u8>,
}

impl RomStr {
    pub fn new(bytes: Vec<u8>) -> Self {
        RomStr { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Same as `len`, kept for callers that think of the image as a string
    pub fn length(&self) -> usize {
        self.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Hex dump, 16 bytes per row
    pub fn to_printable(&self) -> String {
        let mut out = String::new();
        for (row, chunk) in self.bytes.chunks(16).enumerate() {
            let _ = write!(out, "{:06x}:", row * 16);
            for b in chunk {
                let _ = write!(out, " {:02x}", b);
            }
            out.push('\n');
        }
        out
    }

    pub fn read_u8(&self, address: u32) -> Result<u8> {
        self.bytes
            .get(address as usize)
            .copied()
            .ok_or(DisasmError::RomOverrun { address, length: 1 })
    }

    /// `length` bytes starting at `address`
    pub fn interval(&self, address: u32, length: usize) -> Result<&[u8]> {
        let start = address as usize;
        let end = start
            .checked_add(length)
            .ok_or(DisasmError::RomOverrun { address, length })?;
        self.bytes
            .get(start..end)
            .ok_or(DisasmError::RomOverrun { address, length })
    }

    /// Bytes from `address` up to, not including, the first `byte`.
    /// Runs to the end of the image when `byte` never appears.
    pub fn until(&self, address: u32, byte: u8) -> &[u8] {
        let start = (address as usize).min(self.bytes.len());
        let rest = &self.bytes[start..];
        match rest.iter().position(|&b| b == byte) {
            Some(n) => &rest[..n],
            None => rest,
        }
    }

    /// Distance from `start` to the next `byte`
    pub fn how_many_until(&self, byte: u8, start: u32) -> Option<usize> {
        let start = start as usize;
        if start >= self.bytes.len() {
            return None;
        }
        self.bytes[start..].iter().position(|&b| b == byte)
    }

    /// Little-endian pointer at `address`, resolved under `bank`
    pub fn pointer_at(&self, address: u32, bank: Option<u8>) -> Result<u32> {
        let raw = self.interval(address, 2)?;
        pointer_from_bytes(raw[0], raw[1], bank)
    }

    /// Three-byte far pointer `bank, lo, hi` at `address`
    pub fn banked_pointer_at(&self, address: u32) -> Result<u32> {
        let raw = self.interval(address, 3)?;
        trace!(
            "far pointer at {:06x}: bank {:02x} ptr {:02x}{:02x}",
            address,
            raw[0],
            raw[2],
            raw[1]
        );
        to_pointer(u16::from_le_bytes([raw[1], raw[2]]) as u32, Some(raw[0]))
    }
}

impl Debug for RomStr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::result::Result<(), Error> {
        write!(f, "RomStr({} bytes)", self.bytes.len())
    }
}

impl From<Vec<u8>> for RomStr {
    fn from(bytes: Vec<u8>) -> Self {
        RomStr::new(bytes)
    }
}

impl From<&[u8]> for RomStr {
    fn from(bytes: &[u8]) -> Self {
        RomStr::new(bytes.to_vec())
    }
}

impl AsRef<[u8]> for RomStr {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl<I: SliceIndex<[u8]>> Index<I> for RomStr {
    type Output = I::Output;

    fn index(&self, index: I) -> &Self::Output {
        &self.bytes[index]
    }
}

impl PartialEq<[u8]> for RomStr {
    fn eq(&self, other: &[u8]) -> bool {
        self.bytes.as_slice() == other
    }
}

impl PartialEq<Vec<u8>> for RomStr {
    fn eq(&self, other: &Vec<u8>) -> bool {
        &self.bytes == other
    }
}

impl PartialEq<RomStr> for Vec<u8> {
    fn eq(&self, other: &RomStr) -> bool {
        self == &other.bytes
    }
}

impl PartialEq<&[u8]> for RomStr {
    fn eq(&self, other: &&[u8]) -> bool {
        self.bytes.as_slice() == *other
    }
}

/// Lines of an assembly source listing
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AsmList {
    lines: Vec<String>,
}

impl AsmList {
    pub fn new(lines: Vec<String>) -> Self {
        AsmList { lines }
    }

    /// Split source text into lines; a trailing newline does not add an
    /// empty last line
    pub fn from_source(text: &str) -> Self {
        AsmList {
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn length(&self) -> usize {
        self.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.lines.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.lines
    }

    /// Replace line `index` with any number of lines
    pub fn splice_line(&mut self, index: usize, replacement: Vec<String>) -> Result<()> {
        if index >= self.lines.len() {
            return Err(DisasmError::NotFound(format!("line {}", index)));
        }
        self.lines.splice(index..=index, replacement);
        Ok(())
    }

    pub fn to_printable(&self) -> String {
        self.lines.join("\n")
    }
}

impl Debug for AsmList {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::result::Result<(), Error> {
        write!(f, "AsmList({} lines)", self.lines.len())
    }
}

impl From<Vec<String>> for AsmList {
    fn from(lines: Vec<String>) -> Self {
        AsmList::new(lines)
    }
}

impl From<Vec<&str>> for AsmList {
    fn from(lines: Vec<&str>) -> Self {
        AsmList::new(lines.into_iter().map(str::to_string).collect())
    }
}

impl<S: Into<String>> FromIterator<S> for AsmList {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        AsmList::new(iter.into_iter().map(Into::into).collect())
    }
}

impl From<AsmList> for Vec<String> {
    fn from(list: AsmList) -> Self {
        list.lines
    }
}

impl PartialEq<Vec<String>> for AsmList {
    fn eq(&self, other: &Vec<String>) -> bool {
        &self.lines == other
    }
}

impl PartialEq<AsmList> for Vec<String> {
    fn eq(&self, other: &AsmList) -> bool {
        self == &other.lines
    }
}

impl PartialEq<[&str]> for AsmList {
    fn eq(&self, other: &[&str]) -> bool {
        self.lines.len() == other.len() && self.lines.iter().zip(other).all(|(a, b)| a == b)
    }
}

impl PartialEq<Vec<&str>> for AsmList {
    fn eq(&self, other: &Vec<&str>) -> bool {
        self == other.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    const SAMPLE: &[u8] = b"hello world!";

    #[test]
    fn test_romstr_equals_raw() {
        let rom = RomStr::from(SAMPLE);
        assert_eq!(rom, SAMPLE.to_vec());
        assert_eq!(SAMPLE.to_vec(), rom);
        assert_eq!(rom, SAMPLE);
        assert_ne!(RomStr::from(&b"a"[..]), RomStr::from(&b"b"[..]));
    }

    #[test]
    fn test_romstr_length() {
        let rom = RomStr::from(SAMPLE);
        assert_eq!(rom.len(), SAMPLE.len());
        assert_eq!(rom.length(), SAMPLE.len());
    }

    #[test]
    fn test_romstr_debug_hides_contents() {
        let rom = RomStr::from(SAMPLE);
        let shown = format!("{:?}", rom);
        assert_eq!(shown, "RomStr(12 bytes)");
        assert!(rom.to_printable().starts_with("000000: 68 65 6c"));
    }

    #[test]
    fn test_romstr_reads() {
        let rom = RomStr::new(vec![0x10, 0x20, 0x50, 0x30, 0xc0, 0xf0]);
        assert_eq!(rom.read_u8(1).unwrap(), 0x20);
        assert_eq!(rom.interval(1, 2).unwrap(), &[0x20, 0x50]);
        assert!(matches!(rom.interval(5, 2), Err(DisasmError::RomOverrun { .. })));
        assert_eq!(rom.until(0, 0x50), &[0x10, 0x20]);
        assert_eq!(rom.until(3, 0x50), &[0x30, 0xc0, 0xf0]);
        assert_eq!(rom.how_many_until(0x50, 0), Some(2));
        assert_eq!(rom.how_many_until(0x99, 0), None);
        assert_eq!(rom.pointer_at(4, None).unwrap(), 0xf0c0);
        assert_eq!(rom[2], 0x50);
    }

    #[test]
    fn test_romstr_banked_pointer() {
        let rom = RomStr::new(vec![0x65, 0x61, 0x76]);
        assert_eq!(rom.banked_pointer_at(0).unwrap(), 0x197661);

        let home = RomStr::new(vec![0x00, 0x00, 0x45]);
        assert!(matches!(
            home.banked_pointer_at(0),
            Err(DisasmError::InvalidAddress(0x4500))
        ));
        let past_end = RomStr::new(vec![0x80, 0x00, 0x40]);
        assert!(past_end.banked_pointer_at(0).is_err());
    }

    #[test]
    fn test_asmlist_equals() {
        let base = vec!["1".to_string(), "2".to_string(), "3".to_string()];
        let asm = AsmList::from(base.clone());
        assert_eq!(base, asm);
        assert_eq!(asm, base);
        assert_eq!(base, Vec::<String>::from(asm.clone()));
        assert_eq!(asm, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_asmlist_length() {
        let asm: AsmList = (0..10).map(|i| i.to_string()).collect();
        assert_eq!(asm.len(), 10);
        assert_eq!(asm.length(), 10);
        assert_eq!(asm.iter().count(), 10);
        assert_eq!(format!("{:?}", asm), "AsmList(10 lines)");
    }

    #[test]
    fn test_asmlist_splice() {
        let mut asm = AsmList::from_source("a\nb\nc\n");
        assert_eq!(asm.len(), 3);
        asm.splice_line(1, vec!["x".to_string(), "y".to_string()]).unwrap();
        assert_eq!(asm, vec!["a", "x", "y", "c"]);
        assert!(asm.splice_line(10, vec![]).is_err());
    }
}
