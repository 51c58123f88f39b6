//! Disassembly engine for Pokémon Gold, Silver and Crystal ROM images.
//!
//! The ROM is a flat 2 MiB image of 16 KiB banks. Decoders here turn
//! regions of it into script command streams and text, name them through
//! a label registry, and carve the decoded regions out of the `INCBIN`
//! lines of an assembly listing.

#[macro_use]
extern crate lazy_static;

pub mod address;
pub mod charmap;
pub mod config;
pub mod error;
pub mod incbin;
pub mod interval_map;
pub mod items;
pub mod labels;
pub mod map_names;
pub mod opcode_tables;
pub mod revision;
pub mod romstr;
pub mod script;
pub mod text;

#[cfg(test)]
mod text_tests;

pub use error::{DisasmError, Result};
pub use revision::Revision;
