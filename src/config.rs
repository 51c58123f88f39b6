use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{DisasmError, Result};
use crate::revision::Revision;

/// Settings shared by the decoders and the command line tool.
///
/// Every field has a default, so an empty file is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisasmConfig {
    pub revision: Revision,
    /// ROM image named in INCBIN lines and read by the tool
    pub rom_file: String,
    /// Listing name shown in diff headers
    pub asm_path: String,
    pub diff_context: usize,
    /// Upper bound on text reads that have no known length
    pub max_text_length: usize,
    /// Decode scripts reached through script pointers as well
    pub follow_script_pointers: bool,
}

impl Default for DisasmConfig {
    fn default() -> Self {
        DisasmConfig {
            revision: Revision::Crystal,
            rom_file: "baserom.gbc".to_string(),
            asm_path: "main.asm".to_string(),
            diff_context: 3,
            max_text_length: 0x1000,
            follow_script_pointers: true,
        }
    }
}

impl DisasmConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| DisasmError::Config(e.to_string()))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("loading config from {}", path.display());
        let text = fs::read_to_string(path)?;
        DisasmConfig::from_toml_str(&text)
    }
}
