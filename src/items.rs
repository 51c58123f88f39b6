use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::{DisasmError, Result};

/// Item ids and their constant names, supplied by the caller
#[derive(Debug, Clone, Default)]
pub struct ItemTable {
    names: IndexMap<u8, String>,
    ids: HashMap<String, u8>,
}

impl ItemTable {
    pub fn new() -> Self {
        ItemTable::default()
    }

    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (u8, &'a str)>,
    {
        let mut table = ItemTable::new();
        for (id, name) in pairs {
            table.insert(id, name)?;
        }
        Ok(table)
    }

    pub fn insert(&mut self, id: u8, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(DisasmError::malformed(name, "item name is empty"));
        }
        if let Some(previous) = self.names.get(&id) {
            return Err(DisasmError::malformed(
                name,
                &format!("item ${:02x} is already {}", id, previous),
            ));
        }
        self.ids.entry(name.to_string()).or_insert(id);
        self.names.insert(id, name.to_string());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn find_label_by_id(&self, id: u8) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    pub fn id_for_label(&self, name: &str) -> Option<u8> {
        self.ids.get(name).copied()
    }

    /// `NAME EQU $xx` lines in id order
    pub fn generate_constants(&self) -> String {
        let mut ids: Vec<&u8> = self.names.keys().collect();
        ids.sort();
        let mut out = String::new();
        for id in ids {
            out.push_str(&format!("{} EQU ${:02x}\n", self.names[id], id));
        }
        out
    }
}
