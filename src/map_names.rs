use indexmap::IndexMap;
use log::debug;
use std::collections::HashMap;

use crate::error::{DisasmError, Result};

/// The in-game spelling is abbreviated in labels and constants
const POKECENTER_LONG: &str = "Pokémon Center";
const POKECENTER_SHORT: &str = "PokeCenter";

/// Fold the accented letters that appear in map names
fn fold_diacritics(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' => 'a',
        'Á' | 'À' | 'Â' | 'Ä' | 'Ã' => 'A',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' => 'O',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ç' => 'c',
        'Ç' => 'C',
        other => other,
    }
}

/// Words of a map name with punctuation dropped and accents folded
fn name_words(name: &str) -> Vec<String> {
    let name = name.replace(POKECENTER_LONG, POKECENTER_SHORT);
    name.split(|c: char| c.is_whitespace() || c == '-' || c == '/')
        .map(|word| {
            word.chars()
                .map(fold_diacritics)
                .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect()
}

/// CamelCase label for a map: "Some Random Pokémon Center" becomes
/// "SomeRandomPokeCenter"
pub fn map_name_cleaner(name: &str) -> String {
    let joined: String = name_words(name).concat().replace("Hooh", "HoOh");
    let mut chars = joined.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Uppercase constant for a map: "Olivine Pokémon Center 1F" becomes
/// "OLIVINE_POKECENTER_1F"
pub fn map_constant_name(name: &str) -> String {
    name_words(name)
        .iter()
        .map(|word| word.to_ascii_uppercase())
        .collect::<Vec<_>>()
        .join("_")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapConstant {
    pub group: u8,
    pub id: u8,
    pub name: String,
    pub label: String,
}

/// Constants for every known map, in definition order. The position of a
/// map in this table is its internal id.
#[derive(Debug, Clone, Default)]
pub struct MapConstants {
    maps: IndexMap<(u8, u8), MapConstant>,
    by_label: HashMap<String, usize>,
}

impl MapConstants {
    /// Build constants from `(group, id, name)` triples. A name that
    /// normalizes to an already taken constant gets its group and id
    /// appended.
    pub fn generate<'a, I>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = (u8, u8, &'a str)>,
    {
        let mut constants = MapConstants::default();
        for (group, id, name) in names {
            if constants.maps.contains_key(&(group, id)) {
                return Err(DisasmError::malformed(
                    name,
                    &format!("map {}.{} is defined twice", group, id),
                ));
            }
            let base = map_constant_name(name);
            if base.is_empty() {
                return Err(DisasmError::malformed(name, "map name has no identifier characters"));
            }
            let mut label = base.clone();
            let mut attempt = 1;
            while constants.by_label.contains_key(&label) {
                let unique = match attempt {
                    1 => format!("{}_{}_{}", base, group, id),
                    n => format!("{}_{}_{}_{}", base, group, id, n),
                };
                debug!("map constant {} already taken, trying {}", label, unique);
                label = unique;
                attempt += 1;
            }
            let index = constants.maps.len();
            constants.by_label.insert(label.clone(), index);
            constants.maps.insert(
                (group, id),
                MapConstant {
                    group,
                    id,
                    name: name.to_string(),
                    label,
                },
            );
        }
        Ok(constants)
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    pub fn label_for(&self, group: u8, id: u8) -> Option<&str> {
        self.maps.get(&(group, id)).map(|m| m.label.as_str())
    }

    pub fn label_by_internal_id(&self, internal_id: usize) -> Option<&str> {
        self.maps
            .get_index(internal_id)
            .map(|(_, m)| m.label.as_str())
    }

    pub fn internal_id_for(&self, label: &str) -> Option<usize> {
        self.by_label.get(label).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MapConstant> + '_ {
        self.maps.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn sample() -> MapConstants {
        MapConstants::generate(vec![
            (1, 1, "Olivine Pokémon Center 1F"),
            (1, 2, "Olivine Gym"),
            (2, 7, "Mahogany Town"),
            (3, 0x34, "Ilex Forest"),
            (7, 0x11, "Cerulean City"),
        ])
        .unwrap()
    }

    #[test]
    fn test_map_name_cleaner() {
        let name = "hello world";
        let cleaned = map_name_cleaner(name);
        assert_ne!(name, cleaned);
        assert!(!cleaned.contains(' '));
        assert_eq!(cleaned, "Helloworld");

        let cleaned = map_name_cleaner("Some Random Pokémon Center");
        assert_eq!(cleaned, "SomeRandomPokeCenter");
        assert!(!cleaned.contains('é'));
        assert_eq!(map_name_cleaner("Tin Tower (Hooh)"), "TinTowerHoOh");
    }

    #[test]
    fn test_map_constant_name() {
        assert_eq!(map_constant_name("Olivine Pokémon Center 1F"), "OLIVINE_POKECENTER_1F");
        assert_eq!(map_constant_name("Mr. Pokémon's House"), "MR_POKEMONS_HOUSE");
        assert_eq!(map_constant_name("Route 32 Ruins of Alph Gate"), "ROUTE_32_RUINS_OF_ALPH_GATE");
        assert_eq!(map_constant_name("Cerulean City"), "CERULEAN_CITY");
    }

    #[test]
    fn test_generate_map_constant_labels() {
        let constants = sample();
        assert_eq!(constants.len(), 5);
        assert_eq!(constants.label_by_internal_id(0), Some("OLIVINE_POKECENTER_1F"));
        assert_eq!(constants.label_by_internal_id(1), Some("OLIVINE_GYM"));
        assert_eq!(constants.label_for(2, 7), Some("MAHOGANY_TOWN"));
        assert_eq!(constants.label_for(9, 9), None);
    }

    #[test]
    fn test_internal_id_for_label() {
        let constants = sample();
        assert_eq!(constants.internal_id_for("OLIVINE_GYM"), Some(1));
        assert_eq!(constants.internal_id_for("OLIVINE_POKECENTER_1F"), Some(0));
        assert_eq!(constants.internal_id_for("NOWHERE"), None);
    }

    #[test]
    fn test_colliding_names_stay_unique() {
        let constants =
            MapConstants::generate(vec![(4, 1, "Route 30 House"), (5, 9, "Route 30 House")]).unwrap();
        assert_eq!(constants.label_for(4, 1), Some("ROUTE_30_HOUSE"));
        assert_eq!(constants.label_for(5, 9), Some("ROUTE_30_HOUSE_5_9"));
    }

    #[test]
    fn test_suffixed_name_collides_with_real_name() {
        let constants = MapConstants::generate(vec![
            (6, 1, "Route 30 House 5 9"),
            (4, 1, "Route 30 House"),
            (5, 9, "Route 30 House"),
        ])
        .unwrap();
        assert_eq!(constants.label_for(6, 1), Some("ROUTE_30_HOUSE_5_9"));
        assert_eq!(constants.label_for(4, 1), Some("ROUTE_30_HOUSE"));
        assert_eq!(constants.label_for(5, 9), Some("ROUTE_30_HOUSE_5_9_2"));
        assert_eq!(constants.internal_id_for("ROUTE_30_HOUSE_5_9"), Some(0));
        assert_eq!(constants.internal_id_for("ROUTE_30_HOUSE_5_9_2"), Some(2));
    }

    #[test]
    fn test_duplicate_map_is_rejected() {
        let result = MapConstants::generate(vec![(1, 1, "A"), (1, 1, "B")]);
        assert!(matches!(result, Err(DisasmError::MalformedSyntax { .. })));
    }
}
