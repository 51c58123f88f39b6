//! In-game character encoding.
//!
//! Text is one byte per glyph. Bytes `0x49..=0x5F` are control codes
//! shared by both glyph sets.

use std::collections::HashMap;

/// Control codes embedded in text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Page,
    Scroll,
    /// Move to the next line without waiting
    Next,
    Line,
    /// `@`, end of a string
    Terminator,
    Para,
    Cont,
    Done,
    Prompt,
    /// Placeholder that expands at runtime, such as `<PLAYER>`
    Placeholder(&'static str),
}

impl Control {
    pub fn token(&self) -> &'static str {
        match self {
            Control::Page => "<PAGE>",
            Control::Scroll => "<SCROLL>",
            Control::Next => "<NEXT>",
            Control::Line => "<LINE>",
            Control::Terminator => "@",
            Control::Para => "<PARA>",
            Control::Cont => "<CONT>",
            Control::Done => "<DONE>",
            Control::Prompt => "<PROMPT>",
            Control::Placeholder(name) => *name,
        }
    }

    /// Ends a text block
    pub fn is_done(&self) -> bool {
        matches!(self, Control::Terminator | Control::Done | Control::Prompt)
    }

    pub fn is_line_break(&self) -> bool {
        matches!(
            self,
            Control::Next | Control::Line | Control::Para | Control::Cont | Control::Page
        )
    }
}

/// What a byte decodes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Glyph(String),
    /// Glyph spelled over several bytes; `width` includes the lead byte
    Wide { glyph: String, width: usize },
    Control(Control),
}

/// Byte values that end a line of text
pub const LINE_BREAK_BYTES: &[u8] = &[0x4E, 0x4F, 0x51, 0x55];

/// Byte values that end a block of text
pub const DONE_BYTES: &[u8] = &[0x50, 0x57, 0x58];

const CONTROLS: &[(u8, Control)] = &[
    (0x49, Control::Page),
    (0x4A, Control::Placeholder("<PKMN>")),
    (0x4B, Control::Placeholder("<_CONT>")),
    (0x4C, Control::Scroll),
    (0x4E, Control::Next),
    (0x4F, Control::Line),
    (0x50, Control::Terminator),
    (0x51, Control::Para),
    (0x52, Control::Placeholder("<PLAYER>")),
    (0x53, Control::Placeholder("<RIVAL>")),
    (0x54, Control::Placeholder("#")),
    (0x55, Control::Cont),
    (0x56, Control::Placeholder("<……>")),
    (0x57, Control::Done),
    (0x58, Control::Prompt),
    (0x59, Control::Placeholder("<TARGET>")),
    (0x5A, Control::Placeholder("<USER>")),
    (0x5B, Control::Placeholder("<PC>")),
    (0x5C, Control::Placeholder("<TM>")),
    (0x5D, Control::Placeholder("<TRAINER>")),
    (0x5E, Control::Placeholder("<ROCKET>")),
    (0x5F, Control::Placeholder("<DEXEND>")),
];

const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
const DIGITS: &str = "0123456789";

const KATAKANA: &[&str] = &[
    "ア", "イ", "ウ", "エ", "オ", "カ", "キ", "ク", "ケ", "コ", "サ", "シ", "ス", "セ", "ソ", "タ",
    "チ", "ツ", "テ", "ト", "ナ", "ニ", "ヌ", "ネ", "ノ", "ハ", "ヒ", "フ", "ホ", "マ", "ミ", "ム",
    "メ", "モ", "ヤ", "ユ", "ヨ", "ラ", "ル", "レ", "ロ", "ワ", "ヲ", "ン", "ッ", "ャ", "ュ", "ョ",
    "ィ",
];

lazy_static! {
    /// Western glyph set
    pub static ref CHARS: HashMap<u8, &'static str> = {
        let mut m = HashMap::new();
        m.insert(0x70, "<PO>");
        m.insert(0x71, "<KE>");
        m.insert(0x72, "“");
        m.insert(0x73, "”");
        m.insert(0x74, "·");
        m.insert(0x75, "…");
        m.insert(0x7F, " ");
        for (i, c) in UPPERCASE.char_indices() {
            m.insert(0x80 + i as u8, &UPPERCASE[i..i + c.len_utf8()]);
        }
        m.insert(0x9A, "(");
        m.insert(0x9B, ")");
        m.insert(0x9C, ":");
        m.insert(0x9D, ";");
        m.insert(0x9E, "[");
        m.insert(0x9F, "]");
        for (i, c) in LOWERCASE.char_indices() {
            m.insert(0xA0 + i as u8, &LOWERCASE[i..i + c.len_utf8()]);
        }
        m.insert(0xC0, "Ä");
        m.insert(0xC1, "Ö");
        m.insert(0xC2, "Ü");
        m.insert(0xC3, "ä");
        m.insert(0xC4, "ö");
        m.insert(0xC5, "ü");
        m.insert(0xD0, "'d");
        m.insert(0xD1, "'l");
        m.insert(0xD2, "'m");
        m.insert(0xD3, "'r");
        m.insert(0xD4, "'s");
        m.insert(0xD5, "'t");
        m.insert(0xD6, "'v");
        m.insert(0xE0, "'");
        m.insert(0xE1, "<PK>");
        m.insert(0xE2, "<MN>");
        m.insert(0xE3, "-");
        m.insert(0xE6, "?");
        m.insert(0xE7, "!");
        m.insert(0xE8, ".");
        m.insert(0xE9, "&");
        m.insert(0xEA, "é");
        m.insert(0xEB, "→");
        m.insert(0xEC, "▷");
        m.insert(0xED, "▶");
        m.insert(0xEE, "▼");
        m.insert(0xEF, "♂");
        m.insert(0xF0, "¥");
        m.insert(0xF1, "×");
        m.insert(0xF2, "<DOT>");
        m.insert(0xF3, "/");
        m.insert(0xF4, ",");
        m.insert(0xF5, "♀");
        for (i, c) in DIGITS.char_indices() {
            m.insert(0xF6 + i as u8, &DIGITS[i..i + c.len_utf8()]);
        }
        m
    };

    /// Japanese glyph set
    pub static ref JAP_CHARS: HashMap<u8, &'static str> = {
        let mut m = HashMap::new();
        for (i, kana) in ["パ", "ピ", "プ", "ポ", "ぱ", "ぴ", "ぷ", "ぺ", "ぽ"].iter().enumerate() {
            m.insert(0x40 + i as u8, *kana);
        }
        m.insert(0x7F, " ");
        for (i, kana) in KATAKANA.iter().enumerate() {
            m.insert(0x80 + i as u8, *kana);
        }
        m.insert(0xE3, "ー");
        m.insert(0xE6, "?");
        m.insert(0xE7, "!");
        m.insert(0xE8, "。");
        for (i, c) in DIGITS.char_indices() {
            m.insert(0xF6 + i as u8, &DIGITS[i..i + c.len_utf8()]);
        }
        m
    };

    static ref GEN2: CharacterTable = CharacterTable::gen2();
}

/// Byte to glyph mapping with an optional alternate set
#[derive(Debug, Clone, Default)]
pub struct CharacterTable {
    pub primary: HashMap<u8, Entry>,
    pub alternate: HashMap<u8, Entry>,
    /// Byte that toggles the alternate set, when the table has one
    pub shift: Option<u8>,
}

impl CharacterTable {
    /// Stock table: western glyphs primary, Japanese glyphs alternate
    pub fn gen2() -> Self {
        let mut primary: HashMap<u8, Entry> = CHARS
            .iter()
            .map(|(&b, &s)| (b, Entry::Glyph(s.to_string())))
            .collect();
        let mut alternate: HashMap<u8, Entry> = JAP_CHARS
            .iter()
            .map(|(&b, &s)| (b, Entry::Glyph(s.to_string())))
            .collect();
        for &(b, control) in CONTROLS {
            primary.insert(b, Entry::Control(control));
            alternate.insert(b, Entry::Control(control));
        }
        CharacterTable {
            primary,
            alternate,
            shift: None,
        }
    }

    /// Shared copy of the stock table
    pub fn stock() -> &'static CharacterTable {
        &GEN2
    }

    pub fn lookup(&self, byte: u8, alternate: bool) -> Option<&Entry> {
        if alternate {
            self.alternate.get(&byte).or_else(|| self.primary.get(&byte))
        } else {
            self.primary.get(&byte)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_chars() {
        assert_eq!(CHARS[&0x80], "A");
        assert_eq!(CHARS[&0xA0], "a");
        assert_eq!(CHARS[&0xF0], "¥");
        assert_eq!(CHARS[&0xF6], "0");
        assert_eq!(CHARS[&0x99], "Z");
        assert_eq!(JAP_CHARS[&0x44], "ぱ");
        assert_eq!(JAP_CHARS[&0x80], "ア");
    }

    #[test]
    fn test_controls_in_both_sets() {
        let table = CharacterTable::stock();
        assert_eq!(table.lookup(0x57, false), Some(&Entry::Control(Control::Done)));
        assert_eq!(table.lookup(0x57, true), Some(&Entry::Control(Control::Done)));
        assert_eq!(table.lookup(0x4F, false), Some(&Entry::Control(Control::Line)));
        assert_eq!(table.lookup(0x01, false), None);
        assert!(table.shift.is_none());
    }

    #[test]
    fn test_control_classes() {
        for &b in DONE_BYTES {
            match CharacterTable::stock().lookup(b, false) {
                Some(Entry::Control(c)) => assert!(c.is_done()),
                other => panic!("{:#04x} decoded to {:?}", b, other),
            }
        }
        for &b in LINE_BREAK_BYTES {
            match CharacterTable::stock().lookup(b, false) {
                Some(Entry::Control(c)) => assert!(c.is_line_break()),
                other => panic!("{:#04x} decoded to {:?}", b, other),
            }
        }
        assert_eq!(Control::Placeholder("<PLAYER>").token(), "<PLAYER>");
        assert!(!Control::Placeholder("<PLAYER>").is_done());
    }
}
