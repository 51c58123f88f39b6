#[cfg(test)]
mod tests {
    use crate::charmap::{CharacterTable, Control, Entry, CHARS};
    use crate::error::DisasmError;
    use crate::revision::Revision;
    use crate::romstr::RomStr;
    use crate::script::ScriptParser;
    use crate::text::*;
    use test_log::test;

    /// Encode plain text with the western glyph set
    fn encode(text: &str) -> Vec<u8> {
        text.chars()
            .map(|c| {
                let glyph = c.to_string();
                CHARS
                    .iter()
                    .find(|(_, g)| **g == glyph)
                    .map(|(&b, _)| b)
                    .unwrap()
            })
            .collect()
    }

    fn place(bytes: &mut [u8], address: u32, data: &[u8]) {
        bytes[address as usize..address as usize + data.len()].copy_from_slice(data);
    }

    #[test]
    fn test_decode_bytes_lines() {
        let mut bytes = encode("HELLO");
        bytes.push(0x4F);
        bytes.extend(encode("world"));
        bytes.push(0x57);
        bytes.extend(encode("JUNK"));

        let block = decode_bytes(&bytes);
        assert!(block.terminated);
        assert_eq!(block.length, 12);
        assert_eq!(block.lines.len(), 2);
        assert_eq!(block.line_strings(), vec!["HELLO<LINE>", "world<DONE>"]);
        assert_eq!(block.ending(), Some(Control::Done));
        assert!(!block.contains("JUNK"));
    }

    #[test]
    fn test_decode_bytes_without_terminator() {
        let block = decode_bytes(&encode("ABC"));
        assert!(!block.terminated);
        assert_eq!(block.length, 3);
        assert_eq!(block.to_string(), "ABC");
        assert_eq!(block.ending(), None);
    }

    #[test]
    fn test_unmapped_byte_is_raw() {
        let block = decode_bytes(&[0x80, 0x01, 0x50]);
        assert_eq!(block.lines[0][1], Token::Raw(0x01));
        assert_eq!(block.to_string(), "A<$01>@");
    }

    #[test]
    fn test_decode_at_known_length() {
        let mut bytes = vec![0u8; 0x100];
        let mut text = encode("POKEMON TRAINER");
        text.push(0x58);
        place(&mut bytes, 0x40, &text);
        let rom = RomStr::new(bytes);

        let whole = decode_at(&rom, 0x40, None).unwrap();
        assert!(whole.contains("POKEMON TRAINER"));
        assert_eq!(whole.ending(), Some(Control::Prompt));
        assert_eq!(whole.length, 16);

        let part = decode_at(&rom, 0x40, Some(7)).unwrap();
        assert_eq!(part.to_string(), "POKEMON");
        assert!(!part.terminated);

        assert!(matches!(
            decode_at(&rom, 0xF0, Some(0x20)),
            Err(DisasmError::RomOverrun { .. })
        ));
        assert_eq!(decode_at(&rom, 0x200000, None), Err(DisasmError::InvalidAddress(0x200000)));
    }

    #[test]
    fn test_split_lines() {
        let lines = split_lines(&[0x80, 0x4F, 0x81, 0x51, 0x82, 0x55, 0x83]);
        assert_eq!(
            lines,
            vec![vec![0x80, 0x4F], vec![0x81, 0x51], vec![0x82, 0x55], vec![0x83]]
        );
        assert!(split_lines(&[]).is_empty());
        assert_eq!(split_lines(&[0x4E]), vec![vec![0x4E]]);
    }

    #[test]
    fn test_alternate_set_and_wide_glyphs() {
        let mut table = CharacterTable::gen2();
        table.shift = Some(0x05);
        table.primary.insert(
            0x01,
            Entry::Wide {
                glyph: "<BOLD_V>".to_string(),
                width: 2,
            },
        );
        let decoder = TextDecoder::new(&table);

        let block = decoder.decode_bytes(&[0x05, 0x44, 0x05, 0x80, 0x57]);
        assert_eq!(block.to_string(), "ぱA<DONE>");
        assert_eq!(block.length, 5);

        let block = decoder.decode_bytes(&[0x01, 0x00, 0x80, 0x50]);
        assert_eq!(block.lines[0].len(), 3);
        assert_eq!(block.to_string(), "<BOLD_V>A@");
        assert_eq!(block.length, 4);

        // a wide glyph cut short by the end of input
        let block = decoder.decode_bytes(&[0x80, 0x01]);
        assert_eq!(block.lines[0][1], Token::Raw(0x01));
    }

    #[test]
    fn test_find_text_pointers_in_script() {
        let mut bytes = vec![0u8; 0x20000];
        place(
            &mut bytes,
            0x14000,
            &[
                0x47, // opentext
                0x4C, 0x30, 0x40, // writetext $4030
                0x4C, 0x10, 0x40, // writetext $4010
                0x4C, 0x30, 0x40, // writetext $4030 again
                0x64, 0x50, 0x40, 0x60, 0x40, // winlosstext $4050, $4060
                0x53, 0x10, 0x40, // jumptext $4010
            ],
        );
        let rom = RomStr::new(bytes);
        let script = ScriptParser::new(&rom, Revision::Crystal)
            .parse_at(0x14000)
            .unwrap();

        let found = find_text_pointers_in(&script.commands);
        let found: Vec<u32> = found.into_iter().collect();
        assert_eq!(found, vec![0x14010, 0x14030, 0x14050, 0x14060]);
    }

    #[test]
    fn test_text_pointers_ignore_other_targets() {
        let mut bytes = vec![0u8; 0x20000];
        // applymovement 2, $4010; iftrue $4020; end
        place(&mut bytes, 0x14000, &[0x69, 0x02, 0x10, 0x40, 0x09, 0x20, 0x40, 0x91]);
        let rom = RomStr::new(bytes);
        let script = ScriptParser::new(&rom, Revision::Crystal)
            .parse_at(0x14000)
            .unwrap();
        assert!(find_text_pointers_in(&script.commands).is_empty());
    }

    #[test]
    fn test_text_script_stops_at_done() {
        let mut bytes = vec![0u8; 0x200];
        let mut stream = vec![0x00];
        stream.extend(encode("HELLO"));
        stream.push(0x4F);
        stream.extend(encode("WORLD"));
        stream.push(0x57);
        stream.push(0x50);
        place(&mut bytes, 0x100, &stream);
        let rom = RomStr::new(bytes);

        let script = TextScript::parse_at(&rom, 0x100).unwrap();
        assert_eq!(script.commands.len(), 1);
        assert_eq!(script.commands[0].name, "text_start");
        assert!(script.text().contains("HELLO"));
        assert!(script.text().contains("WORLD"));
        assert_eq!(script.end_address(), 0x100 + 13);
    }

    #[test]
    fn test_text_script_runs_through_terminators() {
        let mut bytes = vec![0u8; 0x200];
        let mut stream = vec![0x00];
        stream.extend(encode("HI"));
        stream.push(0x50);
        stream.extend([0x01, 0x34, 0xD0]); // text_ram wStringBuffer
        stream.push(0x00);
        stream.extend(encode("X"));
        stream.push(0x58);
        place(&mut bytes, 0x10, &stream);
        let rom = RomStr::new(bytes);

        let script = TextScript::parse_at(&rom, 0x10).unwrap();
        let names: Vec<&str> = script.commands.iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["text_start", "text_ram", "text_start"]);
        assert_eq!(script.commands[1].body, TextCommandBody::Ram(0xD034));
        assert_eq!(script.text(), "HI@X<PROMPT>");
    }

    #[test]
    fn test_text_far() {
        let mut bytes = vec![0u8; 0x100];
        place(&mut bytes, 0x20, &[0x16, 0x00, 0x40, 0x07, 0x50]);
        let rom = RomStr::new(bytes);

        let script = TextScript::parse_at(&rom, 0x20).unwrap();
        assert_eq!(script.commands.len(), 2);
        assert_eq!(script.far_targets(), vec![0x1C000]);
        assert_eq!(script.commands[1].name, "text_end");
        assert_eq!(script.end_address(), 0x25);
    }

    #[test]
    fn test_text_far_to_bank_zero_has_no_target() {
        let mut bytes = vec![0u8; 0x100];
        place(&mut bytes, 0x20, &[0x16, 0x00, 0x45, 0x00, 0x50]);
        let rom = RomStr::new(bytes);

        let script = TextScript::parse_at(&rom, 0x20).unwrap();
        assert_eq!(script.commands.len(), 2);
        assert!(script.far_targets().is_empty());
        assert_eq!(script.end_address(), 0x25);
    }

    #[test]
    fn test_text_script_unknown_command() {
        let rom = RomStr::new(vec![0x0A, 0x30]);
        assert_eq!(
            TextScript::parse_at(&rom, 0),
            Err(DisasmError::UnknownOpcode {
                opcode: 0x30,
                address: 1
            })
        );
    }
}
