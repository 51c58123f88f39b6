/// End to end: decode a script and its text out of a synthetic ROM, name
/// everything through the label registry, then carve the decoded regions
/// out of an INCBIN listing.
use pokedasm::charmap::CHARS;
use pokedasm::config::DisasmConfig;
use pokedasm::incbin::IncbinAnalyzer;
use pokedasm::labels::LabelRegistry;
use pokedasm::revision::{translate_command_byte, Revision};
use pokedasm::romstr::RomStr;
use pokedasm::script::{synthesize_labels, ScriptParser};
use pokedasm::text::{find_text_pointers_in, TextScript};
use test_log::test;

const SCRIPT: u32 = 0x14000;
const TEXT: u32 = 0x14010;

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

fn rom() -> RomStr {
    let mut bytes = vec![0u8; 0x20000];
    let script = [
        0x47, // opentext
        0x4C, 0x10, 0x40, // writetext $4010
        0x54, // waitbutton
        0x49, // closetext
        0x91, // end
    ];
    bytes[SCRIPT as usize..SCRIPT as usize + script.len()].copy_from_slice(&script);

    let mut text = vec![0x00];
    text.extend(encode("HELLO"));
    text.push(0x4F);
    text.extend(encode("THERE"));
    text.push(0x57);
    bytes[TEXT as usize..TEXT as usize + text.len()].copy_from_slice(&text);
    RomStr::new(bytes)
}

const LISTING: &str = "SECTION \"bank5\", ROMX, BANK[$5]\n\
    \n\
    SomeMapScript: ; 0x14000\n\
    INCBIN \"baserom.gbc\",$14000,$18000 - $14000\n";

#[test]
fn test_script_text_and_carve() {
    let rom = rom();
    let config = DisasmConfig::default();

    let lines: Vec<String> = LISTING.lines().map(str::to_string).collect();
    let mut registry = LabelRegistry::new();
    let report = registry.scan(&lines);
    assert_eq!(report.labels.len(), 1);
    assert_eq!(registry.resolve(SCRIPT), Some("SomeMapScript"));

    let parser = ScriptParser::new(&rom, config.revision);
    let script = parser.parse_at(SCRIPT).unwrap();
    assert_eq!(script.len(), 5);
    assert_eq!(synthesize_labels(&script, &mut registry), 1);
    assert_eq!(registry.resolve(TEXT), Some("UnknownText_0x14010"));

    let asm = script.to_asm(&registry, None);
    assert!(asm.starts_with("SomeMapScript: ; 0x14000\n"));
    assert!(asm.contains("\twritetext UnknownText_0x14010\n"));

    let texts = find_text_pointers_in(&script.commands);
    assert_eq!(texts.iter().copied().collect::<Vec<u32>>(), vec![TEXT]);
    let text = TextScript::parse_at(&rom, TEXT).unwrap();
    assert_eq!(text.text(), "HELLO<LINE>THERE<DONE>");

    let mut analyzer = IncbinAnalyzer::from_source(LISTING).with_name(&config.asm_path);
    let script_carve = analyzer
        .carve(
            SCRIPT,
            script.end_address() - SCRIPT,
            "script",
            config.diff_context,
        )
        .unwrap();
    assert!(script_carve
        .diff
        .contains("+INCBIN \"baserom.gbc\",$14000,$14007 - $14000\n"));

    let text_carve = analyzer
        .carve(TEXT, text.end_address() - TEXT, "text", config.diff_context)
        .unwrap();
    assert_eq!(text_carve.lines.len(), 3);

    let spans: Vec<(u32, u32)> = analyzer.spans().map(|s| (s.start, s.end)).collect();
    assert_eq!(
        spans,
        vec![
            (0x14000, 0x14007),
            (0x14007, 0x14010),
            (0x14010, 0x1401D),
            (0x1401D, 0x18000)
        ]
    );
    assert_eq!(
        analyzer.classified().lookup(TEXT + 4).map(String::as_str),
        Some("text")
    );
    assert!(analyzer.to_source().ends_with("$1401d,$18000 - $1401d\n"));
}

#[test]
fn test_gold_and_crystal_agree_after_translation() {
    // gold waitbutton sits one below crystal's, past the first crystal-only command
    let gold = 0x53;
    let crystal = translate_command_byte(gold, Revision::Gold, Revision::Crystal)
        .unwrap()
        .unwrap();
    assert_eq!(crystal, 0x54);

    let gold_rom = RomStr::new(vec![gold, 0x90]);
    let crystal_rom = RomStr::new(vec![crystal, 0x91]);
    let a = ScriptParser::new(&gold_rom, Revision::Gold).parse_at(0).unwrap();
    let b = ScriptParser::new(&crystal_rom, Revision::Crystal)
        .parse_at(0)
        .unwrap();
    assert_eq!(a.commands[0].mnemonic, b.commands[0].mnemonic);
    assert_eq!(a.commands[0].size, b.commands[0].size);
}
