use std::env;
use std::fs;

use env_logger::Env;
use log::{debug, info, warn};

use pokedasm::address::{parse_hex, BankedPointer};
use pokedasm::config::DisasmConfig;
use pokedasm::incbin::IncbinAnalyzer;
use pokedasm::labels::{self, LabelRegistry};
use pokedasm::romstr::RomStr;
use pokedasm::script::{synthesize_labels, ScriptParser};
use pokedasm::text::decode_at;

fn usage(program: &str) {
    println!("pokedasm - script and text disassembler for Pokémon Gold/Silver/Crystal");
    println!();
    println!(
        "Usage: {} <address> [--text] [--rom file] [--config file] [--labels file] [--asm file]",
        program
    );
    println!("Examples:");
    println!("  {} 0x14000", program);
    println!("  {} $1c000 --text --rom baserom.gbc", program);
    println!("  {} 0x14000 --asm main.asm --labels labels.toml", program);
    println!();
    println!("The address is a ROM offset in hex ($, 0x or bare).");
    println!("With --asm, each decoded region is carved out of the listing's");
    println!("INCBIN lines and the resulting diff is printed.");
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Options {
    address: u32,
    text_mode: bool,
    rom_path: Option<String>,
    config_path: Option<String>,
    labels_path: Option<String>,
    asm_path: Option<String>,
}

/// Parse everything after the program name
fn parse_options(args: &[String]) -> Result<Options, String> {
    let (first, rest) = args.split_first().ok_or("Missing address")?;
    let mut options = Options {
        address: parse_hex(first).ok_or_else(|| format!("Invalid address: {}", first))?,
        ..Options::default()
    };

    let mut rest = rest.iter();
    while let Some(arg) = rest.next() {
        let slot = match arg.as_str() {
            "--text" => {
                options.text_mode = true;
                continue;
            }
            "--rom" => &mut options.rom_path,
            "--config" => &mut options.config_path,
            "--labels" => &mut options.labels_path,
            "--asm" => &mut options.asm_path,
            other => return Err(format!("Unknown option: {}", other)),
        };
        match rest.next() {
            Some(value) if !value.starts_with("--") => *slot = Some(value.clone()),
            _ => return Err(format!("Missing value for {}", arg)),
        }
    }
    Ok(options)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage(&args[0]);
        return Ok(());
    }

    let Options {
        address,
        text_mode,
        rom_path,
        config_path,
        labels_path,
        asm_path,
    } = match parse_options(&args[1..]) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{}", message);
            usage(&args[0]);
            std::process::exit(1);
        }
    };

    let config = match config_path {
        Some(path) => DisasmConfig::load(path)?,
        None => DisasmConfig::default(),
    };
    debug!("{:?}", config);

    let rom_path = rom_path.unwrap_or_else(|| config.rom_file.clone());
    let rom = match fs::read(&rom_path) {
        Ok(bytes) => RomStr::new(bytes),
        Err(e) => {
            eprintln!("Error: cannot read ROM '{}': {}", rom_path, e);
            std::process::exit(1);
        }
    };
    info!("{}: {} bytes, {}", rom_path, rom.len(), config.revision);

    let mut registry = match labels_path {
        Some(path) => LabelRegistry::from_labels(labels::read_from_path(path)?),
        None => LabelRegistry::new(),
    };

    // decoded regions as (start, length, tag)
    let mut regions = Vec::new();
    if text_mode {
        let available = rom.len().saturating_sub(address as usize);
        let block = decode_at(&rom, address, Some(config.max_text_length.min(available)))?;
        if !block.terminated {
            warn!(
                "no terminator within {:#x} bytes of {}",
                block.length,
                BankedPointer::from_address(address)?
            );
        }
        for line in block.line_strings() {
            println!("{}", line);
        }
        regions.push((address, block.length as u32, "text"));
    } else {
        let parser = ScriptParser::new(&rom, config.revision);
        let scripts = if config.follow_script_pointers {
            parser.parse_reachable(address)?
        } else {
            let script = parser.parse_at(address)?;
            std::iter::once((address, script)).collect()
        };
        for script in scripts.values() {
            synthesize_labels(script, &mut registry);
        }
        for script in scripts.values() {
            println!("{}", script.to_asm(&registry, None));
            regions.push((script.address, script.end_address() - script.address, "script"));
        }
    }

    if let Some(path) = asm_path {
        let source = fs::read_to_string(&path)?;
        let mut analyzer = IncbinAnalyzer::from_source(&source).with_name(&config.asm_path);
        for (start, length, tag) in regions {
            match analyzer.carve(start, length, tag, config.diff_context) {
                Ok(carve) => print!("{}", carve.diff),
                Err(e) => warn!("cannot carve {:#x}: {}", start, e),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_options() {
        let options =
            parse_options(&args(&["$1c000", "--text", "--rom", "crystal.gbc", "--asm", "main.asm"]))
                .unwrap();
        assert_eq!(options.address, 0x1C000);
        assert!(options.text_mode);
        assert_eq!(options.rom_path.as_deref(), Some("crystal.gbc"));
        assert_eq!(options.asm_path.as_deref(), Some("main.asm"));
        assert_eq!(options.config_path, None);
        assert_eq!(options.labels_path, None);
    }

    #[test]
    fn test_option_without_value_is_reported() {
        for flag in ["--rom", "--config", "--labels", "--asm"] {
            assert_eq!(
                parse_options(&args(&["0x14000", flag])),
                Err(format!("Missing value for {}", flag))
            );
        }
        assert_eq!(
            parse_options(&args(&["0x14000", "--rom", "--text"])),
            Err("Missing value for --rom".to_string())
        );
    }

    #[test]
    fn test_bad_arguments_are_reported() {
        assert_eq!(
            parse_options(&args(&["0x14000", "--verbose"])),
            Err("Unknown option: --verbose".to_string())
        );
        assert_eq!(
            parse_options(&args(&["nowhere"])),
            Err("Invalid address: nowhere".to_string())
        );
        assert_eq!(parse_options(&[]), Err("Missing address".to_string()));
    }
}
