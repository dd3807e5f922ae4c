//! Print the resolved layout of variable declaration files.
//!
//! Usage:
//!   netvar_layout [OPTIONS] [FILE ...]
//!   netvar_layout < variables.ini
//!
//! Options:
//!   --human, -H          Table output (number, byte, bit, size, type, name)
//!   --image=PATH         Decode each variable from a raw register image dump
//!   --endian=big|little  Byte order of the image (default: little)
//!
//! Exit status is 1 if any file fails to load or decode; the other files are still printed.

use netvar::dump::{format_descriptor_row, format_layout, format_layout_compact, format_value};
use netvar::{
    load_layout, AccessMode, Endianness, Layout, RegisterImage, RegisterTable, TableOptions,
};
use std::cell::RefCell;
use std::io::{self, Read};
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

#[derive(Clone, Copy)]
enum OutputStyle {
    Compact,
    Human,
}

fn take_flag(args: &mut Vec<String>, long: &str, short: &str) -> bool {
    if let Some(pos) = args.iter().position(|a| a == long || a == short) {
        args.remove(pos);
        true
    } else {
        false
    }
}

fn take_value(args: &mut Vec<String>, prefix: &str) -> Option<String> {
    let pos = args.iter().position(|a| a.starts_with(prefix))?;
    Some(args.remove(pos)[prefix.len()..].to_string())
}

fn print_values(
    name: &str,
    layout: &Layout,
    image: &[u8],
    endianness: Endianness,
    style: OutputStyle,
) -> anyhow::Result<()> {
    let options = TableOptions {
        delay: Duration::ZERO,
        endianness,
    };
    let port = Rc::new(RefCell::new(RegisterImage::from_bytes(image.to_vec())));
    let table = RegisterTable::from_layout(layout, port, AccessMode::ReadOnly, options)?;
    if let OutputStyle::Human = style {
        println!("{}:", name);
    }
    for (number, (d, reg)) in layout.iter().zip(table.iter()).enumerate() {
        let value = match reg.get() {
            Ok(v) => format_value(&v),
            Err(e) => format!("<{}>", e),
        };
        match style {
            OutputStyle::Compact => println!("{}:{}@{} = {}", name, d.name(), d.index(), value),
            OutputStyle::Human => println!("{}  = {}", format_descriptor_row(number, d), value),
        }
    }
    Ok(())
}

fn print_layout(name: &str, layout: &Layout, style: OutputStyle) {
    match style {
        OutputStyle::Compact => println!("{}: {}", name, format_layout_compact(layout)),
        OutputStyle::Human => {
            println!("{}:", name);
            print!("{}", format_layout(layout));
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let style = if take_flag(&mut args, "--human", "-H") {
        OutputStyle::Human
    } else {
        OutputStyle::Compact
    };
    let endianness = match take_value(&mut args, "--endian=").as_deref() {
        None | Some("little") => Endianness::Little,
        Some("big") => Endianness::Big,
        Some(other) => anyhow::bail!("--endian: expected big or little, got {:?}", other),
    };
    let image = match take_value(&mut args, "--image=") {
        Some(path) => Some(std::fs::read(&path).map_err(|e| anyhow::anyhow!("{}: {}", path, e))?),
        None => None,
    };

    let mut sources = Vec::new();
    if args.is_empty() {
        let mut src = String::new();
        io::stdin().read_to_string(&mut src)?;
        sources.push(("<stdin>".to_string(), Ok(src)));
    } else {
        for path in &args {
            let display = Path::new(path).display().to_string();
            sources.push((display, std::fs::read_to_string(path)));
        }
    }

    let mut has_error = false;
    for (name, src) in sources {
        let layout = match src.map_err(netvar::Error::from).and_then(|s| load_layout(&s)) {
            Ok(layout) => layout,
            Err(e) => {
                eprintln!("{}: {}", name, e);
                has_error = true;
                continue;
            }
        };
        match &image {
            Some(bytes) => {
                if let Err(e) = print_values(&name, &layout, bytes, endianness, style) {
                    eprintln!("{}: {}", name, e);
                    has_error = true;
                }
            }
            None => print_layout(&name, &layout, style),
        }
    }

    if has_error {
        std::process::exit(1);
    }
    Ok(())
}
