//! Disassembly listing loader.
//!
//! Parses the text output of `objdump -d -l` and loads one record per
//! instruction into a [`PCTable`]. Recognised line shapes:
//!
//! - `0000000000010000 <main>:` — function header; names the function for
//!   the instruction lines that follow
//! - `/path/to/file.c:12` — source location marker (from `-l`); applies to
//!   the instruction lines that follow
//! - `   10000:\t1141\tc.addi\tsp,sp,-16` — one instruction: address,
//!   raw encoding, mnemonic and operands
//!
//! Section headers, `file format` banners, `name():` markers, and anything
//! else are skipped, so a listing can be fed in whole. Duplicate addresses
//! overwrite, matching the load contract of the table.

use crate::error::{ProfileError, Result};
use crate::pctable::PCTable;

/// Parse an `objdump -d -l` listing and load it into `table`.
///
/// Returns the number of instruction records loaded.
pub fn load_disassembly(text: &str, table: &mut PCTable) -> Result<usize> {
    let mut func = String::new();
    let mut file = String::new();
    let mut line_no = 0u32;
    let mut loaded = 0usize;

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim_end();
        if line.is_empty() {
            continue;
        }

        if let Some(name) = parse_function_header(line) {
            func = name.to_owned();
            continue;
        }

        // `main():` markers repeat the enclosing function; the header
        // already named it.
        if !line.starts_with(char::is_whitespace) && line.ends_with("():") {
            continue;
        }

        if let Some((path, ln)) = parse_location(line) {
            file = path.to_owned();
            line_no = ln;
            continue;
        }

        if let Some(rest) = parse_instruction_prefix(line) {
            let (addr_text, body) = rest;
            let pc = u64::from_str_radix(addr_text, 16).map_err(|_| ProfileError::Disasm {
                line: idx + 1,
                msg: format!("bad instruction address `{}`", addr_text),
            })?;
            let asm = extract_mnemonic(body);
            table.load(pc, &func, &asm, &file, line_no);
            loaded += 1;
        }
    }
    Ok(loaded)
}

/// `0000000000010000 <main>:` → `main`
fn parse_function_header(line: &str) -> Option<&str> {
    if line.starts_with(char::is_whitespace) || !line.ends_with(":") {
        return None;
    }
    let (addr, rest) = line.split_once(" <")?;
    if addr.is_empty() || !addr.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    rest.strip_suffix(">:")
}

/// `/path/file.c:12` or `file.c:12 (discriminator 3)` → (`file.c`, 12)
fn parse_location(line: &str) -> Option<(&str, u32)> {
    if line.starts_with(char::is_whitespace) {
        return None;
    }
    let line = line.split(" (discriminator").next().unwrap_or(line);
    let (path, number) = line.rsplit_once(':')?;
    if path.is_empty() {
        return None;
    }
    let ln = number.trim().parse::<u32>().ok()?;
    Some((path, ln))
}

/// `   10000:<rest>` → (`10000`, `<rest>`) for indented instruction lines.
fn parse_instruction_prefix(line: &str) -> Option<(&str, &str)> {
    if !line.starts_with(char::is_whitespace) {
        return None;
    }
    let trimmed = line.trim_start();
    let (addr, rest) = trimmed.split_once(':')?;
    if addr.is_empty() || !addr.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    Some((addr, rest))
}

/// Strip the raw-encoding column and normalise the mnemonic text.
fn extract_mnemonic(body: &str) -> String {
    // objdump separates address, encoding, and mnemonic with tabs
    let fields: Vec<&str> = body.split('\t').filter(|f| !f.trim().is_empty()).collect();
    let tokens: Vec<&str> = if fields.len() >= 2 {
        fields[1..].iter().flat_map(|f| f.split_whitespace()).collect()
    } else {
        // Tab structure lost: drop leading tokens that look like raw
        // encodings (exactly 4 or 8 hex digits)
        body.split_whitespace()
            .skip_while(|tok| {
                (tok.len() == 4 || tok.len() == 8) && tok.bytes().all(|b| b.is_ascii_hexdigit())
            })
            .collect()
    };
    tokens.join(" ")
}
