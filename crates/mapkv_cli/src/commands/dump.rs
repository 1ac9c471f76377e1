//! Dump command implementation.

use mapkv_region::read_whole_file;
use std::path::Path;

/// Bytes per hex dump line.
const LINE_WIDTH: usize = 16;

/// Runs the dump command.
pub fn run(path: &Path, offset: usize, limit: usize) -> Result<(), Box<dyn std::error::Error>> {
    print!("{}", dump(path, offset, limit)?);
    Ok(())
}

/// Renders the hex dump of `limit` bytes from `offset`, followed by a
/// size summary.
pub fn dump(
    path: &Path,
    offset: usize,
    limit: usize,
) -> Result<String, Box<dyn std::error::Error>> {
    let content = read_whole_file(path)?;

    if offset > content.len() {
        let len = content.len();
        return Err(format!("offset {offset} is past the end of the file ({len} bytes)").into());
    }

    let end = offset.saturating_add(limit).min(content.len());
    let mut out = hex_dump(&content[offset..end], offset);

    let zeros = content.iter().rev().take_while(|&&b| b == 0).count();
    out.push('\n');
    out.push_str(&format!("{} bytes total, {zeros} trailing zero bytes\n", content.len()));

    Ok(out)
}

/// Formats `bytes` as a hex dump whose addresses start at `base`.
pub fn hex_dump(bytes: &[u8], base: usize) -> String {
    let mut out = String::new();

    for (i, line) in bytes.chunks(LINE_WIDTH).enumerate() {
        out.push_str(&format!("{:08x}  ", base + i * LINE_WIDTH));
        for col in 0..LINE_WIDTH {
            match line.get(col) {
                Some(b) => out.push_str(&format!("{b:02x} ")),
                None => out.push_str("   "),
            }
        }
        out.push(' ');
        for &b in line {
            out.push(if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            });
        }
        out.push('\n');
    }

    out
}
