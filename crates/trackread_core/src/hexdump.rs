//! Hex/ASCII rendering of a single block.
//!
//! Layout, per 16-byte row:
//!
//! ```text
//! 0000  44 4f 53 00 c0 20 0f 19 00 00 03 70 00 00 00 00  DOS.. .....p....
//! 0010: 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00  ................
//! ```
//!
//! The first label is followed by two spaces, later ones by a colon. A short
//! last row is padded with blanks so the ASCII gutter stays in its column.

use std::fmt::{self, Write};

pub const BYTES_PER_LINE: usize = 16;

/// Whether `byte` is shown as itself in the ASCII gutter.
#[inline]
pub const fn is_printable(byte: u8) -> bool {
    matches!(byte, 0x20..=0x7e)
}

#[inline]
fn gutter_char(byte: u8) -> char {
    if is_printable(byte) { byte as char } else { '.' }
}

/// Writes the hexdump of `block` into `out`. Writes nothing for an empty block.
pub fn write_hexdump<W: Write + ?Sized>(out: &mut W, block: &[u8]) -> fmt::Result {
    if block.is_empty() {
        return Ok(());
    }

    let mut offset = 0usize;
    write!(out, "{offset:04x}  ")?;

    let mut rows = block.chunks(BYTES_PER_LINE).peekable();
    while let Some(row) = rows.next() {
        for byte in row {
            write!(out, "{byte:02x} ")?;
        }
        for _ in row.len()..BYTES_PER_LINE {
            out.write_str("   ")?;
        }
        out.write_char(' ')?;
        for &byte in row {
            out.write_char(gutter_char(byte))?;
        }
        out.write_char('\n')?;

        if rows.peek().is_some() {
            offset += BYTES_PER_LINE;
            write!(out, "{offset:04x}: ")?;
        }
    }
    Ok(())
}

/// Renders `block` to a fresh string.
pub fn render(block: &[u8]) -> String {
    let rows = block.len().div_ceil(BYTES_PER_LINE);
    let mut out = String::with_capacity(rows * (6 + BYTES_PER_LINE * 4 + 2));
    let _ = write_hexdump(&mut out, block);
    out
}
