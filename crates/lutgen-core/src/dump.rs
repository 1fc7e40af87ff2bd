//! Textual dump of a decode table.
//!
//! One line per occupied slot, ascending by word, tab-separated:
//!
//! ```text
//! 0000000000111100	0x003C	60	ORI to CCR
//! ```
//!
//! Columns are the 16-character binary word, its hexadecimal value, its
//! decimal value, and the owning mnemonic. Mnemonics may contain spaces,
//! never tabs.

use std::io;

use crate::table::DecodeTable;

/// Formats one listing line without a trailing newline.
#[must_use]
pub fn format_slot(word: u16, mnemonic: &str) -> String {
    format!("{word:016b}\t0x{word:04X}\t{word}\t{mnemonic}")
}

/// Writes the listing for every occupied slot.
///
/// # Errors
///
/// Propagates writer failures.
pub fn write_listing<W: io::Write>(table: &DecodeTable, writer: &mut W) -> io::Result<()> {
    for (word, mnemonic) in table.occupied() {
        writeln!(writer, "{}", format_slot(word, mnemonic))?;
    }
    Ok(())
}

/// Renders the listing into a string.
#[must_use]
pub fn render_listing(table: &DecodeTable) -> String {
    table
        .occupied()
        .map(|(word, mnemonic)| {
            let mut line = format_slot(word, mnemonic);
            line.push('\n');
            line
        })
        .collect()
}
