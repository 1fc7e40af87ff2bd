//! Decode-table generator core.
//!
//! Turns a grammar of named bit-field patterns and per-mnemonic 16-bit
//! templates into a validated table mapping every instruction word to the
//! mnemonic it decodes as.

/// Grammar data model, pattern registry, and template table.
#[macro_use]
pub mod grammar;
pub use grammar::{Bit, Grammar, Pattern, PatternRegistry, Symbol, Template, TemplateTable};

/// Grammar-authoring error taxonomy.
pub mod error;
pub use error::{ErrorCollection, GrammarError};

/// Recursive pattern expansion into literal bit vectors.
pub mod expansion;
pub use expansion::{BitVector, Expander, WORD_BITS};

/// The 65536-slot decode table.
pub mod table;
pub use table::{DecodeTable, SLOT_COUNT};

/// Validation, expansion, and merge into a decode table.
pub mod builder;
pub use builder::{build, build_with_config, BuildConfig};

/// Line-per-slot textual dump.
pub mod dump;
pub use dump::{format_slot, render_listing, write_listing};

/// Built-in 68000-family grammar.
pub mod m68k;

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
#[cfg(test)]
use serde_json as _;
