//! Grammar source selection and JSON grammar loading.
//!
//! A grammar file holds the pattern list and the template list:
//!
//! ```json
//! {
//!   "patterns":  [{ "name": "S", "alternatives": [[0, 0], [0, 1], [1, 0]] }],
//!   "templates": [{ "mnemonic": "OP", "symbols": [0, 0, 0, 0, "S", 1, 1, 1, 1, 1, 1, 1, 1, 0, 0] }]
//! }
//! ```
//!
//! Symbols are `0`, `1`, or a pattern name. Duplicate pattern names and
//! duplicate mnemonics are load errors.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use lutgen_core::{m68k, Grammar, GrammarError};
use thiserror::Error;

/// Where the grammar comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GrammarSource {
    /// The built-in 68000-family grammar.
    #[default]
    Builtin,
    /// A JSON grammar file.
    File(PathBuf),
}

/// Failure to obtain a grammar.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The grammar file could not be read.
    #[error("{}: {source}", .path.display())]
    Io {
        /// Grammar file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The grammar file is not a valid grammar.
    #[error("{}: invalid grammar: {source}", .path.display())]
    Parse {
        /// Grammar file path.
        path: PathBuf,
        /// Underlying JSON or grammar error.
        source: serde_json::Error,
    },
    /// The built-in grammar tables are inconsistent.
    #[error("built-in grammar: {0}")]
    Builtin(#[from] GrammarError),
}

impl GrammarSource {
    /// Loads the grammar.
    ///
    /// # Errors
    ///
    /// Returns a `LoadError` if the file cannot be read or parsed.
    pub fn load(&self) -> Result<Grammar, LoadError> {
        match self {
            Self::Builtin => Ok(m68k::grammar()?),
            Self::File(path) => load_file(path),
        }
    }

    /// Short description for logs.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Builtin => "built-in m68k".to_string(),
            Self::File(path) => path.display().to_string(),
        }
    }
}

fn load_file(path: &Path) -> Result<Grammar, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_grammar(&text).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses a JSON grammar document.
///
/// # Errors
///
/// Returns the JSON error, which also carries duplicate-name and
/// bad-literal grammar errors.
pub fn parse_grammar(text: &str) -> Result<Grammar, serde_json::Error> {
    serde_json::from_str(text)
}
