//! Grammar-authoring error taxonomy.
//!
//! Every error here is a defect in the grammar being compiled, discovered
//! once per generation run. Nothing is retried or recovered; the builder
//! either returns a complete table or one or more of these errors.

use std::fmt;

use thiserror::Error;

use crate::expansion::BitVector;

/// A single grammar defect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    /// A symbol references a pattern that is not registered.
    #[error("'{referenced_by}' references unknown pattern '{name}'")]
    UnknownPattern {
        /// Template mnemonic or pattern name containing the reference.
        referenced_by: String,
        /// The missing pattern name.
        name: String,
    },
    /// Pattern expansion revisits a pattern on its own ancestry.
    #[error("cyclic pattern reference: {}", .path.join(" -> "))]
    CyclicPattern {
        /// The cycle, with the repeated pattern name at both ends.
        path: Vec<String>,
    },
    /// Two templates were registered under one mnemonic.
    #[error("duplicate mnemonic '{mnemonic}'")]
    DuplicateMnemonic {
        /// The re-used mnemonic.
        mnemonic: String,
    },
    /// Two patterns were registered under one name.
    #[error("duplicate pattern '{name}'")]
    DuplicatePattern {
        /// The re-used pattern name.
        name: String,
    },
    /// A pattern was registered without any alternatives.
    #[error("pattern '{name}' has no alternatives")]
    EmptyPattern {
        /// The empty pattern's name.
        name: String,
    },
    /// A fully resolved vector is not exactly one instruction word wide.
    #[error(
        "encoding for '{mnemonic}' resolves to {} bits ({vector}), expected 16",
        .vector.len()
    )]
    MalformedEncoding {
        /// Template mnemonic that produced the vector.
        mnemonic: String,
        /// The offending literal-only vector.
        vector: BitVector,
    },
    /// Two distinct mnemonics resolve to the same instruction word.
    #[error(
        "opcode '{second}' as bit pattern {bit_string} (0x{slot:04X}) collides with opcode '{first}'"
    )]
    SlotCollision {
        /// Mnemonic that already owns the slot.
        first: String,
        /// Mnemonic that tried to claim it.
        second: String,
        /// The contested slot index.
        slot: u16,
        /// The contested word as a 16-character binary string.
        bit_string: String,
    },
}

impl GrammarError {
    /// Formats the error for stderr output.
    #[must_use]
    pub fn format_for_stderr(&self) -> String {
        format!("error: {self}")
    }
}

/// A non-empty set of grammar errors from one build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorCollection {
    errors: Vec<GrammarError>,
}

impl ErrorCollection {
    /// Creates an empty error collection.
    #[must_use]
    pub const fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Adds an error to the collection.
    pub fn push(&mut self, error: GrammarError) {
        self.errors.push(error);
    }

    /// Returns true if the collection is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of errors.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns an iterator over the errors.
    pub fn iter(&self) -> impl Iterator<Item = &GrammarError> {
        self.errors.iter()
    }

    /// Returns the first error, if any.
    #[must_use]
    pub fn first(&self) -> Option<&GrammarError> {
        self.errors.first()
    }

    /// Converts into a single error if there is exactly one.
    #[must_use]
    pub fn into_single(self) -> Option<GrammarError> {
        if self.errors.len() == 1 {
            self.errors.into_iter().next()
        } else {
            None
        }
    }

    /// Formats all errors for stderr output, one per line.
    #[must_use]
    pub fn format_for_stderr(&self) -> String {
        self.errors
            .iter()
            .map(GrammarError::format_for_stderr)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<GrammarError> for ErrorCollection {
    fn from(error: GrammarError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl fmt::Display for ErrorCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorCollection {}

impl FromIterator<GrammarError> for ErrorCollection {
    fn from_iter<T: IntoIterator<Item = GrammarError>>(iter: T) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ErrorCollection {
    type Item = GrammarError;
    type IntoIter = std::vec::IntoIter<GrammarError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorCollection, GrammarError};

    #[test]
    fn cycle_path_renders_with_arrows() {
        let error = GrammarError::CyclicPattern {
            path: vec!["EA".into(), "Xn".into(), "EA".into()],
        };
        assert_eq!(error.to_string(), "cyclic pattern reference: EA -> Xn -> EA");
    }

    #[test]
    fn collision_names_both_mnemonics_and_bits() {
        let error = GrammarError::SlotCollision {
            first: "RTM".into(),
            second: "CALLM".into(),
            slot: 0x06C0,
            bit_string: "0000011011000000".into(),
        };
        let message = error.to_string();
        assert!(message.contains("'RTM'"));
        assert!(message.contains("'CALLM'"));
        assert!(message.contains("0000011011000000"));
        assert!(message.contains("0x06C0"));
    }

    #[test]
    fn stderr_format_prefixes_error() {
        let error = GrammarError::DuplicateMnemonic {
            mnemonic: "ORI".into(),
        };
        assert_eq!(error.format_for_stderr(), "error: duplicate mnemonic 'ORI'");
    }

    #[test]
    fn collection_joins_errors_by_line() {
        let errors: ErrorCollection = [
            GrammarError::EmptyPattern { name: "S".into() },
            GrammarError::DuplicatePattern { name: "EA".into() },
        ]
        .into_iter()
        .collect();

        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.format_for_stderr(),
            "error: pattern 'S' has no alternatives\nerror: duplicate pattern 'EA'"
        );
        assert!(errors.clone().into_single().is_none());
    }

    #[test]
    fn single_error_collection_unwraps() {
        let errors = ErrorCollection::from(GrammarError::EmptyPattern { name: "b".into() });
        assert_eq!(
            errors.into_single(),
            Some(GrammarError::EmptyPattern { name: "b".into() })
        );
    }
}
