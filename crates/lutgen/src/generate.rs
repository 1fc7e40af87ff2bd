//! The `generate` operation: load a grammar, build the decode table, and
//! render it in the requested output format.

use std::fmt;
use std::str::FromStr;

use lutgen_core::{render_listing, BuildConfig, DecodeTable, ErrorCollection};
use thiserror::Error;

use crate::source::{GrammarSource, LoadError};

/// Rendered output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One `<binary>\t0x<hex>\t<decimal>\t<mnemonic>` line per occupied slot.
    #[default]
    Listing,
    /// A JSON array of 65536 entries, each a mnemonic or `null`.
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "listing" => Ok(Self::Listing),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown format: {other} (expected listing or json)")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Listing => f.write_str("listing"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Failure of a `generate` run.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The grammar could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),
    /// The grammar failed validation or produced collisions.
    #[error(transparent)]
    Grammar(#[from] ErrorCollection),
    /// The table could not be serialized.
    #[error("failed to serialize table: {0}")]
    Json(#[from] serde_json::Error),
}

impl GenerateError {
    /// Formats the error for stderr, one `error:` line per problem.
    #[must_use]
    pub fn format_for_stderr(&self) -> String {
        match self {
            Self::Grammar(errors) => errors.format_for_stderr(),
            other => format!("error: {other}"),
        }
    }
}

/// Loads the grammar, builds the table, and renders it completely.
///
/// Nothing is returned on failure, so callers never emit a partial table.
///
/// # Errors
///
/// Returns a `GenerateError` for load, grammar, or serialization failures.
pub fn generate(
    source: &GrammarSource,
    format: OutputFormat,
    config: &BuildConfig,
) -> Result<String, GenerateError> {
    let grammar = source.load()?;
    tracing::info!(
        source = %source.describe(),
        patterns = grammar.patterns.len(),
        templates = grammar.templates.len(),
        "grammar loaded"
    );

    let table = grammar.build_table(config)?;
    tracing::info!(
        occupied = table.occupied_count(),
        format = %format,
        "decode table built"
    );

    render(&table, format)
}

/// Renders a built table.
///
/// # Errors
///
/// Returns `GenerateError::Json` if JSON serialization fails.
pub fn render(table: &DecodeTable, format: OutputFormat) -> Result<String, GenerateError> {
    match format {
        OutputFormat::Listing => Ok(render_listing(table)),
        OutputFormat::Json => Ok(serde_json::to_string(table)?),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use lutgen_core::BuildConfig;

    use super::{generate, GenerateError, OutputFormat};
    use crate::source::GrammarSource;

    #[test]
    fn parses_output_formats() {
        assert_eq!("listing".parse::<OutputFormat>(), Ok(OutputFormat::Listing));
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("csv".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::default(), OutputFormat::Listing);
    }

    #[test]
    fn builtin_listing_has_one_line_per_slot() {
        let listing = generate(
            &GrammarSource::Builtin,
            OutputFormat::Listing,
            &BuildConfig::default(),
        )
        .expect("built-in grammar generates");

        assert_eq!(listing.lines().count(), 1677);
        assert!(listing.starts_with("0000000000000000\t0x0000\t0\tORI\n"));
    }

    #[test]
    fn builtin_json_has_every_slot() {
        let json = generate(
            &GrammarSource::Builtin,
            OutputFormat::Json,
            &BuildConfig::default(),
        )
        .expect("built-in grammar generates");
        let slots: Vec<Option<String>> = serde_json::from_str(&json).expect("json array");

        assert_eq!(slots.len(), 65536);
        assert_eq!(slots[0x003C].as_deref(), Some("ORI to CCR"));
        assert_eq!(slots[0x4E71], None);
    }

    #[test]
    fn collision_reports_both_mnemonics() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("clash.json");
        fs::write(
            &path,
            r#"{
                "patterns": [],
                "templates": [
                    { "mnemonic": "FIRST", "symbols": [0,0,0,0,0,0,0,0,0,0,1,1,1,1,0,0] },
                    { "mnemonic": "SECOND", "symbols": [0,0,0,0,0,0,0,0,0,0,1,1,1,1,0,0] }
                ]
            }"#,
        )
        .expect("write grammar");

        let error = generate(
            &GrammarSource::File(path),
            OutputFormat::Listing,
            &BuildConfig::default(),
        )
        .expect_err("slot collision");

        assert!(matches!(error, GenerateError::Grammar(_)));
        let message = error.format_for_stderr();
        assert!(message.starts_with("error: "));
        assert!(message.contains("FIRST"));
        assert!(message.contains("SECOND"));
        assert!(message.contains("0000000000111100"));
    }

    #[test]
    fn load_errors_are_prefixed() {
        let dir = tempfile::tempdir().expect("temp dir");
        let error = generate(
            &GrammarSource::File(dir.path().join("missing.json")),
            OutputFormat::Listing,
            &BuildConfig::default(),
        )
        .expect_err("missing file");

        assert!(matches!(error, GenerateError::Load(_)));
        assert!(error.format_for_stderr().starts_with("error: "));
    }
}
