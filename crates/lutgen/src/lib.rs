//! Decode-table generator command-line library.

use tracing_subscriber as _;

/// The `generate` operation and output formats.
pub mod generate;
/// Grammar source selection and JSON grammar loading.
pub mod source;
