//! CLI entry point for the lutgen decode-table generator.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use lutgen::generate::{generate, OutputFormat};
use lutgen::source::GrammarSource;
use lutgen_core::BuildConfig;
use serde_json as _;
#[cfg(test)]
use tempfile as _;
use thiserror as _;
use tracing_subscriber::EnvFilter;

const USAGE_TEXT: &str = "\
Usage: lutgen <command> [options]

Commands:
  generate  Build the decode table and print it

Options:
  -g, --grammar <file>   JSON grammar file (default: built-in m68k grammar)
  -f, --format <format>  Output format: listing or json (default: listing)
  -o, --output <file>    Write to a file instead of stdout
  -j, --jobs <n>         Worker threads for expansion (default: 1)
      --all-errors       Report every grammar error, not just the first
  -v, --verbose          Log build progress to stderr
  -h, --help             Show this help message

Examples:
  lutgen generate
  lutgen generate --format json -o table.json
  lutgen generate --grammar my-isa.json --all-errors
";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Generate(GenerateArgs),
}

#[derive(Debug, PartialEq, Eq)]
struct GenerateArgs {
    grammar: GrammarSource,
    format: OutputFormat,
    output: Option<PathBuf>,
    workers: usize,
    collect_all_errors: bool,
    verbose: bool,
}

impl Default for GenerateArgs {
    fn default() -> Self {
        Self {
            grammar: GrammarSource::Builtin,
            format: OutputFormat::Listing,
            output: None,
            workers: 1,
            collect_all_errors: false,
            verbose: false,
        }
    }
}

#[derive(Debug)]
enum ParseResult {
    Command(Command),
    Help,
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let first = args.next().ok_or_else(|| "missing command".to_string())?;

    if first == "--help" || first == "-h" {
        return Ok(ParseResult::Help);
    }

    let command_str = first.to_string_lossy().to_string();

    match command_str.as_str() {
        "generate" => parse_generate_args(args)
            .map(Command::Generate)
            .map(ParseResult::Command),
        other => Err(format!("unknown command: {other}")),
    }
}

fn option_value(
    args: &mut impl Iterator<Item = OsString>,
    flag: &OsString,
) -> Result<OsString, String> {
    args.next()
        .ok_or_else(|| format!("missing value for {}", flag.to_string_lossy()))
}

#[allow(clippy::while_let_on_iterator)]
fn parse_generate_args(mut args: impl Iterator<Item = OsString>) -> Result<GenerateArgs, String> {
    let mut parsed = GenerateArgs::default();

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }

        if arg == "--verbose" || arg == "-v" {
            parsed.verbose = true;
            continue;
        }

        if arg == "--all-errors" {
            parsed.collect_all_errors = true;
            continue;
        }

        if arg == "-g" || arg == "--grammar" {
            let value = option_value(&mut args, &arg)?;
            parsed.grammar = GrammarSource::File(PathBuf::from(value));
            continue;
        }

        if arg == "-f" || arg == "--format" {
            let value = option_value(&mut args, &arg)?;
            parsed.format = value.to_string_lossy().parse()?;
            continue;
        }

        if arg == "-o" || arg == "--output" {
            let value = option_value(&mut args, &arg)?;
            parsed.output = Some(PathBuf::from(value));
            continue;
        }

        if arg == "-j" || arg == "--jobs" {
            let value = option_value(&mut args, &arg)?;
            let value = value.to_string_lossy();
            parsed.workers = match value.parse::<usize>() {
                Ok(workers) if workers > 0 => workers,
                _ => return Err(format!("invalid job count: {value}")),
            };
            continue;
        }

        return Err(format!("unknown option: {}", arg.to_string_lossy()));
    }

    Ok(parsed)
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "lutgen=info,lutgen_core=debug"
    } else {
        "lutgen=warn,lutgen_core=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();
}

fn run_generate(args: GenerateArgs) -> Result<(), i32> {
    let config = BuildConfig {
        workers: args.workers,
        collect_all_errors: args.collect_all_errors,
    };

    let rendered = match generate(&args.grammar, args.format, &config) {
        Ok(rendered) => rendered,
        Err(e) => {
            eprintln!("{}", e.format_for_stderr());
            return Err(1);
        }
    };

    match args.output {
        Some(path) => {
            if let Err(e) = fs::write(&path, rendered) {
                eprintln!("error: failed to write {}: {e}", path.display());
                return Err(1);
            }
            tracing::info!(path = %path.display(), "table written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            if let Err(e) = stdout.write_all(rendered.as_bytes()).and_then(|()| stdout.flush()) {
                eprintln!("error: failed to write output: {e}");
                return Err(1);
            }
        }
    }

    Ok(())
}

fn main() {
    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Command(Command::Generate(args))) => {
            init_logging(args.verbose);
            match run_generate(args) {
                Ok(()) => 0,
                Err(code) => code,
            }
        }
        Err(error) => {
            if error.starts_with("Usage:") {
                println!("{error}");
            } else {
                eprintln!("error: {error}");
                eprintln!("{USAGE_TEXT}");
            }
            1
        }
    };

    std::process::exit(exit_code);
}
