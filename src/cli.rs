// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Command-line interface parsing and argument validation.

use std::env;
use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

use crate::core::error::{EmitError, EmitErrorKind, RunError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const LONG_ABOUT: &str = "Pattern-driven pseudo-assembly translator.

Each source line is tokenized and matched against the registered emitter
patterns; matching lines translate to assembly text and, for instruction
lines, to encoded bytes laid out from --base. The translated text goes to
stdout unless -o is given.";

#[derive(Parser, Debug)]
#[command(
    name = "emitforge",
    version = VERSION,
    about = "Pattern-driven pseudo-assembly translator with address layout",
    long_about = LONG_ABOUT
)]
pub struct Cli {
    #[arg(
        value_name = "INPUT",
        long_help = "Input source file. Use '-' to read from stdin."
    )]
    pub input: PathBuf,
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        long_help = "Write the translated text output to FILE instead of stdout. The file also gets a generated-output section with the encoded bytes."
    )]
    pub output: Option<PathBuf>,
    #[arg(
        short = 'b',
        long = "binary",
        value_name = "FILE",
        long_help = "Write the raw encoded bytes to FILE."
    )]
    pub binary: Option<PathBuf>,
    #[arg(
        long = "map",
        value_name = "FILE",
        long_help = "Write the element address map to FILE as JSON."
    )]
    pub map: Option<PathBuf>,
    #[arg(
        long = "base",
        value_name = "ADDR",
        long_help = "Base address for layout (decimal, 0x hex, or $ hex). Defaults to 0."
    )]
    pub base: Option<String>,
    #[arg(
        long = "format",
        value_enum,
        default_value_t = OutputFormat::Text,
        long_help = "Select diagnostic output format. text is default; json emits machine-readable diagnostic lines."
    )]
    pub format: OutputFormat,
    #[arg(
        short = 'q',
        long = "quiet",
        action = ArgAction::SetTrue,
        long_help = "Suppress the summary line for successful runs. Errors are still reported."
    )]
    pub quiet: bool,
    #[arg(
        long = "no-comments",
        action = ArgAction::SetTrue,
        long_help = "Drop user comments from the translated output. Output line numbering is preserved."
    )]
    pub no_comments: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Validated CLI configuration.
#[derive(Debug)]
pub struct CliConfig {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub binary: Option<PathBuf>,
    pub map: Option<PathBuf>,
    pub base: u64,
    pub output_format: OutputFormat,
    pub quiet: bool,
    pub emit_user_comments: bool,
}

fn cli_error(message: impl Into<String>) -> RunError {
    RunError::new(
        EmitError::new(EmitErrorKind::Cli, &message.into(), None),
        Vec::new(),
    )
}

/// Parse an address argument: decimal, `0x` hex, or `$` hex.
pub fn parse_address(text: &str) -> Result<u64, RunError> {
    let text = text.trim();
    let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else if let Some(hex) = text.strip_prefix('$') {
        u64::from_str_radix(hex, 16)
    } else {
        text.parse::<u64>()
    };
    parsed.map_err(|_| cli_error(format!("Invalid address value: {text}")))
}

fn parse_env_bool(var_name: &str) -> Result<Option<bool>, RunError> {
    let Some(raw) = env::var_os(var_name) else {
        return Ok(None);
    };
    let value = raw.to_string_lossy().trim().to_ascii_lowercase();
    let parsed = match value.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        "" => None,
        _ => {
            return Err(cli_error(format!(
                "Invalid boolean value for {var_name}: {value}"
            )))
        }
    };
    Ok(parsed)
}

fn parse_env_string(var_name: &str) -> Result<Option<String>, RunError> {
    let Some(raw) = env::var_os(var_name) else {
        return Ok(None);
    };
    let value = raw.to_string_lossy().trim().to_string();
    if value.is_empty() {
        return Ok(None);
    }
    Ok(Some(value))
}

/// Validate CLI arguments and return parsed configuration. Environment
/// defaults apply only where the command line leaves a value unset.
pub fn validate_cli(cli: &Cli) -> Result<CliConfig, RunError> {
    let env_base = parse_env_string("EMITFORGE_BASE")?;
    let env_quiet = parse_env_bool("EMITFORGE_QUIET")?;
    let env_no_comments = parse_env_bool("EMITFORGE_NO_COMMENTS")?;

    let base = match cli.base.as_deref().or(env_base.as_deref()) {
        Some(text) => parse_address(text)?,
        None => 0,
    };

    let effective_quiet = if cli.quiet {
        true
    } else {
        env_quiet.unwrap_or(false)
    };

    let effective_no_comments = if cli.no_comments {
        true
    } else {
        env_no_comments.unwrap_or(false)
    };

    Ok(CliConfig {
        input: cli.input.clone(),
        output: cli.output.clone(),
        binary: cli.binary.clone(),
        map: cli.map.clone(),
        base,
        output_format: cli.format,
        quiet: effective_quiet,
        emit_user_comments: !effective_no_comments,
    })
}
