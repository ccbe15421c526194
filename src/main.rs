// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// CLI entrypoint for emitForge.

use std::io::{self, Write};

use clap::Parser;
use serde_json::json;

use emitforge::cli::{validate_cli, Cli, OutputFormat};
use emitforge::core::error::{Diagnostic, Severity};

fn severity_to_str(severity: Severity) -> &'static str {
    match severity {
        Severity::Warning => "warning",
        Severity::Error => "error",
    }
}

fn format_diagnostic_line(diag: &Diagnostic, format: OutputFormat) -> String {
    if format == OutputFormat::Json {
        json!({
            "severity": severity_to_str(diag.severity()),
            "message": diag.message(),
            "line": diag.line(),
            "col_start": diag.column(),
        })
        .to_string()
    } else {
        diag.format_with_context()
    }
}

fn main() {
    let cli = Cli::parse();
    let config = match validate_cli(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    match emitforge::run_with_config(&config) {
        Ok(summary) => {
            if !config.quiet {
                let _ = writeln!(
                    io::stderr(),
                    "emitforge: {} lines, {} elements, {} bytes",
                    summary.lines,
                    summary.elements,
                    summary.bytes
                );
            }
        }
        Err(err) => {
            for diag in err.diagnostics() {
                eprintln!("{}", format_diagnostic_line(diag, config.output_format));
            }
            if config.output_format != OutputFormat::Json {
                eprintln!("{err}");
            }
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emitforge::core::error::{Diagnostic, EmitError, Severity};

    #[test]
    fn format_diagnostic_line_json_has_expected_keys_with_nulls() {
        let diag = Diagnostic::new(7, Severity::Error, EmitError::unmatched_pattern(7, "???"));
        let line = format_diagnostic_line(&diag, OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&line).expect("valid json");
        assert_eq!(value["severity"], "error");
        assert_eq!(value["line"], 7);
        assert!(value["message"].as_str().expect("message").contains("???"));
        assert!(value["col_start"].is_null());
    }

    #[test]
    fn format_diagnostic_line_text_includes_severity_header() {
        let diag = Diagnostic::new(2, Severity::Error, EmitError::unmatched_pattern(2, "???"))
            .with_source(Some("???".to_string()));
        let line = format_diagnostic_line(&diag, OutputFormat::Text);
        assert!(line.contains("ERROR:"));
        assert!(line.contains("???"));
    }
}
