// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Error types, diagnostics, and reporting for the emitter pipeline.
//!
//! Every failure aborts the current compilation unit: errors here are
//! deterministic functions of the input and the static registration tables,
//! so there is no retry policy and no partial output.

use std::fmt;

/// Categories of emitter errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitErrorKind {
    /// Unrecognized character sequence; carries line and column.
    Lex,
    /// No registered signature matched the tokenized line.
    Pattern,
    /// Deterministic tie-break invariant violated (duplicate signatures).
    Ambiguous,
    /// Address/size fixed point not reached within the pass ceiling.
    Layout,
    /// A concrete element kind omits required size/encoding logic.
    Element,
    Io,
    Cli,
}

/// An emitter error with a kind and pre-formatted message.
#[derive(Debug, Clone)]
pub struct EmitError {
    kind: EmitErrorKind,
    message: String,
}

impl EmitError {
    pub fn new(kind: EmitErrorKind, msg: &str, param: Option<&str>) -> Self {
        let message = match param {
            Some(param) => format!("{msg}: {param}"),
            None => msg.to_string(),
        };
        Self { kind, message }
    }

    pub fn lex(line: u32, column: usize, found: &str) -> Self {
        Self::new(
            EmitErrorKind::Lex,
            &format!("Unrecognized character sequence at line {line}, column {column}"),
            Some(found),
        )
    }

    pub fn unmatched_pattern(line: u32, raw: &str) -> Self {
        Self::new(
            EmitErrorKind::Pattern,
            &format!("No emitter pattern matches line {line}"),
            Some(raw),
        )
    }

    pub fn ambiguous_pattern(detail: &str) -> Self {
        Self::new(
            EmitErrorKind::Ambiguous,
            "Ambiguous emitter pattern registration",
            Some(detail),
        )
    }

    pub fn non_convergent_layout(passes: u32) -> Self {
        Self::new(
            EmitErrorKind::Layout,
            &format!("Address layout did not converge within {passes} passes (cyclic size dependency)"),
            None,
        )
    }

    pub fn unimplemented_element(kind: &str, method: &str) -> Self {
        Self::new(
            EmitErrorKind::Element,
            &format!("Element kind '{kind}' does not implement {method}"),
            None,
        )
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> EmitErrorKind {
        self.kind
    }
}

impl fmt::Display for EmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for EmitError {}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A diagnostic message with location and source context.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    line: u32,
    column: Option<usize>,
    severity: Severity,
    error: EmitError,
    source: Option<String>,
}

impl Diagnostic {
    pub fn new(line: u32, severity: Severity, error: EmitError) -> Self {
        Self {
            line,
            column: None,
            severity,
            error,
            source: None,
        }
    }

    pub fn with_column(mut self, column: Option<usize>) -> Self {
        self.column = column;
        self
    }

    pub fn with_source(mut self, source: Option<String>) -> Self {
        self.source = source;
        self
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> Option<usize> {
        self.column
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        self.error.message()
    }

    pub fn kind(&self) -> EmitErrorKind {
        self.error.kind()
    }

    pub fn format_with_context(&self) -> String {
        let sev = match self.severity {
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        };
        let mut out = String::new();
        for line in build_context_lines(self.line, self.column, self.source.as_deref()) {
            out.push_str(&line);
            out.push('\n');
        }
        out.push_str(&format!("{sev}: {}", self.error.message()));
        out
    }
}

/// Render the offending source line with a caret under the error column.
pub fn build_context_lines(line: u32, column: Option<usize>, source: Option<&str>) -> Vec<String> {
    let mut out = Vec::new();
    let Some(source) = source else {
        return out;
    };
    out.push(format!("{line:>5} | {source}"));
    if let Some(col) = column {
        let pad = " ".repeat(col.saturating_sub(1));
        out.push(format!("      | {pad}^"));
    }
    out
}

/// Terminal error for a compilation unit: the root cause plus the
/// diagnostics accumulated before the abort.
#[derive(Debug)]
pub struct RunError {
    error: EmitError,
    diagnostics: Vec<Diagnostic>,
}

impl RunError {
    pub fn new(error: EmitError, diagnostics: Vec<Diagnostic>) -> Self {
        Self { error, diagnostics }
    }

    pub fn error(&self) -> &EmitError {
        &self.error
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for RunError {}

impl From<EmitError> for RunError {
    fn from(error: EmitError) -> Self {
        Self::new(error, Vec::new())
    }
}

impl From<std::io::Error> for EmitError {
    fn from(err: std::io::Error) -> Self {
        Self::new(EmitErrorKind::Io, &err.to_string(), None)
    }
}
