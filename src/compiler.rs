// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Line-oriented compilation driver.
//!
//! Reads source lines in order, tokenizes and dispatches each one, streams
//! the text channel as it goes, and accumulates layout elements. `finish`
//! then resolves addresses and produces the binary channel. The first error
//! aborts the unit; nothing is emitted past it.

use std::io::{BufRead, Write};

use crate::core::error::{Diagnostic, EmitError, RunError, Severity};
use crate::core::tokenizer::tokenize;
use crate::emit::registry::{Emit, EmitContext};
use crate::layout::engine::Assembler;

/// Converged results of one compilation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileResult {
    /// Final per-element text lines, post-resolution.
    pub element_text: String,
    /// The binary channel: every element's encoding, in program order.
    pub binary: Vec<u8>,
    /// `(element index, resolved start address)` in program order.
    pub address_map: Vec<(usize, u64)>,
}

pub struct Compiler<'a, W: Write> {
    ctx: &'a EmitContext,
    out: W,
    asm: Assembler,
    line_no: u32,
    /// When false, user comments produce an empty output line instead of
    /// their `;` rendering, keeping the line mapping intact.
    pub emit_user_comments: bool,
}

impl<'a, W: Write> Compiler<'a, W> {
    pub fn new(ctx: &'a EmitContext, out: W) -> Self {
        Self {
            ctx,
            out,
            asm: Assembler::new(),
            line_no: 0,
            emit_user_comments: true,
        }
    }

    pub fn line_count(&self) -> u32 {
        self.line_no
    }

    pub fn element_count(&self) -> usize {
        self.asm.len()
    }

    /// Feed every line of `input` through the pipeline.
    pub fn compile<R: BufRead>(&mut self, input: R) -> Result<(), RunError> {
        for line in input.lines() {
            let line = line.map_err(EmitError::from)?;
            self.emit_line(&line)?;
        }
        Ok(())
    }

    /// Process one source line: capture indentation, tokenize, dispatch,
    /// and route the result. Line numbers count from 1.
    pub fn emit_line(&mut self, raw: &str) -> Result<(), RunError> {
        self.line_no += 1;

        if raw.trim().is_empty() {
            // Whitespace-only lines pass through untouched.
            writeln!(self.out, "{raw}").map_err(EmitError::from)?;
            return Ok(());
        }

        let indent_len = raw.len() - raw.trim_start().len();
        let indent = &raw[..indent_len];

        let tokens = tokenize(raw, self.line_no).map_err(|err| self.fail(err, raw))?;
        let emit = self
            .ctx
            .registry
            .dispatch(&tokens, self.line_no, raw.trim(), self.ctx)
            .map_err(|err| self.fail(err, raw))?;

        match emit {
            Emit::Text(text) => {
                writeln!(self.out, "{indent}{text}").map_err(EmitError::from)?;
            }
            Emit::Comment(text) => {
                if self.emit_user_comments {
                    writeln!(self.out, "{indent}{text}").map_err(EmitError::from)?;
                } else {
                    writeln!(self.out).map_err(EmitError::from)?;
                }
            }
            Emit::Element(element) => {
                let mut rendered = Vec::new();
                element
                    .write_text(&mut rendered)
                    .map_err(EmitError::from)?;
                let text = String::from_utf8_lossy(&rendered);
                writeln!(self.out, "{indent}{text}").map_err(EmitError::from)?;
                self.asm.add(element);
            }
        }
        Ok(())
    }

    /// Resolve the accumulated elements from `base` and emit the binary
    /// channel. Consumes the compiler; the unit is done either way.
    pub fn finish(mut self, base: u64) -> Result<CompileResult, RunError> {
        self.asm.resolve(base)?;

        let mut element_text = Vec::new();
        let mut binary = Vec::new();
        let address_map = self.asm.emit(&mut element_text, &mut binary)?;

        Ok(CompileResult {
            element_text: String::from_utf8_lossy(&element_text).into_owned(),
            binary,
            address_map,
        })
    }

    fn fail(&self, err: EmitError, raw: &str) -> RunError {
        let diagnostic = Diagnostic::new(self.line_no, Severity::Error, err.clone())
            .with_source(Some(raw.to_string()));
        RunError::new(err, vec![diagnostic])
    }
}
