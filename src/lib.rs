// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! emitForge: pattern-driven pseudo-assembly translation with address
//! layout.
//!
//! Source lines are tokenized, matched against a registry of emitter
//! patterns, and translated to assembly text. Instruction lines additionally
//! become layout elements whose addresses and encodings are resolved by an
//! iterative fixed-point pass over the element sequence.

pub mod cli;
pub mod compiler;
pub mod core;
pub mod emit;
pub mod layout;

use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

use crate::cli::CliConfig;
use crate::compiler::Compiler;
use crate::core::error::{EmitError, RunError};
use crate::emit::rules::default_context;
use crate::layout::output::{write_address_map_json, write_generated_output};

/// Outcome of a successful run, for the summary line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub lines: u32,
    pub elements: usize,
    pub bytes: usize,
}

fn read_input(path: &Path) -> Result<String, EmitError> {
    if path.as_os_str() == "-" {
        let mut source = String::new();
        io::stdin().read_to_string(&mut source)?;
        return Ok(source);
    }
    let mut source = String::new();
    BufReader::new(File::open(path)?).read_to_string(&mut source)?;
    Ok(source)
}

/// Run one compilation unit per the validated CLI configuration: translate
/// the input, resolve layout, and route the requested outputs.
pub fn run_with_config(config: &CliConfig) -> Result<RunSummary, RunError> {
    let source = read_input(&config.input)?;
    let ctx = default_context()?;

    let mut translated = Vec::new();
    let mut compiler = Compiler::new(ctx, &mut translated);
    compiler.emit_user_comments = config.emit_user_comments;
    compiler.compile(source.as_bytes())?;
    let lines = compiler.line_count();
    let elements = compiler.element_count();
    let result = compiler.finish(config.base)?;

    match &config.output {
        Some(path) => {
            let mut file = File::create(path).map_err(EmitError::from)?;
            file.write_all(&translated).map_err(EmitError::from)?;
            write_generated_output(&mut file, config.base, &result.binary)
                .map_err(EmitError::from)?;
        }
        None => {
            io::stdout()
                .write_all(&translated)
                .map_err(EmitError::from)?;
        }
    }

    if let Some(path) = &config.binary {
        std::fs::write(path, &result.binary).map_err(EmitError::from)?;
    }

    if let Some(path) = &config.map {
        let mut file = File::create(path).map_err(EmitError::from)?;
        write_address_map_json(&mut file, &result.address_map).map_err(EmitError::from)?;
    }

    Ok(RunSummary {
        lines,
        elements,
        bytes: result.binary.len(),
    })
}
