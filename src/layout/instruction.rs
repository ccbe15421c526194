// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Concrete element kinds and the injected encoding table.
//!
//! The byte encodings here are data, not architecture: callers supply an
//! [`EncodingTable`] mapping symbolic register names to opcode material.
//! `x86_demo` ships a small x86-flavoured table used by the built-in rules
//! and the tests.

use std::collections::HashMap;
use std::io::Write;

use crate::core::error::EmitError;
use crate::layout::element::{resolve_mnemonic, Element, LayoutView};

/// Injected mapping from symbolic operand names to target byte encodings.
#[derive(Debug, Clone)]
pub struct EncodingTable {
    /// Register name → opcode byte for a move-immediate to that register.
    move_imm: HashMap<String, u8>,
    /// Register name → numeric register code for register-to-register moves.
    reg_codes: HashMap<String, u8>,
    /// Immediate width in bytes for move-immediate forms.
    imm_width: u32,
}

impl EncodingTable {
    pub fn new(
        move_imm: HashMap<String, u8>,
        reg_codes: HashMap<String, u8>,
        imm_width: u32,
    ) -> Self {
        Self {
            move_imm,
            reg_codes,
            imm_width,
        }
    }

    /// Sample table for the 32-bit x86 general registers (`mov r32, imm32`
    /// is `B8+rd`; `mov r32, r32` is `89 /r`).
    pub fn x86_demo() -> Self {
        let order = ["EAX", "ECX", "EDX", "EBX", "ESP", "EBP", "ESI", "EDI"];
        let mut move_imm = HashMap::new();
        let mut reg_codes = HashMap::new();
        for (code, name) in order.iter().enumerate() {
            move_imm.insert((*name).to_string(), 0xB8 + code as u8);
            reg_codes.insert((*name).to_string(), code as u8);
        }
        Self::new(move_imm, reg_codes, 4)
    }

    pub fn move_imm_opcode(&self, register: &str) -> Option<u8> {
        self.move_imm.get(register).copied()
    }

    pub fn register_code(&self, register: &str) -> Option<u8> {
        self.reg_codes.get(register).copied()
    }

    pub fn imm_width(&self) -> u32 {
        self.imm_width
    }
}

/// Move-immediate: fixed-size, address-independent encoding.
pub struct MoveImm {
    mnemonic: String,
    register: String,
    value: u64,
    opcode: u8,
    imm_width: u32,
}

impl MoveImm {
    pub fn new(
        register: &str,
        value: u64,
        encodings: &EncodingTable,
        mnemonic: Option<String>,
    ) -> Result<Self, EmitError> {
        let opcode = encodings.move_imm_opcode(register).ok_or_else(|| {
            EmitError::new(
                crate::core::error::EmitErrorKind::Element,
                "No move-immediate encoding for register",
                Some(register),
            )
        })?;
        Ok(Self {
            mnemonic: resolve_mnemonic("move-imm", mnemonic),
            register: register.to_string(),
            value,
            opcode,
            imm_width: encodings.imm_width(),
        })
    }
}

impl Element for MoveImm {
    fn kind(&self) -> &'static str {
        "move-imm"
    }

    fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    fn is_complete(&self, _assumed_address: u64) -> Result<bool, EmitError> {
        Ok(true)
    }

    fn size(&self) -> Result<u32, EmitError> {
        Ok(1 + self.imm_width)
    }

    fn write_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        write!(out, "{} {}, 0x{:X}", self.mnemonic, self.register, self.value)
    }

    fn write_data(&self, out: &mut dyn Write) -> Result<(), EmitError> {
        out.write_all(&[self.opcode])?;
        let bytes = self.value.to_le_bytes();
        out.write_all(&bytes[..self.imm_width as usize])?;
        Ok(())
    }
}

/// Register-to-register move: `opcode` + ModRM(11, src, dst).
pub struct MoveReg {
    mnemonic: String,
    dst: String,
    src: String,
    dst_code: u8,
    src_code: u8,
}

impl MoveReg {
    pub fn new(
        dst: &str,
        src: &str,
        encodings: &EncodingTable,
        mnemonic: Option<String>,
    ) -> Result<Self, EmitError> {
        let lookup = |name: &str| {
            encodings.register_code(name).ok_or_else(|| {
                EmitError::new(
                    crate::core::error::EmitErrorKind::Element,
                    "No register code for register",
                    Some(name),
                )
            })
        };
        Ok(Self {
            mnemonic: resolve_mnemonic("move-reg", mnemonic),
            dst: dst.to_string(),
            src: src.to_string(),
            dst_code: lookup(dst)?,
            src_code: lookup(src)?,
        })
    }
}

impl Element for MoveReg {
    fn kind(&self) -> &'static str {
        "move-reg"
    }

    fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    fn is_complete(&self, _assumed_address: u64) -> Result<bool, EmitError> {
        Ok(true)
    }

    fn size(&self) -> Result<u32, EmitError> {
        Ok(2)
    }

    fn write_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        write!(out, "{} {}, {}", self.mnemonic, self.dst, self.src)
    }

    fn write_data(&self, out: &mut dyn Write) -> Result<(), EmitError> {
        let modrm = 0xC0 | (self.src_code << 3) | self.dst_code;
        out.write_all(&[0x89, modrm])?;
        Ok(())
    }
}

const BRANCH_SHORT_SIZE: u32 = 2;
const BRANCH_LONG_SIZE: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BranchForm {
    Short,
    Long,
}

/// Relative branch whose encoded size depends on the distance to its
/// target element. Starts short and grows to long when the displacement
/// stops fitting in a signed byte; it never shrinks back, which keeps the
/// fixed point monotone for real inputs.
pub struct Branch {
    mnemonic: String,
    target: usize,
    form: BranchForm,
    displacement: i64,
}

impl Branch {
    /// `target` is the sequence index of the destination element.
    pub fn new(target: usize, mnemonic: Option<String>) -> Self {
        Self {
            mnemonic: resolve_mnemonic("branch", mnemonic),
            target,
            form: BranchForm::Short,
            displacement: 0,
        }
    }

    fn form_size(form: BranchForm) -> u32 {
        match form {
            BranchForm::Short => BRANCH_SHORT_SIZE,
            BranchForm::Long => BRANCH_LONG_SIZE,
        }
    }
}

impl Element for Branch {
    fn kind(&self) -> &'static str {
        "branch"
    }

    fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    fn is_complete(&self, assumed_address: u64) -> Result<bool, EmitError> {
        // Short form is only settled once the displacement is known to fit;
        // the long form always encodes.
        let _ = assumed_address;
        Ok(self.form == BranchForm::Long || fits_i8(self.displacement))
    }

    fn size(&self) -> Result<u32, EmitError> {
        Ok(Self::form_size(self.form))
    }

    fn relayout(&mut self, view: &LayoutView<'_>) -> Result<u32, EmitError> {
        let target_addr = view.address_of(self.target).ok_or_else(|| {
            EmitError::new(
                crate::core::error::EmitErrorKind::Layout,
                "Branch target index out of range",
                Some(&self.target.to_string()),
            )
        })?;
        let own = view.own_address();
        // Displacement is relative to the end of the short form.
        self.displacement = target_addr as i64 - (own as i64 + BRANCH_SHORT_SIZE as i64);
        if self.form == BranchForm::Short && !fits_i8(self.displacement) {
            self.form = BranchForm::Long;
        }
        if self.form == BranchForm::Long {
            self.displacement = target_addr as i64 - (own as i64 + BRANCH_LONG_SIZE as i64);
        }
        Ok(Self::form_size(self.form))
    }

    fn write_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        write!(out, "{} {:+}", self.mnemonic, self.displacement)
    }

    fn write_data(&self, out: &mut dyn Write) -> Result<(), EmitError> {
        match self.form {
            BranchForm::Short => {
                out.write_all(&[0xEB, self.displacement as i8 as u8])?;
            }
            BranchForm::Long => {
                out.write_all(&[0xE9])?;
                out.write_all(&(self.displacement as i32).to_le_bytes())?;
            }
        }
        Ok(())
    }
}

fn fits_i8(value: i64) -> bool {
    i8::try_from(value).is_ok()
}

/// Literal byte run; used for injected data and as a fixed-size landing
/// site for branches in tests.
pub struct RawBytes {
    mnemonic: String,
    bytes: Vec<u8>,
}

impl RawBytes {
    pub fn new(bytes: Vec<u8>, mnemonic: Option<String>) -> Self {
        Self {
            mnemonic: resolve_mnemonic("raw-bytes", mnemonic),
            bytes,
        }
    }
}

impl Element for RawBytes {
    fn kind(&self) -> &'static str {
        "raw-bytes"
    }

    fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    fn is_complete(&self, _assumed_address: u64) -> Result<bool, EmitError> {
        Ok(true)
    }

    fn size(&self) -> Result<u32, EmitError> {
        Ok(self.bytes.len() as u32)
    }

    fn write_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        let hex: Vec<String> = self.bytes.iter().map(|b| format!("0x{b:02X}")).collect();
        write!(out, "{} {}", self.mnemonic, hex.join(", "))
    }

    fn write_data(&self, out: &mut dyn Write) -> Result<(), EmitError> {
        out.write_all(&self.bytes)?;
        Ok(())
    }
}
