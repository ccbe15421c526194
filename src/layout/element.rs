// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Abstract assembler element: the unit of emitted program content.
//!
//! Concrete kinds supply size/encoding logic; the trait defaults fail with
//! the unimplemented-element error so an incomplete kind is caught the
//! first time layout touches it. That is a programming-time contract
//! violation, not a runtime input error.

use std::collections::HashMap;
use std::io::Write;
use std::sync::OnceLock;

use crate::core::error::EmitError;

/// Lifecycle of an element through layout and emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementState {
    Created,
    /// Size derived on the given pass; may still change next pass.
    SizeTentative(u32),
    /// Two consecutive passes agreed on the size.
    SizeStable,
    /// Final emission done. Terminal; entered exactly once.
    Written,
}

/// Read-only view of the current pass's address knowledge, handed to
/// elements whose encoding depends on addresses.
pub struct LayoutView<'a> {
    pub index: usize,
    pub addresses: &'a [u64],
}

impl LayoutView<'_> {
    pub fn own_address(&self) -> u64 {
        self.addresses[self.index]
    }

    pub fn address_of(&self, index: usize) -> Option<u64> {
        self.addresses.get(index).copied()
    }
}

pub trait Element {
    /// Stable kind tag; keys the default-mnemonic table and names the kind
    /// in unimplemented-element errors.
    fn kind(&self) -> &'static str;

    fn mnemonic(&self) -> &str;

    /// Whether size/encoding is final given the assumed start address.
    fn is_complete(&self, assumed_address: u64) -> Result<bool, EmitError> {
        let _ = assumed_address;
        Err(EmitError::unimplemented_element(self.kind(), "is_complete"))
    }

    /// Current best-known encoded size in bytes.
    fn size(&self) -> Result<u32, EmitError> {
        Err(EmitError::unimplemented_element(self.kind(), "size"))
    }

    /// Re-derive the size from this pass's address knowledge. The default
    /// covers address-independent encodings: the size never changes.
    fn relayout(&mut self, view: &LayoutView<'_>) -> Result<u32, EmitError> {
        let _ = view;
        self.size()
    }

    /// Render the human-readable line. Default: the mnemonic alone.
    fn write_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        write!(out, "{}", self.mnemonic())
    }

    /// Render the final binary encoding. Only valid after convergence.
    fn write_data(&self, out: &mut dyn Write) -> Result<(), EmitError> {
        let _ = out;
        Err(EmitError::unimplemented_element(self.kind(), "write_data"))
    }
}

/// Static (kind tag → default mnemonic) table, built once per process.
/// Replaces any reflective per-kind discovery: registration is explicit and
/// the table never changes after construction.
pub struct MnemonicTable {
    defaults: HashMap<&'static str, &'static str>,
}

impl MnemonicTable {
    pub fn new(entries: &[(&'static str, &'static str)]) -> Self {
        Self {
            defaults: entries.iter().copied().collect(),
        }
    }

    pub fn default_for(&self, kind: &str) -> &'static str {
        self.defaults.get(kind).copied().unwrap_or("")
    }
}

static DEFAULT_MNEMONICS: OnceLock<MnemonicTable> = OnceLock::new();

/// Process-wide default table. Populated lazily; exactly one writer
/// commits, reads afterwards are lock-free.
pub fn default_mnemonics() -> &'static MnemonicTable {
    DEFAULT_MNEMONICS.get_or_init(|| {
        MnemonicTable::new(&[
            ("move-imm", "mov"),
            ("move-reg", "mov"),
            ("branch", "jmp"),
            ("raw-bytes", "db"),
        ])
    })
}

/// Resolve an element's mnemonic at construction: an explicit override
/// wins; otherwise the kind's default from the table.
pub fn resolve_mnemonic(kind: &'static str, explicit: Option<String>) -> String {
    match explicit {
        Some(mnemonic) => mnemonic,
        None => default_mnemonics().default_for(kind).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{default_mnemonics, resolve_mnemonic, Element};
    use crate::core::error::EmitErrorKind;

    struct Bare;

    impl Element for Bare {
        fn kind(&self) -> &'static str {
            "bare"
        }
        fn mnemonic(&self) -> &str {
            "nop"
        }
    }

    #[test]
    fn missing_kind_logic_fails_with_element_error() {
        let bare = Bare;
        let err = bare.size().expect_err("unimplemented");
        assert_eq!(err.kind(), EmitErrorKind::Element);
        assert!(err.to_string().contains("bare"));
        assert!(err.to_string().contains("size"));

        let err = bare.is_complete(0).expect_err("unimplemented");
        assert!(err.to_string().contains("is_complete"));

        let mut sink = Vec::new();
        let err = bare.write_data(&mut sink).expect_err("unimplemented");
        assert!(err.to_string().contains("write_data"));
    }

    #[test]
    fn default_write_text_prints_mnemonic() {
        let bare = Bare;
        let mut out = Vec::new();
        bare.write_text(&mut out).expect("write");
        assert_eq!(out, b"nop");
    }

    #[test]
    fn default_mnemonics_are_cached_per_kind() {
        let first = default_mnemonics().default_for("move-imm");
        let second = default_mnemonics().default_for("move-imm");
        assert_eq!(first, "mov");
        assert_eq!(first, second);
        assert_eq!(default_mnemonics().default_for("unknown-kind"), "");
    }

    #[test]
    fn explicit_mnemonic_overrides_kind_default() {
        assert_eq!(resolve_mnemonic("move-imm", None), "mov");
        assert_eq!(
            resolve_mnemonic("move-imm", Some("movl".to_string())),
            "movl"
        );
    }
}
