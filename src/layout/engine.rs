// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Layout engine: fixed-point address resolution and final emission.
//!
//! Elements are appended in program order during dispatch. `resolve` then
//! iterates layout passes until every element's size stops changing, since
//! an address-dependent encoding (short vs. long branch) can alter a size,
//! which shifts every later address, which can alter further sizes. The
//! pass ceiling turns a cyclic size dependency into an error instead of an
//! unbounded loop.

use std::io::Write;

use crate::core::error::{EmitError, EmitErrorKind};
use crate::layout::element::{Element, ElementState, LayoutView};

/// Upper bound on layout passes before declaring non-convergence.
pub const MAX_LAYOUT_PASSES: u32 = 32;

struct Slot {
    element: Box<dyn Element>,
    state: ElementState,
    size: u32,
    address: Option<u64>,
}

/// Owns the ordered element sequence and the converged address map.
/// One per compilation unit: accumulate during dispatch, resolve once,
/// emit once.
#[derive(Default)]
pub struct Assembler {
    slots: Vec<Slot>,
    resolved: bool,
    emitted: bool,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Append an element, returning its sequence index.
    pub fn add(&mut self, element: Box<dyn Element>) -> usize {
        self.slots.push(Slot {
            element,
            state: ElementState::Created,
            size: 0,
            address: None,
        });
        self.slots.len() - 1
    }

    pub fn state(&self, index: usize) -> Option<ElementState> {
        self.slots.get(index).map(|slot| slot.state)
    }

    /// Resolved start address of the element at `index`; only available
    /// after convergence.
    pub fn address(&self, index: usize) -> Option<u64> {
        self.slots.get(index).and_then(|slot| slot.address)
    }

    /// `(sequence index, resolved start address)` for every element.
    pub fn address_map(&self) -> Vec<(usize, u64)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.address.map(|addr| (idx, addr)))
            .collect()
    }

    /// Run layout passes from `base` until the size fixed point is
    /// reached, then commit each element's address exactly once.
    pub fn resolve(&mut self, base: u64) -> Result<(), EmitError> {
        for slot in &mut self.slots {
            slot.size = slot.element.size()?;
        }

        let mut pass: u32 = 0;
        loop {
            let addresses = self.tentative_addresses(base)?;

            let mut changed = false;
            for (idx, slot) in self.slots.iter_mut().enumerate() {
                let view = LayoutView {
                    index: idx,
                    addresses: &addresses,
                };
                let new_size = slot.element.relayout(&view)?;
                if new_size != slot.size {
                    slot.size = new_size;
                    changed = true;
                }
                slot.state = ElementState::SizeTentative(pass);
            }

            if !changed {
                for (idx, slot) in self.slots.iter_mut().enumerate() {
                    if !slot.element.is_complete(addresses[idx])? {
                        return Err(EmitError::new(
                            EmitErrorKind::Layout,
                            "Element not complete at convergence",
                            Some(slot.element.kind()),
                        ));
                    }
                    slot.address = Some(addresses[idx]);
                    slot.state = ElementState::SizeStable;
                }
                self.resolved = true;
                return Ok(());
            }

            pass += 1;
            if pass >= MAX_LAYOUT_PASSES {
                return Err(EmitError::non_convergent_layout(MAX_LAYOUT_PASSES));
            }
        }
    }

    fn tentative_addresses(&self, base: u64) -> Result<Vec<u64>, EmitError> {
        let mut addresses = Vec::with_capacity(self.slots.len());
        let mut addr = base;
        for slot in &self.slots {
            addresses.push(addr);
            addr = addr.checked_add(slot.size as u64).ok_or_else(|| {
                EmitError::new(
                    EmitErrorKind::Layout,
                    "Address space exhausted during layout",
                    None,
                )
            })?;
        }
        Ok(addresses)
    }

    /// Walk the sequence exactly once, in order, writing each element's
    /// text line and binary encoding. Returns the address map.
    pub fn emit(
        &mut self,
        text_out: &mut dyn Write,
        data_out: &mut dyn Write,
    ) -> Result<Vec<(usize, u64)>, EmitError> {
        if !self.resolved {
            return Err(EmitError::new(
                EmitErrorKind::Layout,
                "emit called before address resolution",
                None,
            ));
        }
        // Written is terminal; a second walk would duplicate both channels.
        if self.emitted {
            return Err(EmitError::new(
                EmitErrorKind::Layout,
                "emit called twice on the same element sequence",
                None,
            ));
        }
        self.emitted = true;
        for slot in &mut self.slots {
            slot.element.write_text(text_out)?;
            writeln!(text_out)?;
            slot.element.write_data(data_out)?;
            slot.state = ElementState::Written;
        }
        Ok(self.address_map())
    }
}
