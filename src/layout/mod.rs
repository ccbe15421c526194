// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Instruction elements and fixed-point address layout.

pub mod element;
pub mod engine;
pub mod instruction;
pub mod output;
