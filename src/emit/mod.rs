// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Pattern dispatch: signatures, the rule registry, and the built-in rules.

pub mod registry;
pub mod rules;
pub mod signature;
