// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Core front-end pieces: tokenization and error/diagnostic types.

pub mod error;
pub mod tokenizer;
