// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Emitter-pattern signatures and deterministic best-match selection.

use crate::core::tokenizer::{Token, TokenKind};

/// Classifier for one token position. Mirrors [`TokenKind`] without the
/// decoded payloads so signatures stay data-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    CommentStart,
    CommentBare,
    LiteralStart,
    Text,
    Identifier,
    Register,
    Number,
    Op,
}

impl MatchKind {
    pub fn matches(self, kind: &TokenKind) -> bool {
        matches!(
            (self, kind),
            (MatchKind::CommentStart, TokenKind::CommentStart)
                | (MatchKind::CommentBare, TokenKind::CommentBare)
                | (MatchKind::LiteralStart, TokenKind::LiteralStart)
                | (MatchKind::Text, TokenKind::Text(_))
                | (MatchKind::Identifier, TokenKind::Identifier(_))
                | (MatchKind::Register, TokenKind::Register(_))
                | (MatchKind::Number, TokenKind::Number(_))
                | (MatchKind::Op, TokenKind::Op(_))
        )
    }
}

/// One position matcher: a token kind, optionally constrained to an exact
/// literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMatcher {
    pub kind: MatchKind,
    pub literal: Option<String>,
}

impl TokenMatcher {
    pub fn any(kind: MatchKind) -> Self {
        Self {
            kind,
            literal: None,
        }
    }

    pub fn literal(kind: MatchKind, literal: impl Into<String>) -> Self {
        Self {
            kind,
            literal: Some(literal.into()),
        }
    }

    pub fn op(op: char) -> Self {
        Self::literal(MatchKind::Op, op.to_string())
    }

    pub fn matches(&self, token: &Token) -> bool {
        if !self.kind.matches(&token.kind) {
            return false;
        }
        match &self.literal {
            None => true,
            Some(want) => match &token.kind {
                TokenKind::Identifier(text) | TokenKind::Register(text) => {
                    text.eq_ignore_ascii_case(want)
                }
                TokenKind::Op(c) => want.len() == 1 && want.starts_with(*c),
                TokenKind::Text(text) => text == want,
                TokenKind::Number(value) => {
                    want.parse::<u64>().map(|w| w == *value).unwrap_or(false)
                }
                _ => true,
            },
        }
    }
}

/// Ordered list of position matchers. A signature matches a token sequence
/// only when lengths are equal and every position matcher is satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub matchers: Vec<TokenMatcher>,
}

impl Signature {
    pub fn new(matchers: Vec<TokenMatcher>) -> Self {
        Self { matchers }
    }

    pub fn matches(&self, tokens: &[Token]) -> bool {
        self.matchers.len() == tokens.len()
            && self
                .matchers
                .iter()
                .zip(tokens)
                .all(|(matcher, token)| matcher.matches(token))
    }

    /// Number of literal-constrained positions; the specificity metric.
    pub fn literal_count(&self) -> usize {
        self.matchers
            .iter()
            .filter(|matcher| matcher.literal.is_some())
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SignatureScore {
    literal_count: usize,
}

impl SignatureScore {
    fn better_than(self, other: Self) -> bool {
        self.literal_count > other.literal_count
    }
}

/// Select the best-matching signature for `tokens`.
///
/// More literal-constrained positions outrank fewer; on a specificity tie
/// the earliest-registered signature wins. Returns the winning index, or
/// `None` when nothing matches.
pub fn select_signature(signatures: &[Signature], tokens: &[Token]) -> Option<usize> {
    let mut best_idx = None;
    let mut best_score = SignatureScore { literal_count: 0 };

    for (idx, signature) in signatures.iter().enumerate() {
        if !signature.matches(tokens) {
            continue;
        }
        let score = SignatureScore {
            literal_count: signature.literal_count(),
        };
        if best_idx.is_none() || score.better_than(best_score) {
            best_idx = Some(idx);
            best_score = score;
        }
    }

    best_idx
}

#[cfg(test)]
mod tests {
    use super::{select_signature, MatchKind, Signature, TokenMatcher};
    use crate::core::tokenizer::tokenize;

    fn sig(matchers: Vec<TokenMatcher>) -> Signature {
        Signature::new(matchers)
    }

    #[test]
    fn length_mismatch_never_matches() {
        let tokens = tokenize("EAX = 0", 1).expect("tokenize");
        let signature = sig(vec![TokenMatcher::any(MatchKind::Register)]);
        assert!(!signature.matches(&tokens));
    }

    #[test]
    fn kind_and_literal_positions_match() {
        let tokens = tokenize("EAX = 0", 1).expect("tokenize");
        let signature = sig(vec![
            TokenMatcher::any(MatchKind::Register),
            TokenMatcher::op('='),
            TokenMatcher::any(MatchKind::Number),
        ]);
        assert!(signature.matches(&tokens));
    }

    #[test]
    fn literal_register_constraint() {
        let tokens = tokenize("EAX = 0", 1).expect("tokenize");
        let eax = sig(vec![
            TokenMatcher::literal(MatchKind::Register, "EAX"),
            TokenMatcher::op('='),
            TokenMatcher::any(MatchKind::Number),
        ]);
        let ebx = sig(vec![
            TokenMatcher::literal(MatchKind::Register, "EBX"),
            TokenMatcher::op('='),
            TokenMatcher::any(MatchKind::Number),
        ]);
        assert!(eax.matches(&tokens));
        assert!(!ebx.matches(&tokens));
    }

    #[test]
    fn more_specific_signature_outranks() {
        let tokens = tokenize("EAX = 0", 1).expect("tokenize");
        let generic = sig(vec![
            TokenMatcher::any(MatchKind::Register),
            TokenMatcher::op('='),
            TokenMatcher::any(MatchKind::Number),
        ]);
        let specific = sig(vec![
            TokenMatcher::literal(MatchKind::Register, "EAX"),
            TokenMatcher::op('='),
            TokenMatcher::any(MatchKind::Number),
        ]);
        // Registration order puts the generic rule first; specificity
        // still selects the literal-constrained one.
        let signatures = vec![generic, specific];
        assert_eq!(select_signature(&signatures, &tokens), Some(1));
    }

    #[test]
    fn specificity_tie_selects_earliest_registered() {
        let tokens = tokenize("EAX = 0", 1).expect("tokenize");
        let a = sig(vec![
            TokenMatcher::any(MatchKind::Register),
            TokenMatcher::op('='),
            TokenMatcher::any(MatchKind::Number),
        ]);
        let b = a.clone();
        let signatures = vec![a, b];
        assert_eq!(select_signature(&signatures, &tokens), Some(0));
    }

    #[test]
    fn no_candidate_returns_none() {
        let tokens = tokenize("label", 1).expect("tokenize");
        let signatures = vec![sig(vec![
            TokenMatcher::any(MatchKind::Register),
            TokenMatcher::op('='),
            TokenMatcher::any(MatchKind::Number),
        ])];
        assert_eq!(select_signature(&signatures, &tokens), None);
    }

    #[test]
    fn selection_is_deterministic_across_repeats() {
        let tokens = tokenize("EAX = 5", 1).expect("tokenize");
        let signatures = vec![
            sig(vec![
                TokenMatcher::any(MatchKind::Register),
                TokenMatcher::op('='),
                TokenMatcher::any(MatchKind::Number),
            ]),
            sig(vec![
                TokenMatcher::literal(MatchKind::Register, "EAX"),
                TokenMatcher::op('='),
                TokenMatcher::any(MatchKind::Number),
            ]),
        ];
        let first = select_signature(&signatures, &tokens);
        for _ in 0..16 {
            assert_eq!(select_signature(&signatures, &tokens), first);
        }
    }
}
