// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Write-once pattern registry and dispatcher.
//!
//! The registry maps emitter signatures to handler functions. It is built
//! once at startup through [`RegistryBuilder`], preserving registration
//! order, and is immutable for the remainder of the process. Dispatch finds
//! the unique best-matching signature for a tokenized line and invokes its
//! handler with the decoded token values.

use crate::core::error::EmitError;
use crate::core::tokenizer::{Token, TokenKind};
use crate::emit::signature::{select_signature, Signature};
use crate::layout::element::Element;
use crate::layout::instruction::EncodingTable;

/// Decoded value extracted from a matched token position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Number(u64),
    Register(String),
    Ident(String),
    Text(String),
    Op(char),
    /// Marker tokens (`//`, `// `, `//!`) decode to no payload.
    Marker,
}

impl Value {
    fn decode(token: &Token) -> Self {
        match &token.kind {
            TokenKind::Number(value) => Value::Number(*value),
            TokenKind::Register(name) => Value::Register(name.clone()),
            TokenKind::Identifier(name) => Value::Ident(name.clone()),
            TokenKind::Text(text) => Value::Text(text.clone()),
            TokenKind::Op(c) => Value::Op(*c),
            TokenKind::CommentStart | TokenKind::CommentBare | TokenKind::LiteralStart => {
                Value::Marker
            }
        }
    }

    pub fn as_number(&self) -> Option<u64> {
        match self {
            Value::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_register(&self) -> Option<&str> {
        match self {
            Value::Register(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// What a handler produced for one source line.
pub enum Emit {
    /// A text fragment for the line-oriented output channel.
    Text(String),
    /// A user-comment fragment; suppressible by the compiler.
    Comment(String),
    /// An element to be registered with the layout engine.
    Element(Box<dyn Element>),
}

impl std::fmt::Debug for Emit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Emit::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Emit::Comment(text) => f.debug_tuple("Comment").field(text).finish(),
            Emit::Element(element) => f.debug_tuple("Element").field(&element.kind()).finish(),
        }
    }
}

/// Context threaded through dispatch and handler invocation. Replaces any
/// process-wide "current assembler" state: one context per compilation
/// setup, shared read-only.
pub struct EmitContext {
    pub registry: PatternRegistry,
    pub encodings: EncodingTable,
}

pub type Handler = fn(&[Value], &EmitContext) -> Result<Emit, EmitError>;

#[derive(Debug)]
struct Rule {
    name: &'static str,
    signature: Signature,
    handler: Handler,
}

/// Immutable (signature, handler) table in registration order.
#[derive(Debug)]
pub struct PatternRegistry {
    rules: Vec<Rule>,
    // Signatures cloned out once at build time so dispatch can run the
    // selection pass without touching the rule records.
    signatures: Vec<Signature>,
}

/// Accumulates registrations before the registry is frozen.
#[derive(Default)]
pub struct RegistryBuilder {
    rules: Vec<Rule>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &'static str, signature: Signature, handler: Handler) {
        self.rules.push(Rule {
            name,
            signature,
            handler,
        });
    }

    /// Freeze the table. Two registrations with identical signatures could
    /// never be told apart by the runtime tie-break, so they are rejected
    /// here as an ambiguous-pattern invariant violation.
    pub fn build(self) -> Result<PatternRegistry, EmitError> {
        for (idx, rule) in self.rules.iter().enumerate() {
            for earlier in &self.rules[..idx] {
                if earlier.signature == rule.signature {
                    return Err(EmitError::ambiguous_pattern(&format!(
                        "'{}' duplicates the signature of '{}'",
                        rule.name, earlier.name
                    )));
                }
            }
        }
        let signatures = self.rules.iter().map(|rule| rule.signature.clone()).collect();
        Ok(PatternRegistry {
            rules: self.rules,
            signatures,
        })
    }
}

impl PatternRegistry {
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Match `tokens` against the registered signatures and invoke the
    /// winning handler. `line_num` and `raw` feed the unmatched-pattern
    /// error when nothing applies.
    pub fn dispatch(
        &self,
        tokens: &[Token],
        line_num: u32,
        raw: &str,
        ctx: &EmitContext,
    ) -> Result<Emit, EmitError> {
        let idx = select_signature(&self.signatures, tokens)
            .ok_or_else(|| EmitError::unmatched_pattern(line_num, raw))?;
        let values: Vec<Value> = tokens.iter().map(Value::decode).collect();
        (self.rules[idx].handler)(&values, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::{Emit, EmitContext, RegistryBuilder, Value};
    use crate::core::error::EmitErrorKind;
    use crate::core::tokenizer::tokenize;
    use crate::emit::signature::{MatchKind, Signature, TokenMatcher};
    use crate::layout::instruction::EncodingTable;

    fn reg_assign_signature() -> Signature {
        Signature::new(vec![
            TokenMatcher::any(MatchKind::Register),
            TokenMatcher::op('='),
            TokenMatcher::any(MatchKind::Number),
        ])
    }

    fn echo_handler(values: &[Value], _ctx: &EmitContext) -> Result<Emit, super::EmitError> {
        let reg = values[0].as_register().unwrap_or("?");
        let num = values[1].as_number().or(values[2].as_number()).unwrap_or(0);
        Ok(Emit::Text(format!("{reg}:{num}")))
    }

    fn test_context(registry: super::PatternRegistry) -> EmitContext {
        EmitContext {
            registry,
            encodings: EncodingTable::x86_demo(),
        }
    }

    #[test]
    fn dispatch_invokes_matching_handler_with_decoded_values() {
        let mut builder = RegistryBuilder::new();
        builder.register("reg-assign", reg_assign_signature(), echo_handler);
        let ctx = test_context(builder.build().expect("build registry"));

        let tokens = tokenize("EAX = 42", 1).expect("tokenize");
        let emit = ctx
            .registry
            .dispatch(&tokens, 1, "EAX = 42", &ctx)
            .expect("dispatch");
        match emit {
            Emit::Text(text) => assert_eq!(text, "EAX:42"),
            _ => panic!("expected text emit"),
        }
    }

    #[test]
    fn unmatched_tokens_fail_with_raw_line() {
        let mut builder = RegistryBuilder::new();
        builder.register("reg-assign", reg_assign_signature(), echo_handler);
        let ctx = test_context(builder.build().expect("build registry"));

        let tokens = tokenize("foo bar", 9).expect("tokenize");
        let err = ctx
            .registry
            .dispatch(&tokens, 9, "foo bar", &ctx)
            .expect_err("no match");
        assert_eq!(err.kind(), EmitErrorKind::Pattern);
        assert!(err.to_string().contains("line 9"));
        assert!(err.to_string().contains("foo bar"));
    }

    #[test]
    fn duplicate_signatures_rejected_at_build() {
        let mut builder = RegistryBuilder::new();
        builder.register("first", reg_assign_signature(), echo_handler);
        builder.register("second", reg_assign_signature(), echo_handler);
        let err = builder.build().expect_err("duplicate signature");
        assert_eq!(err.kind(), EmitErrorKind::Ambiguous);
        assert!(err.to_string().contains("second"));
    }

    #[test]
    fn repeated_dispatch_selects_same_handler() {
        let mut builder = RegistryBuilder::new();
        builder.register("reg-assign", reg_assign_signature(), echo_handler);
        builder.register(
            "eax-assign",
            Signature::new(vec![
                TokenMatcher::literal(MatchKind::Register, "EAX"),
                TokenMatcher::op('='),
                TokenMatcher::any(MatchKind::Number),
            ]),
            |_, _| Ok(Emit::Text("special".to_string())),
        );
        let ctx = test_context(builder.build().expect("build registry"));

        let tokens = tokenize("EAX = 1", 1).expect("tokenize");
        for _ in 0..8 {
            let emit = ctx
                .registry
                .dispatch(&tokens, 1, "EAX = 1", &ctx)
                .expect("dispatch");
            match emit {
                Emit::Text(text) => assert_eq!(text, "special"),
                _ => panic!("expected text emit"),
            }
        }
    }
}
