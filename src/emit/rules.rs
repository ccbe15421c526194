// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Built-in emitter rules and the process-wide default context.
//!
//! Registration is explicit and happens once; the frozen registry plus the
//! demo encoding table form the [`EmitContext`] every compilation shares.

use std::sync::OnceLock;

use crate::core::error::{EmitError, EmitErrorKind};
use crate::emit::registry::{Emit, EmitContext, RegistryBuilder, Value};
use crate::emit::signature::{MatchKind, Signature, TokenMatcher};
use crate::layout::instruction::{EncodingTable, MoveImm, MoveReg};

fn shape_error(rule: &'static str) -> EmitError {
    EmitError::new(
        EmitErrorKind::Pattern,
        "Handler received unexpected token shape",
        Some(rule),
    )
}

fn user_comment(values: &[Value], _ctx: &EmitContext) -> Result<Emit, EmitError> {
    let body = values
        .get(1)
        .and_then(Value::as_text)
        .ok_or_else(|| shape_error("user-comment"))?;
    Ok(Emit::Comment(format!("; {body}")))
}

fn bare_comment(_values: &[Value], _ctx: &EmitContext) -> Result<Emit, EmitError> {
    Ok(Emit::Comment(";".to_string()))
}

fn literal_line(values: &[Value], _ctx: &EmitContext) -> Result<Emit, EmitError> {
    let body = values
        .get(1)
        .and_then(Value::as_text)
        .ok_or_else(|| shape_error("literal-line"))?;
    // Verbatim pass-through; no translation, no reformatting.
    Ok(Emit::Text(body.to_string()))
}

fn move_immediate(values: &[Value], ctx: &EmitContext) -> Result<Emit, EmitError> {
    let register = values
        .first()
        .and_then(Value::as_register)
        .ok_or_else(|| shape_error("move-immediate"))?;
    let value = values
        .get(2)
        .and_then(Value::as_number)
        .ok_or_else(|| shape_error("move-immediate"))?;
    let element = MoveImm::new(register, value, &ctx.encodings, None)?;
    Ok(Emit::Element(Box::new(element)))
}

fn move_register(values: &[Value], ctx: &EmitContext) -> Result<Emit, EmitError> {
    let dst = values
        .first()
        .and_then(Value::as_register)
        .ok_or_else(|| shape_error("move-register"))?;
    let src = values
        .get(2)
        .and_then(Value::as_register)
        .ok_or_else(|| shape_error("move-register"))?;
    let element = MoveReg::new(dst, src, &ctx.encodings, None)?;
    Ok(Emit::Element(Box::new(element)))
}

/// Register the built-in rule set in specificity-neutral order. Callers can
/// add their own rules to the same builder before freezing it.
pub fn register_builtin_rules(builder: &mut RegistryBuilder) {
    builder.register(
        "user-comment",
        Signature::new(vec![
            TokenMatcher::any(MatchKind::CommentStart),
            TokenMatcher::any(MatchKind::Text),
        ]),
        user_comment,
    );
    builder.register(
        "bare-comment",
        Signature::new(vec![TokenMatcher::any(MatchKind::CommentBare)]),
        bare_comment,
    );
    builder.register(
        "literal-line",
        Signature::new(vec![
            TokenMatcher::any(MatchKind::LiteralStart),
            TokenMatcher::any(MatchKind::Text),
        ]),
        literal_line,
    );
    builder.register(
        "move-immediate",
        Signature::new(vec![
            TokenMatcher::any(MatchKind::Register),
            TokenMatcher::op('='),
            TokenMatcher::any(MatchKind::Number),
        ]),
        move_immediate,
    );
    builder.register(
        "move-register",
        Signature::new(vec![
            TokenMatcher::any(MatchKind::Register),
            TokenMatcher::op('='),
            TokenMatcher::any(MatchKind::Register),
        ]),
        move_register,
    );
}

fn build_default_context() -> Result<EmitContext, EmitError> {
    let mut builder = RegistryBuilder::new();
    register_builtin_rules(&mut builder);
    Ok(EmitContext {
        registry: builder.build()?,
        encodings: EncodingTable::x86_demo(),
    })
}

static DEFAULT_CONTEXT: OnceLock<EmitContext> = OnceLock::new();

/// Shared default context: built-in rules plus the demo encoding table.
/// Built at most once per process; later calls return the frozen instance.
pub fn default_context() -> Result<&'static EmitContext, EmitError> {
    if let Some(ctx) = DEFAULT_CONTEXT.get() {
        return Ok(ctx);
    }
    let ctx = build_default_context()?;
    Ok(DEFAULT_CONTEXT.get_or_init(|| ctx))
}

#[cfg(test)]
mod tests {
    use super::default_context;
    use crate::core::error::EmitErrorKind;
    use crate::core::tokenizer::tokenize;
    use crate::emit::registry::Emit;

    fn dispatch(line: &str) -> Result<Emit, crate::core::error::EmitError> {
        let ctx = default_context().expect("default context");
        let tokens = tokenize(line, 1)?;
        ctx.registry.dispatch(&tokens, 1, line, ctx)
    }

    #[test]
    fn comment_lines_become_semicolon_comments() {
        match dispatch("// boot sector entry").expect("dispatch") {
            Emit::Comment(text) => assert_eq!(text, "; boot sector entry"),
            _ => panic!("expected comment emit"),
        }
    }

    #[test]
    fn bare_comment_marker_alone() {
        match dispatch("//").expect("dispatch") {
            Emit::Comment(text) => assert_eq!(text, ";"),
            _ => panic!("expected comment emit"),
        }
    }

    #[test]
    fn literal_marker_passes_text_through_verbatim() {
        match dispatch("//! db 0xCC").expect("dispatch") {
            Emit::Text(text) => assert_eq!(text, " db 0xCC"),
            _ => panic!("expected text emit"),
        }
    }

    #[test]
    fn register_assign_immediate_builds_an_element() {
        match dispatch("EAX = 0x1234").expect("dispatch") {
            Emit::Element(element) => {
                let mut text = Vec::new();
                element.write_text(&mut text).expect("text");
                assert_eq!(String::from_utf8(text).expect("utf8"), "mov EAX, 0x1234");
            }
            _ => panic!("expected element emit"),
        }
    }

    #[test]
    fn register_assign_register_builds_an_element() {
        match dispatch("EBX = ECX").expect("dispatch") {
            Emit::Element(element) => {
                let mut text = Vec::new();
                element.write_text(&mut text).expect("text");
                assert_eq!(String::from_utf8(text).expect("utf8"), "mov EBX, ECX");
            }
            _ => panic!("expected element emit"),
        }
    }

    #[test]
    fn glued_comment_fails_dispatch_not_lexing() {
        let err = dispatch("//oops").expect_err("no rule");
        assert_eq!(err.kind(), EmitErrorKind::Pattern);
    }

    #[test]
    fn unknown_statement_reports_unmatched_pattern() {
        let err = dispatch("label equ 5 5").expect_err("no rule");
        assert_eq!(err.kind(), EmitErrorKind::Pattern);
    }
}
