// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Tokenizer for pseudo-assembly source lines.
//!
//! Operates on one line at a time; the compiler strips and records
//! indentation before calling in. Every token carries its span so
//! diagnostics and dispatch errors can point back into the source.

use crate::core::error::EmitError;

/// Registers recognized by the tokenizer. Fixed set; anything else that
/// scans as a name becomes an identifier.
pub const REGISTERS: &[&str] = &[
    "EAX", "EBX", "ECX", "EDX", "ESI", "EDI", "ESP", "EBP", "AX", "BX", "CX", "DX", "SI", "DI",
    "SP", "BP", "AL", "AH", "BL", "BH", "CL", "CH", "DL", "DH",
];

/// Source location of a token within its line. Columns are 1-based and
/// half-open: `col_end` is one past the last byte of the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: u32,
    pub col_start: usize,
    pub col_end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// `// ` marker; the following [`TokenKind::Text`] token holds the body.
    CommentStart,
    /// Bare `//` at end of line.
    CommentBare,
    /// `//!` marker; the following text is emitted verbatim.
    LiteralStart,
    /// Free-text remainder after a comment or literal marker.
    Text(String),
    Identifier(String),
    Register(String),
    Number(u64),
    /// Single-character operator/punctuation.
    Op(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    fn new(kind: TokenKind, line: u32, col_start: usize, col_end: usize) -> Self {
        Self {
            kind,
            span: Span {
                line,
                col_start,
                col_end,
            },
        }
    }

    /// Significant text of the token, as it appeared in the source
    /// (numbers keep their decoded value's canonical form aside).
    pub fn literal_text<'a>(&'a self, source: &'a str) -> &'a str {
        &source[self.span.col_start - 1..self.span.col_end - 1]
    }

    pub fn kind_tag(&self) -> &'static str {
        match self.kind {
            TokenKind::CommentStart => "comment-start",
            TokenKind::CommentBare => "comment",
            TokenKind::LiteralStart => "literal-start",
            TokenKind::Text(_) => "text",
            TokenKind::Identifier(_) => "identifier",
            TokenKind::Register(_) => "register",
            TokenKind::Number(_) => "number",
            TokenKind::Op(_) => "op",
        }
    }
}

const OPS: &[char] = &['=', '+', '-', '*', ',', '(', ')'];

/// Tokenize one line (indentation already stripped).
///
/// A blank or whitespace-only line yields an empty sequence. Any byte that
/// does not begin a known token kind fails with a lex error naming line and
/// column.
pub fn tokenize(line: &str, line_num: u32) -> Result<Vec<Token>, EmitError> {
    let bytes = line.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0usize;

    while pos < bytes.len() {
        let c = bytes[pos];
        if c == b' ' || c == b'\t' {
            pos += 1;
            continue;
        }

        if c == b'/' && bytes.get(pos + 1) == Some(&b'/') {
            pos = scan_marker(line, line_num, pos, &mut tokens);
            continue;
        }

        if c.is_ascii_alphabetic() || c == b'_' {
            pos = scan_name(line, line_num, pos, &mut tokens);
            continue;
        }

        if c.is_ascii_digit() || c == b'$' {
            pos = scan_number(line, line_num, pos, &mut tokens)?;
            continue;
        }

        if OPS.contains(&(c as char)) {
            tokens.push(Token::new(TokenKind::Op(c as char), line_num, pos + 1, pos + 2));
            pos += 1;
            continue;
        }

        return Err(EmitError::lex(line_num, pos + 1, &line[pos..]));
    }

    Ok(tokens)
}

/// Disambiguate the shared `//` prefix: most specific pattern first.
/// `//!` is the literal-emission marker, `// ` the comment marker (the
/// space is mandatory), and a bare `//` only matches at end of line.
fn scan_marker(line: &str, line_num: u32, pos: usize, tokens: &mut Vec<Token>) -> usize {
    let rest = &line[pos + 2..];
    if let Some(body) = rest.strip_prefix('!') {
        tokens.push(Token::new(TokenKind::LiteralStart, line_num, pos + 1, pos + 4));
        tokens.push(Token::new(
            TokenKind::Text(body.to_string()),
            line_num,
            pos + 4,
            line.len() + 1,
        ));
        return line.len();
    }
    if let Some(body) = rest.strip_prefix(' ') {
        tokens.push(Token::new(TokenKind::CommentStart, line_num, pos + 1, pos + 4));
        tokens.push(Token::new(
            TokenKind::Text(body.to_string()),
            line_num,
            pos + 4,
            line.len() + 1,
        ));
        return line.len();
    }
    // Bare marker; anything glued to it keeps tokenizing and will fail
    // dispatch rather than lexing.
    tokens.push(Token::new(TokenKind::CommentBare, line_num, pos + 1, pos + 3));
    pos + 2
}

fn scan_name(line: &str, line_num: u32, pos: usize, tokens: &mut Vec<Token>) -> usize {
    let bytes = line.as_bytes();
    let mut end = pos;
    while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
        end += 1;
    }
    let name = &line[pos..end];
    let upper = name.to_ascii_uppercase();
    let kind = if REGISTERS.contains(&upper.as_str()) {
        TokenKind::Register(upper)
    } else {
        TokenKind::Identifier(name.to_string())
    };
    tokens.push(Token::new(kind, line_num, pos + 1, end + 1));
    end
}

fn scan_number(
    line: &str,
    line_num: u32,
    pos: usize,
    tokens: &mut Vec<Token>,
) -> Result<usize, EmitError> {
    let bytes = line.as_bytes();
    let (digits_start, radix) = if bytes[pos] == b'$' {
        (pos + 1, 16)
    } else if line[pos..].starts_with("0x") || line[pos..].starts_with("0X") {
        (pos + 2, 16)
    } else {
        (pos, 10)
    };

    let mut end = digits_start;
    while end < bytes.len() && (bytes[end] as char).is_digit(radix) {
        end += 1;
    }
    if end == digits_start {
        return Err(EmitError::lex(line_num, pos + 1, &line[pos..]));
    }
    // A trailing alphanumeric byte means the literal is malformed
    // (e.g. `12q` or hex digits past a decimal constant).
    if end < bytes.len() && bytes[end].is_ascii_alphanumeric() {
        return Err(EmitError::lex(line_num, pos + 1, &line[pos..]));
    }

    let value = u64::from_str_radix(&line[digits_start..end], radix)
        .map_err(|_| EmitError::lex(line_num, pos + 1, &line[pos..]))?;
    tokens.push(Token::new(TokenKind::Number(value), line_num, pos + 1, end + 1));
    Ok(end)
}

#[cfg(test)]
mod tests {
    use super::{tokenize, TokenKind};

    #[test]
    fn register_assign_immediate() {
        let tokens = tokenize("EAX = 0", 1).expect("tokenize");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].kind, TokenKind::Register("EAX".to_string()));
        assert_eq!(tokens[1].kind, TokenKind::Op('='));
        assert_eq!(tokens[2].kind, TokenKind::Number(0));
    }

    #[test]
    fn comment_marker_requires_space() {
        let tokens = tokenize("// hello world", 1).expect("tokenize");
        assert_eq!(tokens[0].kind, TokenKind::CommentStart);
        assert_eq!(tokens[1].kind, TokenKind::Text("hello world".to_string()));
    }

    #[test]
    fn literal_marker_wins_over_comment() {
        let tokens = tokenize("//! db 0xCC", 1).expect("tokenize");
        assert_eq!(tokens[0].kind, TokenKind::LiteralStart);
        assert_eq!(tokens[1].kind, TokenKind::Text(" db 0xCC".to_string()));
    }

    #[test]
    fn bare_comment_at_end_of_line() {
        let tokens = tokenize("//", 1).expect("tokenize");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::CommentBare);
    }

    #[test]
    fn glued_comment_tokenizes_remainder() {
        let tokens = tokenize("//oops", 1).expect("tokenize");
        assert_eq!(tokens[0].kind, TokenKind::CommentBare);
        assert_eq!(tokens[1].kind, TokenKind::Identifier("oops".to_string()));
    }

    #[test]
    fn blank_line_yields_no_tokens() {
        assert!(tokenize("", 1).expect("tokenize").is_empty());
        assert!(tokenize("   \t ", 1).expect("tokenize").is_empty());
    }

    #[test]
    fn hex_forms() {
        let tokens = tokenize("EBX = 0xFF", 2).expect("tokenize");
        assert_eq!(tokens[2].kind, TokenKind::Number(0xFF));
        let tokens = tokenize("ECX = $B8000", 3).expect("tokenize");
        assert_eq!(tokens[2].kind, TokenKind::Number(0xB8000));
    }

    #[test]
    fn spans_reconstruct_significant_text() {
        let line = "EAX = $1F";
        let tokens = tokenize(line, 1).expect("tokenize");
        assert_eq!(tokens[0].literal_text(line), "EAX");
        assert_eq!(tokens[1].literal_text(line), "=");
        assert_eq!(tokens[2].literal_text(line), "$1F");
    }

    #[test]
    fn unknown_bytes_fail_with_column() {
        let err = tokenize("%%%", 7).expect_err("lex error");
        let msg = err.to_string();
        assert!(msg.contains("line 7"), "{msg}");
        assert!(msg.contains("column 1"), "{msg}");
    }

    #[test]
    fn malformed_number_is_a_lex_error() {
        assert!(tokenize("EAX = 12q", 1).is_err());
        assert!(tokenize("EAX = $", 1).is_err());
    }

    #[test]
    fn lowercase_register_names_normalize() {
        let tokens = tokenize("eax = 1", 1).expect("tokenize");
        assert_eq!(tokens[0].kind, TokenKind::Register("EAX".to_string()));
    }
}
