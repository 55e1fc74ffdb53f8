//! Lexer for TraceQL filters.
//!
//! Produces span-based tokens; text is sliced from the source when the tree is built.
//!
//! Consecutive unrecognized characters are coalesced into a single `Garbage` token, and
//! `resource.<name>` / `span.<name>` are split into scope, dot and identifier tokens.

use std::ops::Range;

use logos::Logos;
use rowan::TextRange;

use super::kind::SyntaxKind;

/// Zero-copy token: kind + span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: SyntaxKind,
    pub span: TextRange,
}

impl Token {
    #[inline]
    pub fn new(kind: SyntaxKind, span: Range<usize>) -> Self {
        Self {
            kind,
            span: TextRange::new((span.start as u32).into(), (span.end as u32).into()),
        }
    }
}

pub fn lex(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lexer = SyntaxKind::lexer(source);
    let mut error_start: Option<usize> = None;

    loop {
        match lexer.next() {
            Some(Ok(kind)) => {
                if let Some(start) = error_start.take() {
                    tokens.push(Token::new(SyntaxKind::Garbage, start..lexer.span().start));
                }

                let span = lexer.span();
                if kind == SyntaxKind::ScopedAttribute {
                    split_scoped_attribute(source, span, &mut tokens);
                } else {
                    tokens.push(Token::new(kind, span));
                }
            }
            Some(Err(())) => {
                if error_start.is_none() {
                    error_start = Some(lexer.span().start);
                }
            }
            None => {
                if let Some(start) = error_start.take() {
                    tokens.push(Token::new(SyntaxKind::Garbage, start..source.len()));
                }
                break;
            }
        }
    }

    tokens
}

/// Splits `resource.service.name` into `resource` + `.` + `service.name`
fn split_scoped_attribute(source: &str, span: Range<usize>, tokens: &mut Vec<Token>) {
    let text = &source[span.clone()];
    let (scope, scope_len) = if text.starts_with("resource") {
        (SyntaxKind::Resource, "resource".len())
    } else {
        (SyntaxKind::Span, "span".len())
    };

    let dot = span.start + scope_len;
    tokens.push(Token::new(scope, span.start..dot));
    tokens.push(Token::new(SyntaxKind::Dot, dot..dot + 1));
    if dot + 1 < span.end {
        tokens.push(Token::new(SyntaxKind::Identifier, dot + 1..span.end));
    }
}

/// Retrieves the text slice for a token.
#[inline]
pub fn token_text<'q>(source: &'q str, token: &Token) -> &'q str {
    &source[Range::<usize>::from(token.span)]
}
