//! Concrete syntax tree for TraceQL filters.
//!
//! The tree is lossless: every byte of the input, including whitespace and unrecognized
//! characters, is a token in the tree. Incomplete input (the common case while a query is
//! being typed) still produces a tree, with `Error` nodes marking the damaged or missing parts.

mod kind;
mod lexer;
pub mod nav;
mod parser;

use std::fmt::Write;

use rowan::{GreenNode, NodeOrToken, TextRange};

pub use kind::{SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken, TraceQL};
pub use lexer::{Token, lex};
pub use nav::{CstNode, NodeKind, SyntaxNav, SyntaxTree};
pub use parser::{INTRINSICS, is_intrinsic};

/// A problem found while parsing, the tree carries an `Error` node at the same place
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub range: TextRange,
}

#[derive(Debug, Clone)]
pub struct Parse {
    green: GreenNode,
    errors: Vec<SyntaxError>,
}

impl Parse {
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Indented `Kind@start..end` dump of the tree, trivia omitted
    pub fn debug_tree(&self) -> String {
        let mut out = String::new();
        let mut depth = 0usize;
        for event in self.syntax().preorder_with_tokens() {
            match event {
                rowan::WalkEvent::Enter(element) => {
                    if matches!(&element, NodeOrToken::Token(token) if token.kind().is_trivia()) {
                        continue;
                    }
                    let range = element.text_range();
                    let _ = write!(
                        out,
                        "{:indent$}{:?}@{}..{}",
                        "",
                        element.kind(),
                        u32::from(range.start()),
                        u32::from(range.end()),
                        indent = depth * 2
                    );
                    match element {
                        NodeOrToken::Token(token) => {
                            let _ = writeln!(out, " {:?}", token.text());
                        }
                        NodeOrToken::Node(_) => {
                            out.push('\n');
                            depth += 1;
                        }
                    }
                }
                rowan::WalkEvent::Leave(NodeOrToken::Node(_)) => depth -= 1,
                rowan::WalkEvent::Leave(NodeOrToken::Token(_)) => {}
            }
        }
        out
    }
}

/// Parse a TraceQL filter expression, never failing
pub fn parse(source: &str) -> Parse {
    let tokens = lex(source);
    let parse = parser::Parser::new(source, tokens).parse();
    log::trace!(
        "Parsed TraceQL {:?} with {} syntax errors",
        source,
        parse.errors.len()
    );
    parse
}
