//! Error-recovering recursive descent parser for TraceQL filters.
//!
//! Trivia is buffered and flushed when a node or token is started, so node ranges never
//! begin with whitespace. Missing operands become zero-width `Error` nodes placed after the
//! buffered trivia, which keeps the cursor position of an unfinished expression resolvable.

use rowan::{Checkpoint, GreenNodeBuilder, TextRange, TextSize};

use super::kind::SyntaxKind::{self, *};
use super::lexer::{Token, token_text};
use super::{Parse, SyntaxError};

/// Intrinsic fields addressable without a scope, plus their colon-qualified forms
pub const INTRINSICS: &[&str] = &[
    "duration",
    "event:name",
    "event:timeSinceStart",
    "instrumentation:name",
    "instrumentation:version",
    "kind",
    "link:spanID",
    "link:traceID",
    "name",
    "nestedSetLeft",
    "nestedSetParent",
    "nestedSetRight",
    "rootName",
    "rootServiceName",
    "span:duration",
    "span:id",
    "span:kind",
    "span:name",
    "span:parentID",
    "span:status",
    "span:statusMessage",
    "status",
    "statusMessage",
    "trace:duration",
    "trace:id",
    "trace:rootName",
    "trace:rootService",
    "traceDuration",
];

pub fn is_intrinsic(name: &str) -> bool {
    INTRINSICS.contains(&name)
}

pub(super) struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Token>,
    pos: usize,
    trivia_buffer: Vec<Token>,
    builder: GreenNodeBuilder<'static>,
    errors: Vec<SyntaxError>,
}

impl<'src> Parser<'src> {
    pub(super) fn new(source: &'src str, tokens: Vec<Token>) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            trivia_buffer: Vec::with_capacity(4),
            builder: GreenNodeBuilder::new(),
            errors: Vec::new(),
        }
    }

    pub(super) fn parse(mut self) -> Parse {
        self.parse_root();
        Parse {
            green: self.builder.finish(),
            errors: self.errors,
        }
    }

    // --- Grammar ---

    /// `root := spanset_filter (('&&' | '||') spanset_filter)*`
    fn parse_root(&mut self) {
        self.start_node(Root);
        while !self.at_eof() {
            match self.current() {
                BraceOpen => self.spanset_filter(),
                And | Or => self.bump(),
                _ => self.error_and_bump("expected `{`"),
            }
        }
        self.eat_trivia();
        self.finish_node();
    }

    /// `spanset_filter := '{' field_expression? '}'`
    fn spanset_filter(&mut self) {
        self.start_node(SpansetFilter);
        self.bump();

        if !matches!(self.current(), BraceClose) && !self.at_eof() {
            self.or_expression();
        }
        while !self.at_eof() && self.current() != BraceClose {
            self.error_and_bump("unexpected token in spanset filter");
        }

        if self.current() == BraceClose {
            self.bump();
        } else {
            // an unclosed filter spans to the end of the input
            self.drain_trivia();
            self.error("unclosed spanset filter, expected `}`");
        }
        self.finish_node();
    }

    fn or_expression(&mut self) {
        let checkpoint = self.checkpoint();
        self.and_expression();
        while self.current() == Or {
            self.start_node_at(checkpoint, FieldExpression);
            self.bump();
            self.and_expression();
            self.finish_node();
        }
    }

    fn and_expression(&mut self) {
        let checkpoint = self.checkpoint();
        self.comparison();
        while self.current() == And {
            self.start_node_at(checkpoint, FieldExpression);
            self.bump();
            self.comparison();
            self.finish_node();
        }
    }

    /// `comparison := operand (field_op operand)?`
    fn comparison(&mut self) {
        let checkpoint = self.checkpoint();
        self.operand();
        if self.current().is_field_op() {
            self.start_node_at(checkpoint, FieldExpression);
            self.start_node(FieldOp);
            self.bump();
            self.finish_node();
            self.operand();
            self.finish_node();
        }
    }

    fn operand(&mut self) {
        match self.current() {
            ParenOpen => self.parenthesized(),
            Resource | Span | Dot => self.attribute_field(),
            Identifier => self.named_field(),
            String | Number | Duration | Keyword => {
                self.start_node(FieldExpression);
                self.start_node(Static);
                self.bump();
                self.finish_node();
                self.finish_node();
            }
            Garbage => self.error_and_bump("unrecognized input"),
            _ => {
                // zero-width marker where an operand is missing
                self.error("expected a field or value");
                self.start_node(Error);
                self.finish_node();
            }
        }
    }

    fn parenthesized(&mut self) {
        self.start_node(FieldExpression);
        self.bump();
        if !matches!(self.current(), ParenClose) && !self.at_eof() {
            self.or_expression();
        }
        if !self.eat(ParenClose) {
            self.error("expected `)`");
        }
        self.finish_node();
    }

    /// `resource.name`, `span.name`, `.name`, and colon-qualified attributes
    fn attribute_field(&mut self) {
        self.start_node(FieldExpression);
        self.start_node(AttributeField);
        if matches!(self.current(), Resource | Span) {
            self.bump();
        }
        // the remainder of an attribute is contiguous, no trivia in between
        if self.nth_raw() == Some(Dot) {
            self.bump();
            if matches!(self.nth_raw(), Some(Identifier | Keyword)) {
                self.bump_as(Identifier);
            }
        }
        self.finish_node();
        self.finish_node();
    }

    fn named_field(&mut self) {
        let text = self.current_text();
        if is_intrinsic(text) {
            self.start_node(FieldExpression);
            self.start_node(IntrinsicField);
            self.bump();
            self.finish_node();
            self.finish_node();
        } else if text.contains(':') {
            // a partially typed intrinsic such as `span:sta`
            self.start_node(FieldExpression);
            self.start_node(AttributeField);
            self.bump();
            self.finish_node();
            self.finish_node();
        } else {
            let message = format!("unknown intrinsic `{text}`");
            self.error_and_bump(&message);
        }
    }

    // --- Token plumbing ---

    fn current(&mut self) -> SyntaxKind {
        self.skip_trivia_to_buffer();
        self.tokens.get(self.pos).map_or(Error, |t| t.kind)
    }

    /// Kind of the next token without skipping trivia
    fn nth_raw(&self) -> Option<SyntaxKind> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    fn current_text(&mut self) -> &'src str {
        self.skip_trivia_to_buffer();
        self.tokens
            .get(self.pos)
            .map_or("", |t| token_text(self.source, t))
    }

    fn current_span(&mut self) -> TextRange {
        self.skip_trivia_to_buffer();
        self.tokens.get(self.pos).map_or_else(
            || TextRange::empty(TextSize::from(self.source.len() as u32)),
            |t| t.span,
        )
    }

    fn at_eof(&mut self) -> bool {
        self.skip_trivia_to_buffer();
        self.pos >= self.tokens.len()
    }

    fn skip_trivia_to_buffer(&mut self) {
        while self.pos < self.tokens.len() && self.tokens[self.pos].kind.is_trivia() {
            self.trivia_buffer.push(self.tokens[self.pos]);
            self.pos += 1;
        }
    }

    fn drain_trivia(&mut self) {
        for token in self.trivia_buffer.drain(..) {
            let text = token_text(self.source, &token);
            self.builder.token(token.kind.into(), text);
        }
    }

    fn eat_trivia(&mut self) {
        self.skip_trivia_to_buffer();
        self.drain_trivia();
    }

    fn start_node(&mut self, kind: SyntaxKind) {
        self.drain_trivia();
        self.builder.start_node(kind.into());
    }

    fn start_node_at(&mut self, checkpoint: Checkpoint, kind: SyntaxKind) {
        self.builder.start_node_at(checkpoint, kind.into());
    }

    fn finish_node(&mut self) {
        self.builder.finish_node();
    }

    fn checkpoint(&mut self) -> Checkpoint {
        self.drain_trivia();
        self.builder.checkpoint()
    }

    fn bump(&mut self) {
        if let Some(kind) = self.nth_raw() {
            self.bump_as(kind);
        }
    }

    fn bump_as(&mut self, kind: SyntaxKind) {
        self.drain_trivia();
        if let Some(token) = self.tokens.get(self.pos) {
            let text = token_text(self.source, token);
            self.builder.token(kind.into(), text);
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.current() == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn error(&mut self, message: &str) {
        let range = self.current_span();
        if self.errors.last().is_some_and(|e| e.range == range) {
            return;
        }
        self.errors.push(SyntaxError {
            message: message.to_string(),
            range,
        });
    }

    fn error_and_bump(&mut self, message: &str) {
        self.error(message);
        if !self.at_eof() {
            self.start_node(Error);
            self.bump();
            self.finish_node();
        }
    }
}
