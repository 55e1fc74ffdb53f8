//! Syntax kinds for TraceQL filters.
//!
//! `SyntaxKind` covers both token kinds (from the lexer) and node kinds (from the parser).
//! `TraceQL` implements Rowan's `Language` trait for tree construction.

use logos::Logos;
use rowan::Language;

/// Tokens first, then nodes, then the `__LAST` sentinel.
/// `#[repr(u16)]` keeps the transmute in `kind_from_raw` sound.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum SyntaxKind {
    #[token("{")]
    BraceOpen = 0,

    #[token("}")]
    BraceClose,

    #[token("(")]
    ParenOpen,

    #[token(")")]
    ParenClose,

    #[token("&&")]
    And,

    #[token("||")]
    Or,

    #[token("=")]
    Eq,

    #[token("!=")]
    Neq,

    #[token(">")]
    Gt,

    #[token(">=")]
    Gte,

    #[token("<")]
    Lt,

    #[token("<=")]
    Lte,

    #[token("=~")]
    Re,

    #[token("!~")]
    NotRe,

    #[token(".")]
    Dot,

    /// `resource.` or `span.` followed by the attribute name, split by the lexer
    #[regex(r"(resource|span)\.[a-zA-Z0-9_.:\-]*", priority = 10)]
    #[doc(hidden)]
    ScopedAttribute,

    /// `resource` scope qualifier
    Resource,

    /// `span` scope qualifier
    Span,

    /// Attribute or intrinsic name. Colons are allowed for `span:status` style intrinsics.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_.:\-]*")]
    Identifier,

    /// Double-quoted string, the closing quote may be missing while typing
    #[regex(r#""(?:[^"\\]|\\.)*"?"#)]
    String,

    #[regex(r"-?[0-9]+(\.[0-9]+)?")]
    Number,

    #[regex(r"[0-9]+(\.[0-9]+)?(ns|us|µs|ms|s|m|h)")]
    Duration,

    /// Literal values: booleans, `nil`, span status and span kind
    #[token("true")]
    #[token("false")]
    #[token("nil")]
    #[token("ok")]
    #[token("error")]
    #[token("unset")]
    #[token("unspecified")]
    #[token("internal")]
    #[token("server")]
    #[token("client")]
    #[token("producer")]
    #[token("consumer")]
    Keyword,

    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    /// Coalesced unrecognized characters
    Garbage,

    // --- Node kinds ---
    Root,
    SpansetFilter,
    FieldExpression,
    AttributeField,
    IntrinsicField,
    Static,
    FieldOp,
    Error,

    // Must be last, used for bounds checking in `kind_from_raw`
    #[doc(hidden)]
    __LAST,
}

use SyntaxKind::*;

impl SyntaxKind {
    #[inline]
    pub fn is_trivia(self) -> bool {
        matches!(self, Whitespace)
    }

    /// Tokens that show up in navigation, punctuation and operators are anonymous
    #[inline]
    pub fn is_named_token(self) -> bool {
        matches!(
            self,
            Resource | Span | Identifier | String | Number | Duration | Keyword
        )
    }

    #[inline]
    pub fn is_field_op(self) -> bool {
        matches!(self, Eq | Neq | Gt | Gte | Lt | Lte | Re | NotRe)
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    #[inline]
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

/// Language tag for Rowan's tree types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TraceQL {}

impl Language for TraceQL {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 < __LAST as u16);
        // SAFETY: the value is in bounds and SyntaxKind is repr(u16)
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// Type aliases for Rowan types parameterized by our language.
pub type SyntaxNode = rowan::SyntaxNode<TraceQL>;
pub type SyntaxToken = rowan::SyntaxToken<TraceQL>;
pub type SyntaxElement = rowan::NodeOrToken<SyntaxNode, SyntaxToken>;
