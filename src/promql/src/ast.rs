//! Typed PromQL abstract syntax tree
//!
//! Every node owns its children, so a tree is always a plain value that can be
//! cloned, compared and serialized without any sharing between subtrees.

use std::fmt;
use std::str::FromStr;

use crate::error::PromQLError;
use crate::functions;
use crate::utils::escape_string;

/// Declares a fieldless operator enum with its textual form, `Display` and `FromStr`
macro_rules! keyword_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $what:literal {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = PromQLError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(PromQLError::UnsupportedFeature(format!(
                        concat!("unknown ", $what, " '{}'"),
                        s
                    ))),
                }
            }
        }
    };
}

keyword_enum! {
    /// Aggregation operators supported by PromQL
    AggregationOp, "aggregation operator" {
        Sum => "sum",
        Min => "min",
        Max => "max",
        Avg => "avg",
        Stddev => "stddev",
        Stdvar => "stdvar",
        Count => "count",
        Group => "group",
        CountValues => "count_values",
        BottomK => "bottomk",
        TopK => "topk",
        Quantile => "quantile",
        LimitK => "limitk",
        LimitRatio => "limit_ratio",
    }
}

impl AggregationOp {
    /// Operators taking a parameter before the aggregated expression, e.g. `topk(5, x)`
    pub fn takes_param(&self) -> bool {
        matches!(
            self,
            Self::CountValues
                | Self::Quantile
                | Self::TopK
                | Self::BottomK
                | Self::LimitK
                | Self::LimitRatio
        )
    }
}

keyword_enum! {
    /// Binary operators, from loosest (`or`) to tightest (`^`) binding
    BinaryOp, "binary operator" {
        Or => "or",
        And => "and",
        Unless => "unless",
        Eql => "==",
        Neq => "!=",
        Gtr => ">",
        Lss => "<",
        Gte => ">=",
        Lte => "<=",
        Add => "+",
        Sub => "-",
        Mul => "*",
        Div => "/",
        Mod => "%",
        Atan2 => "atan2",
        Pow => "^",
    }
}

impl BinaryOp {
    /// Binding strength, higher binds tighter
    pub fn precedence(&self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And | Self::Unless => 2,
            Self::Eql | Self::Neq | Self::Gtr | Self::Lss | Self::Gte | Self::Lte => 3,
            Self::Add | Self::Sub => 4,
            Self::Mul | Self::Div | Self::Mod | Self::Atan2 => 5,
            Self::Pow => 6,
        }
    }

    pub fn is_right_associative(&self) -> bool {
        matches!(self, Self::Pow)
    }

    pub fn is_comparison(&self) -> bool {
        self.precedence() == 3
    }

    pub fn is_set_operator(&self) -> bool {
        matches!(self, Self::And | Self::Or | Self::Unless)
    }
}

keyword_enum! {
    UnaryOp, "unary operator" {
        Neg => "-",
        Pos => "+",
    }
}

keyword_enum! {
    /// Label matcher types matching Prometheus semantics
    MatchType, "matcher type" {
        /// Exact string match (=)
        Equal => "=",
        /// Not equal (!=)
        NotEqual => "!=",
        /// Regex match (=~)
        RegexMatch => "=~",
        /// Regex not match (!~)
        RegexNotMatch => "!~",
    }
}

keyword_enum! {
    VectorMatchCardinality, "vector match cardinality" {
        OneToOne => "one-to-one",
        ManyToOne => "many-to-one",
        OneToMany => "one-to-many",
        ManyToMany => "many-to-many",
    }
}

keyword_enum! {
    /// Value types produced and consumed by expressions
    ValueType, "value type" {
        None => "none",
        Vector => "vector",
        Scalar => "scalar",
        Matrix => "matrix",
        String => "string",
    }
}

/// Evaluation time pinned with the `@` modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeAnchor {
    /// `@ <timestamp>`, milliseconds since epoch
    Fixed(i64),
    /// `@ start()`
    Start,
    /// `@ end()`
    End,
}

/// A single label matcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMatcher {
    /// Match operation
    pub match_type: MatchType,
    /// Label name
    pub name: String,
    /// Value to match against
    pub value: String,
}

impl LabelMatcher {
    pub fn new(match_type: MatchType, name: &str, value: &str) -> Self {
        Self {
            match_type,
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    /// Create a new equality matcher
    pub fn equal(name: &str, value: &str) -> Self {
        Self::new(MatchType::Equal, name, value)
    }

    /// Create a new not-equal matcher
    pub fn not_equal(name: &str, value: &str) -> Self {
        Self::new(MatchType::NotEqual, name, value)
    }

    /// Create a new regex matcher
    pub fn regex_match(name: &str, pattern: &str) -> Self {
        Self::new(MatchType::RegexMatch, name, pattern)
    }

    /// Create a new regex not-match matcher
    pub fn regex_not_match(name: &str, pattern: &str) -> Self {
        Self::new(MatchType::RegexNotMatch, name, pattern)
    }
}

/// Matcher as written inside selector braces, e.g. `job=~"api.*"`
impl fmt::Display for LabelMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}\"{}\"", self.name, self.match_type, escape_string(&self.value))
    }
}

/// `on`/`ignoring` and `group_left`/`group_right` clause of a binary expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorMatching {
    pub card: VectorMatchCardinality,
    /// Labels listed in `on(...)` or `ignoring(...)`
    pub labels: Vec<String>,
    /// `on` when set, `ignoring` otherwise
    pub on: bool,
    /// Extra labels carried over by `group_left`/`group_right`
    pub include: Vec<String>,
}

/// Function descriptor of a call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Func {
    pub name: String,
    pub arg_types: Vec<ValueType>,
    /// 0 for a fixed arity, -1 for unbounded trailing arguments, n for up to n optional ones
    pub variadic: i32,
    pub return_type: ValueType,
}

impl Func {
    /// Descriptor for `name`, taken from the function catalog when known
    pub fn named(name: &str) -> Self {
        functions::signature(name).unwrap_or_else(|| Func {
            name: name.to_string(),
            arg_types: Vec::new(),
            variadic: -1,
            return_type: ValueType::Vector,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub op: AggregationOp,
    pub expr: Box<ASTNode>,
    pub param: Option<Box<ASTNode>>,
    pub grouping: Vec<String>,
    pub without: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub lhs: Box<ASTNode>,
    pub rhs: Box<ASTNode>,
    pub matching: Option<VectorMatching>,
    pub bool_modifier: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub func: Func,
    pub args: Vec<ASTNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VectorSelector {
    pub name: String,
    pub matchers: Vec<LabelMatcher>,
    /// Signed offset in milliseconds, 0 when absent
    pub offset: i64,
    pub anchor: Option<TimeAnchor>,
}

impl VectorSelector {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_matcher(mut self, matcher: LabelMatcher) -> Self {
        self.matchers.push(matcher);
        self
    }

    pub fn with_offset(mut self, offset_ms: i64) -> Self {
        self.offset = offset_ms;
        self
    }

    pub fn with_anchor(mut self, anchor: TimeAnchor) -> Self {
        self.anchor = Some(anchor);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixSelector {
    pub name: String,
    pub matchers: Vec<LabelMatcher>,
    /// Range in milliseconds
    pub range: i64,
    pub offset: i64,
    pub anchor: Option<TimeAnchor>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Subquery {
    pub expr: Box<ASTNode>,
    pub range: i64,
    /// Resolution in milliseconds, 0 for the default step
    pub step: i64,
    pub offset: i64,
    pub anchor: Option<TimeAnchor>,
}

/// Numeric literal, kept as text so no precision is lost
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberLiteral {
    pub val: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringLiteral {
    pub val: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParenExpr {
    pub expr: Box<ASTNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub expr: Box<ASTNode>,
}

/// Unfinished part of a tree being edited
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Placeholder {
    pub children: Vec<ASTNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ASTNode {
    Aggregation(Aggregation),
    BinaryExpr(BinaryExpr),
    Call(Call),
    MatrixSelector(MatrixSelector),
    Subquery(Subquery),
    NumberLiteral(NumberLiteral),
    ParenExpr(ParenExpr),
    StringLiteral(StringLiteral),
    UnaryExpr(UnaryExpr),
    VectorSelector(VectorSelector),
    Placeholder(Placeholder),
}

impl ASTNode {
    /// Node kind tag, as shown by tree views
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Aggregation(_) => "aggregation",
            Self::BinaryExpr(_) => "binaryExpr",
            Self::Call(_) => "call",
            Self::MatrixSelector(_) => "matrixSelector",
            Self::Subquery(_) => "subquery",
            Self::NumberLiteral(_) => "numberLiteral",
            Self::ParenExpr(_) => "parenExpr",
            Self::StringLiteral(_) => "stringLiteral",
            Self::UnaryExpr(_) => "unaryExpr",
            Self::VectorSelector(_) => "vectorSelector",
            Self::Placeholder(_) => "placeholder",
        }
    }

    /// Direct children in source order
    pub fn children(&self) -> Vec<&ASTNode> {
        match self {
            Self::Aggregation(agg) => agg
                .param
                .as_deref()
                .into_iter()
                .chain(std::iter::once(agg.expr.as_ref()))
                .collect(),
            Self::BinaryExpr(bin) => vec![bin.lhs.as_ref(), bin.rhs.as_ref()],
            Self::Call(call) => call.args.iter().collect(),
            Self::Subquery(sq) => vec![sq.expr.as_ref()],
            Self::ParenExpr(paren) => vec![paren.expr.as_ref()],
            Self::UnaryExpr(unary) => vec![unary.expr.as_ref()],
            Self::Placeholder(placeholder) => placeholder.children.iter().collect(),
            Self::MatrixSelector(_)
            | Self::VectorSelector(_)
            | Self::NumberLiteral(_)
            | Self::StringLiteral(_) => Vec::new(),
        }
    }

    pub fn number(val: impl Into<String>) -> Self {
        Self::NumberLiteral(NumberLiteral { val: val.into() })
    }

    pub fn string(val: impl Into<String>) -> Self {
        Self::StringLiteral(StringLiteral { val: val.into() })
    }

    pub fn selector(name: &str) -> Self {
        Self::VectorSelector(VectorSelector::new(name))
    }

    pub fn binary(op: BinaryOp, lhs: ASTNode, rhs: ASTNode) -> Self {
        Self::BinaryExpr(BinaryExpr {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            matching: None,
            bool_modifier: false,
        })
    }

    pub fn paren(expr: ASTNode) -> Self {
        Self::ParenExpr(ParenExpr {
            expr: Box::new(expr),
        })
    }

    pub fn unary(op: UnaryOp, expr: ASTNode) -> Self {
        Self::UnaryExpr(UnaryExpr {
            op,
            expr: Box::new(expr),
        })
    }

    pub fn call(name: &str, args: Vec<ASTNode>) -> Self {
        Self::Call(Call {
            func: Func::named(name),
            args,
        })
    }
}

impl From<VectorSelector> for ASTNode {
    fn from(vs: VectorSelector) -> Self {
        Self::VectorSelector(vs)
    }
}
