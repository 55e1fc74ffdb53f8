//! Rendering of an [`ASTNode`] back into PromQL text
//!
//! Compact output is a single line with single spaces around binary operators.
//! Pretty output breaks aggregation, call and parenthesis bodies as well as
//! binary operands onto their own lines, indenting each level by two spaces.
//!
//! The output parses back into an equivalent tree: binary operands are wrapped
//! in parentheses whenever precedence or associativity would otherwise regroup
//! them.

use std::fmt;

use crate::ast::{
    ASTNode, Aggregation, BinaryExpr, BinaryOp, Call, LabelMatcher, MatchType, TimeAnchor,
    VectorMatchCardinality, VectorMatching,
};
use crate::duration::format_ms;
use crate::utils::{Side, escape_string, format_timestamp, maybe_parenthesize_binop_child};

/// Serialize `node` starting at `indent` columns
///
/// `initial_indent` controls whether the first line is indented as well, it is
/// cleared when the caller already positioned the cursor.
pub fn serialize(node: &ASTNode, indent: usize, pretty: bool, initial_indent: bool) -> String {
    Layout::new(indent, pretty, initial_indent).node(node)
}

/// Single-line form, as used by `Display`
pub fn serialize_compact(node: &ASTNode) -> String {
    serialize(node, 0, false, true)
}

/// Pretty-printed form starting at column zero
pub fn serialize_pretty(node: &ASTNode) -> String {
    serialize(node, 0, true, true)
}

impl fmt::Display for ASTNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&serialize_compact(self))
    }
}

struct Layout {
    indent: usize,
    pretty: bool,
    /// Separator between a bracket and its child list
    child_list_separator: &'static str,
    /// Separator between children and around binary operators
    child_separator: &'static str,
    /// Indentation of the current level
    ind: String,
    /// Indentation of the first line
    initial_ind: String,
}

impl Layout {
    fn new(indent: usize, pretty: bool, initial_indent: bool) -> Self {
        let ind = if pretty {
            " ".repeat(indent)
        } else {
            String::new()
        };
        let initial_ind = if initial_indent {
            ind.clone()
        } else {
            String::new()
        };

        Self {
            indent,
            pretty,
            child_list_separator: if pretty { "\n" } else { "" },
            child_separator: if pretty { "\n" } else { " " },
            ind,
            initial_ind,
        }
    }

    fn child(&self, node: &ASTNode) -> String {
        serialize(node, self.indent + 2, self.pretty, true)
    }

    fn node(&self, node: &ASTNode) -> String {
        match node {
            ASTNode::Aggregation(agg) => self.aggregation(agg),
            ASTNode::Subquery(sq) => {
                let inner = match sq.expr.as_ref() {
                    // `x + y[5m:]` would apply the range to `y` only
                    expr @ (ASTNode::BinaryExpr(_) | ASTNode::UnaryExpr(_)) => {
                        serialize(&ASTNode::paren(expr.clone()), self.indent, self.pretty, false)
                    }
                    expr => serialize(expr, self.indent, self.pretty, false),
                };
                let step = if sq.step == 0 {
                    String::new()
                } else {
                    format_ms(sq.step)
                };
                format!(
                    "{}{inner}[{}:{step}]{}",
                    self.initial_ind,
                    format_ms(sq.range),
                    at_and_offset(sq.anchor, sq.offset)
                )
            }
            ASTNode::ParenExpr(paren) => {
                let cls = self.child_list_separator;
                format!(
                    "{}({cls}{}{cls}{})",
                    self.initial_ind,
                    self.child(&paren.expr),
                    self.ind
                )
            }
            ASTNode::Call(call) => self.call(call),
            ASTNode::MatrixSelector(ms) => format!(
                "{}{}[{}]{}",
                self.initial_ind,
                selector(&ms.name, &ms.matchers),
                format_ms(ms.range),
                at_and_offset(ms.anchor, ms.offset)
            ),
            ASTNode::VectorSelector(vs) => format!(
                "{}{}{}",
                self.initial_ind,
                selector(&vs.name, &vs.matchers),
                at_and_offset(vs.anchor, vs.offset)
            ),
            ASTNode::NumberLiteral(number) => format!("{}{}", self.initial_ind, number.val),
            ASTNode::StringLiteral(string) => {
                format!("{}\"{}\"", self.initial_ind, escape_string(&string.val))
            }
            ASTNode::UnaryExpr(unary) => {
                let inner = match unary.expr.as_ref() {
                    // unary minus binds tighter than everything but `^`
                    expr @ ASTNode::BinaryExpr(bin) if bin.op != BinaryOp::Pow => {
                        serialize(&ASTNode::paren(expr.clone()), self.indent, self.pretty, false)
                    }
                    expr => serialize(expr, self.indent, self.pretty, false),
                };
                format!("{}{}{inner}", self.initial_ind, unary.op)
            }
            ASTNode::BinaryExpr(bin) => self.binary(bin),
            ASTNode::Placeholder(placeholder) => {
                if placeholder.children.is_empty() {
                    return format!("{}…", self.initial_ind);
                }
                let cls = self.child_list_separator;
                let children = placeholder
                    .children
                    .iter()
                    .map(|child| self.child(child))
                    .collect::<Vec<_>>()
                    .join(&format!(",{}", self.child_separator));
                format!("{}…({cls}{children}{cls}{})", self.initial_ind, self.ind)
            }
        }
    }

    fn aggregation(&self, agg: &Aggregation) -> String {
        let cls = self.child_list_separator;
        let grouping = if agg.without {
            format!(" without({}) ", agg.grouping.join(", "))
        } else if !agg.grouping.is_empty() {
            format!(" by({}) ", agg.grouping.join(", "))
        } else {
            String::new()
        };
        let param = match &agg.param {
            Some(param) if agg.op.takes_param() => {
                format!("{},{}", self.child(param), self.child_separator)
            }
            _ => String::new(),
        };

        format!(
            "{}{}{grouping}({cls}{param}{}{cls}{})",
            self.initial_ind,
            agg.op,
            self.child(&agg.expr),
            self.ind
        )
    }

    fn call(&self, call: &Call) -> String {
        if call.args.is_empty() {
            return format!("{}{}()", self.initial_ind, call.func.name);
        }

        let cls = self.child_list_separator;
        let args = call
            .args
            .iter()
            .map(|arg| self.child(arg))
            .collect::<Vec<_>>()
            .join(&format!(",{}", self.child_separator));
        format!(
            "{}{}({cls}{args}{cls}{})",
            self.initial_ind, call.func.name, self.ind
        )
    }

    fn binary(&self, bin: &BinaryExpr) -> String {
        let lhs = maybe_parenthesize_binop_child(bin.op, &bin.lhs, Side::Left);
        let rhs = maybe_parenthesize_binop_child(bin.op, &bin.rhs, Side::Right);
        let bool_modifier = if bin.bool_modifier { " bool" } else { "" };
        let (matching, grouping) = bin
            .matching
            .as_ref()
            .map(vector_matching)
            .unwrap_or_default();

        format!(
            "{}{sep}{}{}{bool_modifier}{matching}{grouping}{sep}{}",
            self.child(&lhs),
            self.ind,
            bin.op,
            self.child(&rhs),
            sep = self.child_separator
        )
    }
}

/// `on`/`ignoring` and `group_left`/`group_right` clauses
fn vector_matching(vm: &VectorMatching) -> (String, String) {
    let grouped = matches!(
        vm.card,
        VectorMatchCardinality::ManyToOne | VectorMatchCardinality::OneToMany
    );
    // group modifiers are only valid after an `on` or `ignoring` clause
    let matching = if !vm.labels.is_empty() || vm.on || grouped {
        let keyword = if vm.on { "on" } else { "ignoring" };
        format!(" {keyword}({})", vm.labels.join(", "))
    } else {
        String::new()
    };

    let grouping = match vm.card {
        VectorMatchCardinality::ManyToOne => format!(" group_left({})", vm.include.join(",")),
        VectorMatchCardinality::OneToMany => format!(" group_right({})", vm.include.join(",")),
        VectorMatchCardinality::OneToOne | VectorMatchCardinality::ManyToMany => String::new(),
    };

    (matching, grouping)
}

fn selector(name: &str, matchers: &[LabelMatcher]) -> String {
    let matchers: Vec<String> = matchers
        .iter()
        // the metric name is already rendered in front of the braces
        .filter(|m| !(m.name == "__name__" && m.match_type == MatchType::Equal && m.value == name))
        .map(LabelMatcher::to_string)
        .collect();

    if matchers.is_empty() {
        name.to_string()
    } else {
        format!("{name}{{{}}}", matchers.join(","))
    }
}

fn at_and_offset(anchor: Option<TimeAnchor>, offset: i64) -> String {
    let at = match anchor {
        Some(TimeAnchor::Fixed(ms)) => format!(" @ {}", format_timestamp(ms)),
        Some(TimeAnchor::Start) => " @ start()".to_string(),
        Some(TimeAnchor::End) => " @ end()".to_string(),
        None => String::new(),
    };

    let offset = match offset {
        0 => String::new(),
        ms => format!(" offset {}", format_ms(ms)),
    };

    format!("{at}{offset}")
}
