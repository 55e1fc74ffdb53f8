use std::borrow::Cow;

use crate::ast::{ASTNode, BinaryOp};

/// Operand position of a child within a binary expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Escape a value for use inside a double-quoted PromQL string
pub fn escape_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '"') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Whether `child` must be wrapped in parentheses to stay the `side` operand of `op`
pub fn binop_child_needs_parens(op: BinaryOp, child: &ASTNode, side: Side) -> bool {
    match child {
        ASTNode::BinaryExpr(inner) => {
            let (outer, inner) = (op.precedence(), inner.op.precedence());
            if inner != outer {
                return inner < outer;
            }
            match side {
                Side::Left => op.is_right_associative(),
                Side::Right => !op.is_right_associative(),
            }
        }
        // `-a ^ b` and `-2 ^ b` parse as `-(a ^ b)` and `-(2 ^ b)`
        ASTNode::UnaryExpr(_) => op == BinaryOp::Pow && side == Side::Left,
        ASTNode::NumberLiteral(num) => {
            op == BinaryOp::Pow && side == Side::Left && num.val.starts_with('-')
        }
        _ => false,
    }
}

/// `child` as is, or wrapped in a parenthesized expression when binding requires it
pub fn maybe_parenthesize_binop_child(op: BinaryOp, child: &ASTNode, side: Side) -> Cow<'_, ASTNode> {
    if binop_child_needs_parens(op, child, side) {
        Cow::Owned(ASTNode::paren(child.clone()))
    } else {
        Cow::Borrowed(child)
    }
}

/// Render an `@` timestamp in seconds with millisecond precision
pub fn format_timestamp(ms: i64) -> String {
    let sign = if ms < 0 { "-" } else { "" };
    let abs = ms.unsigned_abs();
    format!("{sign}{}.{:03}", abs / 1000, abs % 1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sel(name: &str) -> ASTNode {
        ASTNode::selector(name)
    }

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string("plain"), "plain");
        assert_eq!(escape_string(r#"a"b"#), r#"a\"b"#);
        assert_eq!(escape_string(r"C:\temp"), r"C:\\temp");
    }

    #[test]
    fn test_looser_child_is_wrapped() {
        let add = ASTNode::binary(BinaryOp::Add, sel("a"), sel("b"));
        assert!(binop_child_needs_parens(BinaryOp::Mul, &add, Side::Left));
        assert!(binop_child_needs_parens(BinaryOp::Mul, &add, Side::Right));

        let mul = ASTNode::binary(BinaryOp::Mul, sel("a"), sel("b"));
        assert!(!binop_child_needs_parens(BinaryOp::Add, &mul, Side::Right));
        assert!(!binop_child_needs_parens(BinaryOp::Or, &mul, Side::Left));
    }

    #[test]
    fn test_associativity() {
        let sub = ASTNode::binary(BinaryOp::Sub, sel("a"), sel("b"));
        assert!(!binop_child_needs_parens(BinaryOp::Add, &sub, Side::Left));
        assert!(binop_child_needs_parens(BinaryOp::Add, &sub, Side::Right));

        let pow = ASTNode::binary(BinaryOp::Pow, sel("a"), sel("b"));
        assert!(binop_child_needs_parens(BinaryOp::Pow, &pow, Side::Left));
        assert!(!binop_child_needs_parens(BinaryOp::Pow, &pow, Side::Right));
    }

    #[test]
    fn test_negative_base_of_pow_is_wrapped() {
        let negative = ASTNode::number("-2");
        assert!(binop_child_needs_parens(BinaryOp::Pow, &negative, Side::Left));
        assert!(!binop_child_needs_parens(BinaryOp::Pow, &negative, Side::Right));
        assert!(!binop_child_needs_parens(BinaryOp::Mul, &negative, Side::Left));
        assert!(!binop_child_needs_parens(BinaryOp::Pow, &ASTNode::number("2"), Side::Left));
    }

    #[test]
    fn test_maybe_parenthesize_borrows_when_unneeded() {
        let leaf = sel("a");
        assert!(matches!(
            maybe_parenthesize_binop_child(BinaryOp::Mul, &leaf, Side::Left),
            Cow::Borrowed(_)
        ));

        let or = ASTNode::binary(BinaryOp::Or, sel("a"), sel("b"));
        let wrapped = maybe_parenthesize_binop_child(BinaryOp::And, &or, Side::Left);
        assert_eq!(wrapped.into_owned(), ASTNode::paren(or));
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(1_609_459_200_000), "1609459200.000");
        assert_eq!(format_timestamp(1_500), "1.500");
        assert_eq!(format_timestamp(-1_500), "-1.500");
        assert_eq!(format_timestamp(5), "0.005");
    }
}
