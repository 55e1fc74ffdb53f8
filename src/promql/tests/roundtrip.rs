use promql::ast::{
    ASTNode, Aggregation, AggregationOp, BinaryExpr, BinaryOp, LabelMatcher, MatrixSelector,
    Subquery, UnaryOp, VectorMatchCardinality, VectorMatching, VectorSelector,
};
use promql::parser::parse;
use promql::{TimeAnchor, serialize_compact, serialize_pretty};

const QUERIES: &[&str] = &[
    "http_requests_total",
    r#"http_requests_total{job="api",method!="GET"}"#,
    r#"{job=~"api.*"}"#,
    r#"rate(http_requests_total{job=~"api.*"}[5m] offset 1h)"#,
    "sum by (job, le) (rate(x[5m]))",
    "avg without (instance) (up)",
    "topk(5, up)",
    r#"count_values("version", build_info)"#,
    "quantile(0.9, x)",
    "a + on (instance) group_left (version) b",
    "a > bool 0.5",
    "a unless ignoring (job) b",
    "a and b or c",
    "(a + b) * c",
    "a - (b - c)",
    "a ^ b ^ c",
    "(a ^ b) ^ c",
    "a atan2 b",
    "-x",
    "-(a + b)",
    "rate(x[5m])[30m:1m]",
    "max_over_time(up[1h:] @ end())",
    "x @ 1609459200.5 offset -5m",
    "time()",
    r#"label_replace(up, "dst", "$1", "src", "(.*)")"#,
    "histogram_quantile(0.95, sum by (le) (rate(x_bucket[5m])))",
    "up == 1 or vector(0)",
    r#""api""#,
];

/// Drop parenthesized expressions so trees can be compared by grouping only
fn strip_parens(ast: ASTNode) -> ASTNode {
    let strip = |node: Box<ASTNode>| Box::new(strip_parens(*node));
    match ast {
        ASTNode::ParenExpr(paren) => strip_parens(*paren.expr),
        ASTNode::Aggregation(agg) => ASTNode::Aggregation(Aggregation {
            expr: strip(agg.expr),
            param: agg.param.map(strip),
            ..agg
        }),
        ASTNode::BinaryExpr(bin) => ASTNode::BinaryExpr(BinaryExpr {
            lhs: strip(bin.lhs),
            rhs: strip(bin.rhs),
            ..bin
        }),
        ASTNode::UnaryExpr(mut unary) => {
            unary.expr = strip(unary.expr);
            ASTNode::UnaryExpr(unary)
        }
        ASTNode::Subquery(sq) => ASTNode::Subquery(Subquery {
            expr: strip(sq.expr),
            ..sq
        }),
        ASTNode::Call(mut call) => {
            call.args = call.args.into_iter().map(strip_parens).collect();
            ASTNode::Call(call)
        }
        other => other,
    }
}

#[test]
fn test_parse_serialize_parse_is_stable() {
    for query in QUERIES {
        let ast = parse(query).unwrap_or_else(|e| panic!("{query}: {e}"));

        let compact = serialize_compact(&ast);
        let reparsed = parse(&compact).unwrap_or_else(|e| panic!("{compact}: {e}"));
        assert_eq!(reparsed, ast, "compact form of {query}: {compact}");

        let pretty = serialize_pretty(&ast);
        let reparsed = parse(&pretty).unwrap_or_else(|e| panic!("{pretty}: {e}"));
        assert_eq!(reparsed, ast, "pretty form of {query}: {pretty}");
    }
}

#[test]
fn test_serialize_is_a_fixpoint() {
    for query in QUERIES {
        let once = serialize_compact(&parse(query).unwrap());
        let twice = serialize_compact(&parse(&once).unwrap());
        assert_eq!(once, twice);
    }
}

fn sel(name: &str) -> ASTNode {
    ASTNode::selector(name)
}

#[test]
fn test_built_trees_survive_a_roundtrip() {
    let trees = vec![
        ASTNode::binary(
            BinaryOp::Mul,
            ASTNode::binary(BinaryOp::Add, sel("a"), sel("b")),
            sel("c"),
        ),
        ASTNode::binary(
            BinaryOp::Div,
            sel("a"),
            ASTNode::binary(BinaryOp::Mul, sel("b"), sel("c")),
        ),
        ASTNode::binary(
            BinaryOp::And,
            ASTNode::binary(BinaryOp::Or, sel("a"), sel("b")),
            ASTNode::binary(BinaryOp::Unless, sel("c"), sel("d")),
        ),
        ASTNode::binary(
            BinaryOp::Pow,
            ASTNode::unary(UnaryOp::Neg, sel("a")),
            ASTNode::number("2"),
        ),
        ASTNode::binary(BinaryOp::Pow, ASTNode::number("-2"), ASTNode::number("2")),
        ASTNode::unary(
            UnaryOp::Neg,
            ASTNode::binary(BinaryOp::Sub, sel("a"), sel("b")),
        ),
        ASTNode::Subquery(Subquery {
            expr: Box::new(ASTNode::binary(BinaryOp::Add, sel("a"), sel("b"))),
            range: 3_600_000,
            step: 0,
            offset: 0,
            anchor: Some(TimeAnchor::Start),
        }),
        ASTNode::Aggregation(Aggregation {
            op: AggregationOp::BottomK,
            expr: Box::new(ASTNode::call(
                "rate",
                vec![ASTNode::MatrixSelector(MatrixSelector {
                    name: "http_requests_total".to_string(),
                    matchers: vec![LabelMatcher::regex_not_match("code", "5..")],
                    range: 90_000,
                    offset: -60_000,
                    anchor: None,
                })],
            )),
            param: Some(Box::new(ASTNode::number("3"))),
            grouping: vec!["job".to_string()],
            without: true,
        }),
        ASTNode::BinaryExpr(BinaryExpr {
            op: BinaryOp::Div,
            lhs: Box::new(
                VectorSelector::new("errors")
                    .with_anchor(TimeAnchor::Fixed(1_700_000_000_250))
                    .into(),
            ),
            rhs: Box::new(sel("requests")),
            matching: Some(VectorMatching {
                card: VectorMatchCardinality::OneToMany,
                labels: vec!["job".to_string()],
                on: false,
                include: vec!["team".to_string()],
            }),
            bool_modifier: false,
        }),
    ];

    for tree in trees {
        let text = serialize_compact(&tree);
        let reparsed = parse(&text).unwrap_or_else(|e| panic!("{text}: {e}"));
        assert_eq!(strip_parens(reparsed), tree, "{text}");
    }
}

#[test]
fn test_parenthesization_is_minimal() {
    let tree = ASTNode::binary(
        BinaryOp::Add,
        sel("a"),
        ASTNode::binary(BinaryOp::Mul, sel("b"), sel("c")),
    );
    assert_eq!(serialize_compact(&tree), "a + b * c");
    assert_eq!(
        serialize_compact(&parse("a + b * c").unwrap()),
        "a + b * c"
    );
}

#[test]
fn test_negative_number_base_keeps_its_sign() {
    let tree = ASTNode::binary(BinaryOp::Pow, ASTNode::number("-2"), ASTNode::number("2"));
    let text = serialize_compact(&tree);
    assert_eq!(text, "(-2) ^ 2");
    assert_eq!(strip_parens(parse(&text).unwrap()), tree);

    // the exponent side binds on its own
    let tree = ASTNode::binary(BinaryOp::Pow, ASTNode::number("2"), ASTNode::number("-2"));
    assert_eq!(serialize_compact(&tree), "2 ^ -2");
}
