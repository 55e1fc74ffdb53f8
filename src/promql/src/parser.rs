//! PromQL parser bridge
//!
//! Parsing is delegated to the promql-parser crate, whose tree is then
//! converted into the [`ASTNode`] model used by the serializer and tree views.
//! Durations, offsets and `@` timestamps are carried over in milliseconds.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use promql_parser::label::{MatchOp, Matcher};
use promql_parser::parser::{
    self, AtModifier, BinModifier, Expr, LabelModifier, Offset,
    VectorMatchCardinality as ParserCardinality,
};

use crate::ast::{
    ASTNode, Aggregation, AggregationOp, BinaryExpr, BinaryOp, Call, Func, LabelMatcher,
    MatchType, MatrixSelector, NumberLiteral, ParenExpr, StringLiteral, Subquery, TimeAnchor,
    UnaryExpr, UnaryOp, VectorMatchCardinality, VectorMatching, VectorSelector,
};
use crate::error::PromQLError;
use crate::serialize::serialize;

/// Parse a PromQL query string into an AST
///
/// # Examples
/// ```
/// use promql::parser::parse;
///
/// let expr = parse(r#"sum by (job) (rate(http_requests_total{job="api"}[5m]))"#).unwrap();
/// assert_eq!(expr.kind(), "aggregation");
/// ```
pub fn parse(query: &str) -> Result<ASTNode, PromQLError> {
    let expr = parser::parse(query).map_err(|e| PromQLError::ParseError(e.to_string()))?;
    let ast = convert(&expr)?;
    log::debug!("Parsed PromQL query into a {} node", ast.kind());
    Ok(ast)
}

/// Check if a query string is syntactically valid
pub fn validate(query: &str) -> Result<(), PromQLError> {
    parse(query).map(|_| ())
}

/// Parse `query` and render it back in canonical form
pub fn format(query: &str, pretty: bool, indent: usize) -> Result<String, PromQLError> {
    let ast = parse(query)?;
    Ok(serialize(&ast, indent, pretty, true))
}

/// Convert a promql-parser expression into an AST
pub fn convert(expr: &Expr) -> Result<ASTNode, PromQLError> {
    let node = match expr {
        Expr::Aggregate(agg) => {
            let (grouping, without) = match &agg.modifier {
                Some(LabelModifier::Include(labels)) => (labels.labels.clone(), false),
                Some(LabelModifier::Exclude(labels)) => (labels.labels.clone(), true),
                None => (Vec::new(), false),
            };
            ASTNode::Aggregation(Aggregation {
                op: agg.op.to_string().parse::<AggregationOp>()?,
                expr: Box::new(convert(&agg.expr)?),
                param: agg
                    .param
                    .as_deref()
                    .map(convert)
                    .transpose()?
                    .map(Box::new),
                grouping,
                without,
            })
        }
        Expr::Unary(unary) => ASTNode::UnaryExpr(UnaryExpr {
            op: UnaryOp::Neg,
            expr: Box::new(convert(&unary.expr)?),
        }),
        Expr::Binary(bin) => ASTNode::BinaryExpr(BinaryExpr {
            op: bin.op.to_string().parse::<BinaryOp>()?,
            lhs: Box::new(convert(&bin.lhs)?),
            rhs: Box::new(convert(&bin.rhs)?),
            matching: bin.modifier.as_ref().and_then(convert_vector_matching),
            bool_modifier: bin.modifier.as_ref().is_some_and(|m| m.return_bool),
        }),
        Expr::Paren(paren) => ASTNode::ParenExpr(ParenExpr {
            expr: Box::new(convert(&paren.expr)?),
        }),
        Expr::Subquery(sq) => ASTNode::Subquery(Subquery {
            expr: Box::new(convert(&sq.expr)?),
            range: duration_ms(&sq.range),
            step: sq.step.as_ref().map(duration_ms).unwrap_or(0),
            offset: offset_ms(sq.offset.as_ref()),
            anchor: sq.at.as_ref().map(convert_at),
        }),
        Expr::NumberLiteral(number) => ASTNode::NumberLiteral(NumberLiteral {
            val: format_number(number.val),
        }),
        Expr::StringLiteral(string) => ASTNode::StringLiteral(StringLiteral {
            val: string.val.clone(),
        }),
        Expr::VectorSelector(vs) => ASTNode::VectorSelector(VectorSelector {
            name: vs.name.clone().unwrap_or_default(),
            matchers: convert_matchers(vs)?,
            offset: offset_ms(vs.offset.as_ref()),
            anchor: vs.at.as_ref().map(convert_at),
        }),
        Expr::MatrixSelector(ms) => ASTNode::MatrixSelector(MatrixSelector {
            name: ms.vs.name.clone().unwrap_or_default(),
            matchers: convert_matchers(&ms.vs)?,
            range: duration_ms(&ms.range),
            offset: offset_ms(ms.vs.offset.as_ref()),
            anchor: ms.vs.at.as_ref().map(convert_at),
        }),
        Expr::Call(call) => ASTNode::Call(Call {
            func: Func::named(call.func.name),
            args: call
                .args
                .args
                .iter()
                .map(|arg| convert(arg))
                .collect::<Result<_, _>>()?,
        }),
        Expr::Extension(_) => {
            return Err(PromQLError::UnsupportedFeature(
                "extension expressions".to_string(),
            ));
        }
    };
    Ok(node)
}

fn convert_vector_matching(modifier: &BinModifier) -> Option<VectorMatching> {
    let (card, include) = match &modifier.card {
        ParserCardinality::OneToOne => (VectorMatchCardinality::OneToOne, Vec::new()),
        ParserCardinality::ManyToMany => (VectorMatchCardinality::ManyToMany, Vec::new()),
        ParserCardinality::ManyToOne(labels) => {
            (VectorMatchCardinality::ManyToOne, labels.labels.clone())
        }
        ParserCardinality::OneToMany(labels) => {
            (VectorMatchCardinality::OneToMany, labels.labels.clone())
        }
    };
    let grouped = matches!(
        card,
        VectorMatchCardinality::ManyToOne | VectorMatchCardinality::OneToMany
    );

    match &modifier.matching {
        Some(LabelModifier::Include(labels)) => Some(VectorMatching {
            card,
            labels: labels.labels.clone(),
            on: true,
            include,
        }),
        Some(LabelModifier::Exclude(labels)) if grouped || !labels.labels.is_empty() => {
            Some(VectorMatching {
                card,
                labels: labels.labels.clone(),
                on: false,
                include,
            })
        }
        // `ignoring()` matches like no clause at all
        Some(LabelModifier::Exclude(_)) | None if !grouped => None,
        _ => Some(VectorMatching {
            card,
            labels: Vec::new(),
            on: false,
            include,
        }),
    }
}

fn convert_matchers(vs: &parser::VectorSelector) -> Result<Vec<LabelMatcher>, PromQLError> {
    if !vs.matchers.or_matchers.is_empty() {
        return Err(PromQLError::UnsupportedFeature(
            "`or` between label matchers".to_string(),
        ));
    }
    Ok(vs.matchers.matchers.iter().map(convert_matcher).collect())
}

fn convert_matcher(matcher: &Matcher) -> LabelMatcher {
    let match_type = match &matcher.op {
        MatchOp::Equal => MatchType::Equal,
        MatchOp::NotEqual => MatchType::NotEqual,
        MatchOp::Re(_) => MatchType::RegexMatch,
        MatchOp::NotRe(_) => MatchType::RegexNotMatch,
    };

    LabelMatcher {
        match_type,
        name: matcher.name.clone(),
        value: matcher.value.clone(),
    }
}

fn convert_at(at: &AtModifier) -> TimeAnchor {
    match at {
        AtModifier::Start => TimeAnchor::Start,
        AtModifier::End => TimeAnchor::End,
        AtModifier::At(time) => TimeAnchor::Fixed(system_time_ms(*time)),
    }
}

fn system_time_ms(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(since) => duration_ms(&since),
        Err(before) => -duration_ms(&before.duration()),
    }
}

fn duration_ms(duration: &Duration) -> i64 {
    duration.as_millis() as i64
}

fn offset_ms(offset: Option<&Offset>) -> i64 {
    match offset {
        Some(Offset::Pos(d)) => duration_ms(d),
        Some(Offset::Neg(d)) => -duration_ms(d),
        None => 0,
    }
}

/// Text for a parsed number, in a form the parser reads back to the same value
fn format_number(val: f64) -> String {
    if val.is_nan() {
        "NaN".to_string()
    } else if val == f64::INFINITY {
        "Inf".to_string()
    } else if val == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        val.to_string()
    }
}

/// Extract label matchers from an AST
///
/// This is useful for understanding what labels a query is filtering on.
pub fn extract_matchers(ast: &ASTNode) -> Vec<LabelMatcher> {
    let mut result = Vec::new();
    collect_matchers_recursive(ast, &mut result);
    result
}

fn collect_matchers_recursive(ast: &ASTNode, result: &mut Vec<LabelMatcher>) {
    match ast {
        ASTNode::VectorSelector(vs) => result.extend(vs.matchers.iter().cloned()),
        ASTNode::MatrixSelector(ms) => result.extend(ms.matchers.iter().cloned()),
        other => {
            for child in other.children() {
                collect_matchers_recursive(child, result);
            }
        }
    }
}

fn metric_name<'a>(name: &'a str, matchers: &'a [LabelMatcher]) -> Option<&'a str> {
    matchers
        .iter()
        .find(|m| m.name == "__name__" && m.match_type == MatchType::Equal)
        .map(|m| m.value.as_str())
        .or(Some(name).filter(|name| !name.is_empty()))
}

/// Extract all metric names referenced in an AST
///
/// Only names that are selected by exact match are returned, in source order.
pub fn extract_metric_names(ast: &ASTNode) -> Vec<String> {
    let mut names = Vec::new();
    collect_metric_names_recursive(ast, &mut names);
    names
}

fn collect_metric_names_recursive(ast: &ASTNode, names: &mut Vec<String>) {
    let name = match ast {
        ASTNode::VectorSelector(vs) => metric_name(&vs.name, &vs.matchers),
        ASTNode::MatrixSelector(ms) => metric_name(&ms.name, &ms.matchers),
        other => {
            for child in other.children() {
                collect_metric_names_recursive(child, names);
            }
            return;
        }
    };
    if let Some(name) = name {
        names.push(name.to_string());
    }
}

/// Check if an AST contains a range vector (matrix selector)
///
/// Range vectors are required for functions like rate(), irate(), etc.
pub fn has_range_vector(ast: &ASTNode) -> bool {
    match ast {
        ASTNode::MatrixSelector(_) => true,
        other => other.children().into_iter().any(has_range_vector),
    }
}

/// What a query selects, as listed under its tree view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryInfo {
    pub metric_names: Vec<String>,
    pub matchers: Vec<LabelMatcher>,
    pub range_vector: bool,
}

impl QueryInfo {
    pub fn of(ast: &ASTNode) -> Self {
        Self {
            metric_names: extract_metric_names(ast),
            matchers: extract_matchers(ast),
            range_vector: has_range_vector(ast),
        }
    }
}

impl fmt::Display for QueryInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let matchers: Vec<String> = self.matchers.iter().map(LabelMatcher::to_string).collect();
        writeln!(f, "metrics: {}", self.metric_names.join(", "))?;
        writeln!(f, "matchers: {}", matchers.join(", "))?;
        writeln!(f, "range vector: {}", self.range_vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_metric() {
        let ast = parse("http_requests_total").unwrap();
        assert_eq!(ast, ASTNode::selector("http_requests_total"));
    }

    #[test]
    fn test_parse_metric_with_labels() {
        let ast = parse(r#"http_requests_total{job="api", method="GET"}"#).unwrap();
        let ASTNode::VectorSelector(vs) = ast else {
            panic!("Expected VectorSelector");
        };
        // the metric name is kept apart from the matchers
        assert_eq!(vs.name, "http_requests_total");
        assert_eq!(
            vs.matchers,
            vec![
                LabelMatcher::equal("job", "api"),
                LabelMatcher::equal("method", "GET")
            ]
        );
    }

    #[test]
    fn test_parse_rate_function() {
        let ast = parse("rate(http_requests_total[5m])").unwrap();
        let ASTNode::Call(call) = &ast else {
            panic!("Expected Call");
        };
        assert_eq!(call.func, Func::named("rate"));
        assert!(has_range_vector(&ast));
        assert!(matches!(
            &call.args[0],
            ASTNode::MatrixSelector(ms) if ms.range == 5 * 60 * 1000
        ));
    }

    #[test]
    fn test_parse_aggregation() {
        let ast = parse("sum by (job, le)(rate(http_requests_total[5m]))").unwrap();
        let ASTNode::Aggregation(agg) = ast else {
            panic!("Expected Aggregation");
        };
        assert_eq!(agg.op, AggregationOp::Sum);
        assert_eq!(agg.grouping, vec!["job", "le"]);
        assert!(!agg.without);

        let ast = parse("topk without (instance) (5, up)").unwrap();
        let ASTNode::Aggregation(agg) = ast else {
            panic!("Expected Aggregation");
        };
        assert!(agg.without);
        assert_eq!(agg.param.as_deref(), Some(&ASTNode::number("5")));
    }

    #[test]
    fn test_parse_binary_expression() {
        let ast = parse("http_requests_total / http_requests_failed").unwrap();
        assert_eq!(
            ast,
            ASTNode::binary(
                BinaryOp::Div,
                ASTNode::selector("http_requests_total"),
                ASTNode::selector("http_requests_failed")
            )
        );
    }

    #[test]
    fn test_parse_vector_matching() {
        let ast = parse("a * on (instance) group_left (version) b").unwrap();
        let ASTNode::BinaryExpr(bin) = ast else {
            panic!("Expected BinaryExpr");
        };
        assert_eq!(
            bin.matching,
            Some(VectorMatching {
                card: VectorMatchCardinality::ManyToOne,
                labels: vec!["instance".to_string()],
                on: true,
                include: vec!["version".to_string()],
            })
        );

        let ast = parse("a > bool 1").unwrap();
        assert!(matches!(ast, ASTNode::BinaryExpr(bin) if bin.bool_modifier && bin.op == BinaryOp::Gtr));
    }

    #[test]
    fn test_parse_complex_query() {
        let query = r#"
            histogram_quantile(0.95,
                sum by (le)(
                    rate(http_request_duration_seconds_bucket{job="api"}[5m])
                )
            )
        "#;
        let ast = parse(query).unwrap();
        assert_eq!(ast.kind(), "call");
        assert_eq!(
            extract_metric_names(&ast),
            vec!["http_request_duration_seconds_bucket"]
        );
    }

    #[test]
    fn test_parse_invalid_query() {
        let result = parse("http_requests_total{job=}");
        assert!(matches!(result, Err(PromQLError::ParseError(_))));
    }

    #[test]
    fn test_parse_regex_matcher() {
        let ast = parse(r#"http_requests_total{job=~"api.*"}"#).unwrap();
        let matchers = extract_matchers(&ast);
        let job_matcher = matchers.iter().find(|m| m.name == "job").unwrap();
        assert_eq!(job_matcher.match_type, MatchType::RegexMatch);
        assert_eq!(job_matcher.value, "api.*");
    }

    #[test]
    fn test_parse_negative_matcher() {
        let ast = parse(r#"http_requests_total{job!="internal"}"#).unwrap();
        let matchers = extract_matchers(&ast);
        let job_matcher = matchers.iter().find(|m| m.name == "job").unwrap();
        assert_eq!(job_matcher.match_type, MatchType::NotEqual);
    }

    #[test]
    fn test_extract_metric_names() {
        let ast = parse(r#"http_requests_total + {__name__="http_errors_total"}"#).unwrap();
        assert_eq!(
            extract_metric_names(&ast),
            vec!["http_requests_total", "http_errors_total"]
        );
    }

    #[test]
    fn test_query_info() {
        let ast = parse(r#"sum(rate(http_requests_total{job="api"}[5m])) / up{job!~"test.*"}"#)
            .unwrap();
        let info = QueryInfo::of(&ast);
        assert_eq!(info.metric_names, vec!["http_requests_total", "up"]);
        assert!(info.range_vector);
        assert_eq!(
            info.to_string(),
            "metrics: http_requests_total, up\n\
             matchers: job=\"api\", job!~\"test.*\"\n\
             range vector: true\n"
        );

        let info = QueryInfo::of(&parse("time()").unwrap());
        assert_eq!(info.to_string(), "metrics: \nmatchers: \nrange vector: false\n");
    }

    #[test]
    fn test_validate() {
        assert!(validate("http_requests_total").is_ok());
        assert!(validate("rate(x[5m])").is_ok());
        assert!(validate("http_requests_total{").is_err());
        assert!(validate("rate(x[])").is_err());
    }

    #[test]
    fn test_parse_with_offset_and_at() {
        let ast = parse("http_requests_total @ 1609459200 offset -5m").unwrap();
        let ASTNode::VectorSelector(vs) = ast else {
            panic!("Expected VectorSelector");
        };
        assert_eq!(vs.offset, -300_000);
        assert_eq!(vs.anchor, Some(TimeAnchor::Fixed(1_609_459_200_000)));

        let ast = parse("http_requests_total @ start()").unwrap();
        assert!(matches!(ast, ASTNode::VectorSelector(vs) if vs.anchor == Some(TimeAnchor::Start)));
    }

    #[test]
    fn test_parse_subquery() {
        let ast = parse("rate(http_requests_total[5m])[30m:1m]").unwrap();
        let ASTNode::Subquery(sq) = ast else {
            panic!("Expected Subquery");
        };
        assert_eq!(sq.range, 30 * 60 * 1000);
        assert_eq!(sq.step, 60 * 1000);

        let ast = parse("max_over_time(up[1h:])").unwrap();
        assert!(!has_range_vector(&ast));
    }

    #[test]
    fn test_format() {
        assert_eq!(
            format("sum  by(job)(rate(x[300s]))", false, 0).unwrap(),
            "sum by(job) (rate(x[5m]))"
        );
        assert_eq!(
            format("(a+b)*c", false, 0).unwrap(),
            "(a + b) * c"
        );
        assert_eq!(format("a / b", true, 0).unwrap(), "  a\n/\n  b");
    }

    #[test]
    fn test_number_text() {
        assert_eq!(format_number(0.95), "0.95");
        assert_eq!(format_number(31.0), "31");
        assert_eq!(format_number(f64::INFINITY), "Inf");
        assert_eq!(format_number(f64::NAN), "NaN");
    }
}
