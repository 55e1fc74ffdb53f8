//! Decide which completion scopes apply at a cursor position.

use tempo_api::TagScope;

use super::{CompletionScope, Completions};
use crate::syntax::{NodeKind, SyntaxNav, SyntaxTree};

/// Identify completion scopes and the insertion offset from the node at `pos`.
///
/// The node is resolved leftward: a node ending exactly at the cursor wins over one starting
/// there, so `{status=|` resolves to the value position rather than the closing brace.
pub fn identify_completions<T: SyntaxTree>(
    source: &str,
    pos: usize,
    tree: &T,
) -> Option<Completions> {
    let node = tree.resolve_inner(pos)?;
    let completions = match node.kind() {
        // {  or  {}  but not after the closing brace
        NodeKind::SpansetFilter => {
            let body_is_empty = node
                .first_child()
                .is_none_or(|child| child.kind() == NodeKind::Error);
            (body_is_empty && !slice(source, node.from(), pos).contains('}'))
                .then(|| Completions::new(field_scopes(), pos))
        }
        // { status=ok &&
        NodeKind::FieldExpression => Some(Completions::new(field_scopes(), pos)),
        NodeKind::AttributeField => {
            attribute_scopes(source, &node).map(|scopes| Completions::new(scopes, pos))
        }
        NodeKind::Identifier => identifier_completions(source, &node),
        // { status=
        NodeKind::FieldOp => {
            let attribute = node.parent()?.first_child()?;
            (attribute.kind() == NodeKind::FieldExpression)
                .then(|| Completions::new(vec![tag_value(source, &attribute)], pos))
        }
        // { name="  but not after the closing quote
        NodeKind::String => {
            let attribute = node.parent()?.parent()?.parent()?.first_child()?;
            (attribute.kind() == NodeKind::FieldExpression
                && !is_quoted(slice(source, node.from(), pos)))
            .then(|| Completions::new(vec![tag_value(source, &attribute)], node.from() + 1))
        }
        NodeKind::Error => error_completions(source, &node),
        _ => None,
    };

    log::debug!("Completion scopes at {pos}: {completions:?}");
    completions
}

/// Scope qualifiers and intrinsics, valid wherever a new field can start
fn field_scopes() -> Vec<CompletionScope> {
    vec![
        CompletionScope::Scopes,
        CompletionScope::tag_name(TagScope::Intrinsic),
    ]
}

/// `resource.`, `span.` or a bare `.`
fn attribute_scopes<N: SyntaxNav>(source: &str, node: &N) -> Option<Vec<CompletionScope>> {
    match node.first_child().map(|child| child.kind()) {
        Some(NodeKind::Resource) => Some(vec![CompletionScope::tag_name(TagScope::Resource)]),
        Some(NodeKind::Span) => Some(vec![CompletionScope::tag_name(TagScope::Span)]),
        _ if slice(source, node.from(), node.to()) == "." => Some(unscoped()),
        _ => None,
    }
}

fn unscoped() -> Vec<CompletionScope> {
    vec![
        CompletionScope::tag_name(TagScope::Resource),
        CompletionScope::tag_name(TagScope::Span),
    ]
}

/// A partially typed attribute name; the completion replaces what was typed so far
fn identifier_completions<N: SyntaxNav>(source: &str, node: &N) -> Option<Completions> {
    let parent = node.parent()?;
    if parent.kind() != NodeKind::AttributeField {
        return None;
    }

    // only intrinsics have a colon in their name, e.g. span:status
    if slice(source, parent.from(), parent.to()).contains(':') {
        return Some(Completions::new(
            vec![CompletionScope::tag_name(TagScope::Intrinsic)],
            parent.from(),
        ));
    }

    let scopes = match parent.first_child()?.kind() {
        NodeKind::Resource => vec![CompletionScope::tag_name(TagScope::Resource)],
        NodeKind::Span => vec![CompletionScope::tag_name(TagScope::Span)],
        // .foo, the dot is not a visible child
        NodeKind::Identifier => unscoped(),
        _ => return None,
    };
    Some(Completions::new(scopes, node.from()))
}

fn error_completions<N: SyntaxNav>(source: &str, node: &N) -> Option<Completions> {
    let parent = node.parent()?;

    // { status=e  or  { name="HT
    let after_operator = node
        .prev_sibling()
        .is_some_and(|sibling| sibling.kind() == NodeKind::FieldOp);
    let attribute = parent
        .first_child()
        .filter(|child| child.kind() == NodeKind::FieldExpression);
    if let (true, Some(attribute)) = (after_operator, attribute) {
        let from = if slice(source, node.from(), node.from() + 1) == "\"" {
            node.from() + 1
        } else {
            node.from()
        };
        return Some(Completions::new(vec![tag_value(source, &attribute)], from));
    }

    // { s  or  { status=ok && s
    matches!(
        parent.kind(),
        NodeKind::SpansetFilter | NodeKind::FieldExpression
    )
    .then(|| Completions::new(field_scopes(), node.from()))
}

fn tag_value<N: SyntaxNav>(source: &str, attribute: &N) -> CompletionScope {
    CompletionScope::tag_value(slice(source, attribute.from(), attribute.to()))
}

/// Whether the text is a string literal with both quotes, on a single line
fn is_quoted(text: &str) -> bool {
    text.len() >= 2
        && text.starts_with('"')
        && text.ends_with('"')
        && !text[1..text.len() - 1].contains('\n')
}

fn slice(source: &str, from: usize, to: usize) -> &str {
    source.get(from..to).unwrap_or("")
}
