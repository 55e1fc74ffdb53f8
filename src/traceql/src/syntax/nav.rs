//! Narrow navigation interface over a syntax tree.
//!
//! The completion resolver only needs a handful of primitives, so it is written against
//! these traits rather than against rowan directly. Punctuation, operator and whitespace
//! tokens are invisible to navigation, as are the tokens swallowed by an `Error` node.

use rowan::NodeOrToken;

use super::kind::{SyntaxElement, SyntaxKind, SyntaxNode};

/// Node kinds the completion logic distinguishes between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    SpansetFilter,
    FieldExpression,
    AttributeField,
    Identifier,
    Resource,
    Span,
    FieldOp,
    String,
    Error,
    Other,
}

/// A node of a syntax tree, with source offsets in bytes
pub trait SyntaxNav: Clone {
    fn kind(&self) -> NodeKind;
    fn from(&self) -> usize;
    fn to(&self) -> usize;
    fn parent(&self) -> Option<Self>;
    fn first_child(&self) -> Option<Self>;
    fn prev_sibling(&self) -> Option<Self>;
}

pub trait SyntaxTree {
    type Node: SyntaxNav;

    /// Innermost node ending at or enclosing `pos`, preferring the node that ends at `pos`.
    /// Returns `None` when `pos` lies outside the tree.
    fn resolve_inner(&self, pos: usize) -> Option<Self::Node>;
}

/// Whether a node counts as enclosing `pos` when resolving towards the left
pub fn covers(from: usize, to: usize, pos: usize) -> bool {
    (from < pos && pos <= to) || (from == pos && to == pos)
}

/// A visible element of the rowan tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CstNode(SyntaxElement);

impl CstNode {
    pub fn element(&self) -> &SyntaxElement {
        &self.0
    }

    fn visible_children(&self) -> impl Iterator<Item = CstNode> + use<> {
        let children = match &self.0 {
            NodeOrToken::Node(node) => Some(node.children_with_tokens()),
            NodeOrToken::Token(_) => None,
        };
        children
            .into_iter()
            .flatten()
            .filter(is_visible)
            .map(CstNode)
    }
}

fn is_visible(element: &SyntaxElement) -> bool {
    match element {
        NodeOrToken::Node(_) => true,
        NodeOrToken::Token(token) => {
            token.kind().is_named_token()
                && token
                    .parent()
                    .is_none_or(|parent| parent.kind() != SyntaxKind::Error)
        }
    }
}

impl SyntaxNav for CstNode {
    fn kind(&self) -> NodeKind {
        match self.0.kind() {
            SyntaxKind::SpansetFilter => NodeKind::SpansetFilter,
            SyntaxKind::FieldExpression => NodeKind::FieldExpression,
            SyntaxKind::AttributeField => NodeKind::AttributeField,
            SyntaxKind::Identifier => NodeKind::Identifier,
            SyntaxKind::Resource => NodeKind::Resource,
            SyntaxKind::Span => NodeKind::Span,
            SyntaxKind::FieldOp => NodeKind::FieldOp,
            SyntaxKind::String => NodeKind::String,
            SyntaxKind::Error => NodeKind::Error,
            _ => NodeKind::Other,
        }
    }

    fn from(&self) -> usize {
        self.0.text_range().start().into()
    }

    fn to(&self) -> usize {
        self.0.text_range().end().into()
    }

    fn parent(&self) -> Option<Self> {
        self.0.parent().map(|node| CstNode(node.into()))
    }

    fn first_child(&self) -> Option<Self> {
        self.visible_children().next()
    }

    fn prev_sibling(&self) -> Option<Self> {
        let mut sibling = self.0.prev_sibling_or_token();
        while let Some(element) = sibling {
            if is_visible(&element) {
                return Some(CstNode(element));
            }
            sibling = element.prev_sibling_or_token();
        }
        None
    }
}

impl SyntaxTree for SyntaxNode {
    type Node = CstNode;

    fn resolve_inner(&self, pos: usize) -> Option<CstNode> {
        if pos > usize::from(self.text_range().end()) {
            return None;
        }

        let mut current = CstNode(self.clone().into());
        while let Some(child) = current
            .visible_children()
            .filter(|child| covers(child.from(), child.to(), pos))
            .last()
        {
            current = child;
        }
        Some(current)
    }
}
