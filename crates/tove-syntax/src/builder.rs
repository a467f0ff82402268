//! Builder for constructing green trees.

use crate::green::{GreenElement, GreenNode, GreenToken, GreenTrivia, NodeOrToken, TriviaPiece};
use crate::SyntaxKind;

/// Builds a green tree from start/finish events.
#[derive(Default)]
pub struct Builder {
    parents: Vec<(SyntaxKind, usize)>,
    children: Vec<GreenElement>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new node of the given kind.
    pub fn start_node(&mut self, kind: SyntaxKind) {
        self.parents.push((kind, self.children.len()));
    }

    /// Finishes the most recently started node.
    pub fn finish_node(&mut self) {
        let (kind, first_child) = self.parents.pop().expect("no started node");
        let node = GreenNode::new(kind, self.children.drain(first_child..).collect());
        self.children.push(NodeOrToken::Node(node));
    }

    /// Adds a token without attached trivia.
    pub fn token(&mut self, kind: SyntaxKind, text: &str) {
        self.children.push(NodeOrToken::Token(GreenToken::new(
            GreenTrivia::empty(),
            kind,
            text.into(),
            GreenTrivia::empty(),
        )));
    }

    /// Adds a token whose `text` includes its leading and trailing trivia.
    pub fn token_with_trivia(
        &mut self,
        leading: &[TriviaPiece],
        kind: SyntaxKind,
        text: &str,
        trailing: &[TriviaPiece],
    ) {
        let leading = if leading.is_empty() { GreenTrivia::empty() } else { GreenTrivia::new(leading) };
        let trailing =
            if trailing.is_empty() { GreenTrivia::empty() } else { GreenTrivia::new(trailing) };
        self.children.push(NodeOrToken::Token(GreenToken::new(leading, kind, text.into(), trailing)));
    }

    /// Finishes building and returns the root green node.
    pub fn finish(mut self) -> GreenNode {
        assert!(self.parents.is_empty(), "unfinished nodes remain");
        assert_eq!(self.children.len(), 1, "expected exactly one root");
        match self.children.pop().expect("root checked above") {
            NodeOrToken::Node(node) => node,
            NodeOrToken::Token(_) => panic!("root must be a node"),
        }
    }
}
