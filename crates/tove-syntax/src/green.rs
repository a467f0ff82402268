//! Green layer: immutable, structurally shared tree data.
//!
//! Green elements are plain `Arc` allocations, never interned. Structural
//! edits build new spines and reuse untouched subtrees by reference, so
//! pointer identity of a green element is meaningful across edits.

use std::fmt;

use text_size::TextSize;
use triomphe::{Arc, ThinArc};

use crate::{SyntaxAnnotation, SyntaxKind};

/// Node-or-token wrapper used throughout the API.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeOrToken<N, T> {
    Node(N),
    Token(T),
}

impl<N, T> NodeOrToken<N, T> {
    /// Converts into the node variant, if any.
    pub fn into_node(self) -> Option<N> {
        match self {
            NodeOrToken::Node(node) => Some(node),
            NodeOrToken::Token(_) => None,
        }
    }

    /// Converts into the token variant, if any.
    pub fn into_token(self) -> Option<T> {
        match self {
            NodeOrToken::Node(_) => None,
            NodeOrToken::Token(token) => Some(token),
        }
    }

    /// Returns a shared reference to the node, if any.
    pub fn as_node(&self) -> Option<&N> {
        match self {
            NodeOrToken::Node(node) => Some(node),
            NodeOrToken::Token(_) => None,
        }
    }

    /// Returns a shared reference to the token, if any.
    pub fn as_token(&self) -> Option<&T> {
        match self {
            NodeOrToken::Node(_) => None,
            NodeOrToken::Token(token) => Some(token),
        }
    }
}

/// Green child element.
pub type GreenElement = NodeOrToken<GreenNode, GreenToken>;

impl GreenElement {
    pub fn text_len(&self) -> TextSize {
        match self {
            NodeOrToken::Node(node) => node.text_len(),
            NodeOrToken::Token(token) => token.text_len(),
        }
    }

    pub fn kind(&self) -> SyntaxKind {
        match self {
            NodeOrToken::Node(node) => node.kind(),
            NodeOrToken::Token(token) => token.kind(),
        }
    }
}

/// Interior green node with ordered children.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct GreenNode {
    data: Arc<GreenNodeData>,
}

#[derive(PartialEq, Eq, Hash)]
struct GreenNodeData {
    kind: SyntaxKind,
    text_len: TextSize,
    annotation: Option<SyntaxAnnotation>,
    children: Vec<GreenElement>,
}

impl GreenNode {
    pub fn new(kind: SyntaxKind, children: Vec<GreenElement>) -> Self {
        let text_len = children.iter().map(GreenElement::text_len).sum();
        Self { data: Arc::new(GreenNodeData { kind, text_len, annotation: None, children }) }
    }

    pub fn kind(&self) -> SyntaxKind {
        self.data.kind
    }

    pub fn text_len(&self) -> TextSize {
        self.data.text_len
    }

    pub fn children(&self) -> &[GreenElement] {
        &self.data.children
    }

    pub fn annotation(&self) -> Option<SyntaxAnnotation> {
        self.data.annotation
    }

    /// Returns a copy of this node carrying `annotation`, sharing all children.
    pub fn with_annotation(&self, annotation: SyntaxAnnotation) -> Self {
        Self {
            data: Arc::new(GreenNodeData {
                kind: self.data.kind,
                text_len: self.data.text_len,
                annotation: Some(annotation),
                children: self.data.children.clone(),
            }),
        }
    }

    /// Returns a copy of this node with new children.
    ///
    /// The node's own annotation is kept: swapping children is an update of
    /// this node, not a replacement by a synthesized one.
    pub fn with_children(&self, children: Vec<GreenElement>) -> Self {
        let text_len = children.iter().map(GreenElement::text_len).sum();
        Self {
            data: Arc::new(GreenNodeData {
                kind: self.data.kind,
                text_len,
                annotation: self.data.annotation,
                children,
            }),
        }
    }

    /// Returns a copy of this node with the child at `index` replaced.
    pub fn replace_child(&self, index: usize, new_child: GreenElement) -> Self {
        let mut children = self.data.children.clone();
        children[index] = new_child;
        self.with_children(children)
    }

    /// Returns `true` if both handles refer to the same allocation.
    pub fn ptr_eq(left: &Self, right: &Self) -> bool {
        Arc::ptr_eq(&left.data, &right.data)
    }
}

impl fmt::Debug for GreenNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GreenNode")
            .field("kind", &self.kind())
            .field("text_len", &self.text_len())
            .field("children", &self.children().len())
            .finish()
    }
}

/// Leaf green token; its text includes attached leading and trailing trivia.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct GreenToken {
    data: Arc<GreenTokenData>,
}

#[derive(PartialEq, Eq, Hash)]
struct GreenTokenData {
    leading: GreenTrivia,
    kind: SyntaxKind,
    text: Box<str>,
    trailing: GreenTrivia,
    annotation: Option<SyntaxAnnotation>,
}

impl GreenToken {
    pub fn new(leading: GreenTrivia, kind: SyntaxKind, text: Box<str>, trailing: GreenTrivia) -> Self {
        debug_assert!(
            usize::from(leading.len() + trailing.len()) <= text.len(),
            "trivia longer than token text"
        );
        Self { data: Arc::new(GreenTokenData { leading, kind, text, trailing, annotation: None }) }
    }

    pub fn kind(&self) -> SyntaxKind {
        self.data.kind
    }

    /// Returns the token text including trivia.
    pub fn text(&self) -> &str {
        &self.data.text
    }

    pub fn text_len(&self) -> TextSize {
        TextSize::new(self.data.text.len() as u32)
    }

    /// Returns the significant width: the text length minus attached trivia.
    pub fn width(&self) -> TextSize {
        self.text_len() - self.data.leading.len() - self.data.trailing.len()
    }

    /// Returns the token text with leading and trailing trivia stripped.
    pub fn text_trimmed(&self) -> &str {
        let start: usize = self.data.leading.len().into();
        let end: usize = (self.text_len() - self.data.trailing.len()).into();
        &self.data.text[start..end]
    }

    pub fn leading(&self) -> &GreenTrivia {
        &self.data.leading
    }

    pub fn trailing(&self) -> &GreenTrivia {
        &self.data.trailing
    }

    pub fn annotation(&self) -> Option<SyntaxAnnotation> {
        self.data.annotation
    }

    /// Returns a copy of this token carrying `annotation`.
    pub fn with_annotation(&self, annotation: SyntaxAnnotation) -> Self {
        Self {
            data: Arc::new(GreenTokenData {
                leading: self.data.leading.clone(),
                kind: self.data.kind,
                text: self.data.text.clone(),
                trailing: self.data.trailing.clone(),
                annotation: Some(annotation),
            }),
        }
    }

    /// Returns `true` if both handles refer to the same allocation.
    pub fn ptr_eq(left: &Self, right: &Self) -> bool {
        Arc::ptr_eq(&left.data, &right.data)
    }
}

impl fmt::Debug for GreenToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GreenToken")
            .field("kind", &self.kind())
            .field("text", &self.text())
            .finish()
    }
}

#[derive(Clone, Eq, Hash, PartialEq)]
pub struct GreenTrivia {
    ptr: Option<ThinArc<TextSize, TriviaPiece>>,
}

impl fmt::Debug for GreenTrivia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GreenTrivia")
            .field("pieces", &self.pieces())
            .field("total_len", &self.len())
            .finish()
    }
}

impl GreenTrivia {
    pub fn new(pieces: &[TriviaPiece]) -> Self {
        let total_len = pieces.iter().map(|piece| piece.len).sum();
        Self { ptr: Some(ThinArc::from_header_and_slice(total_len, pieces)) }
    }

    pub const fn empty() -> Self {
        Self { ptr: None }
    }

    pub fn len(&self) -> TextSize {
        match self.ptr {
            None => TextSize::new(0),
            Some(ref ptr) => ptr.header.header,
        }
    }

    pub fn pieces(&self) -> &[TriviaPiece] {
        match &self.ptr {
            None => &[],
            Some(ptr) => &ptr.slice,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct TriviaPiece {
    pub kind: TriviaPieceKind,
    pub len: TextSize,
}

impl TriviaPiece {
    pub fn new(kind: TriviaPieceKind, len: TextSize) -> Self {
        Self { kind, len }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TriviaPieceKind {
    Whitespace,
    Newline,
    SingleLineComment,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whitespace(len: u32) -> GreenTrivia {
        GreenTrivia::new(&[TriviaPiece::new(TriviaPieceKind::Whitespace, len.into())])
    }

    #[test]
    fn token_text() {
        let token = GreenToken::new(
            whitespace(3),
            SyntaxKind::LET_KW,
            "\n\t let \t\t".into(),
            whitespace(3),
        );

        assert_eq!("\n\t let \t\t", token.text());
        assert_eq!("let", token.text_trimmed());
        assert_eq!(TextSize::new(3), token.width());
    }

    #[test]
    fn replace_child_shares_siblings() {
        let left = GreenToken::new(GreenTrivia::empty(), SyntaxKind::NAME, "x".into(), GreenTrivia::empty());
        let right = GreenToken::new(GreenTrivia::empty(), SyntaxKind::NUMBER, "1".into(), GreenTrivia::empty());
        let node = GreenNode::new(
            SyntaxKind::LET_STMT,
            vec![NodeOrToken::Token(left.clone()), NodeOrToken::Token(right)],
        );

        let new_right =
            GreenToken::new(GreenTrivia::empty(), SyntaxKind::NUMBER, "2".into(), GreenTrivia::empty());
        let edited = node.replace_child(1, NodeOrToken::Token(new_right));

        let kept = edited.children()[0].as_token().unwrap();
        assert!(GreenToken::ptr_eq(kept, &left));
        assert_eq!(edited.text_len(), TextSize::new(2));
    }

    #[test]
    fn annotation_survives_child_swap() {
        let token = GreenToken::new(GreenTrivia::empty(), SyntaxKind::NAME, "x".into(), GreenTrivia::empty());
        let node = GreenNode::new(SyntaxKind::LET_STMT, vec![NodeOrToken::Token(token)])
            .with_annotation(SyntaxAnnotation::fresh());

        let replacement =
            GreenToken::new(GreenTrivia::empty(), SyntaxKind::NAME, "y".into(), GreenTrivia::empty());
        let edited = node.replace_child(0, NodeOrToken::Token(replacement));

        assert_eq!(edited.annotation(), node.annotation());
    }
}
