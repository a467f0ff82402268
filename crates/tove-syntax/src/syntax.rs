//! Public syntax tree API: an owning tree plus red cursors with parent links
//! and absolute offsets, computed on demand from the green layer.

use std::fmt;
use std::fmt::Write as _;
use std::sync::OnceLock;

use camino::{Utf8Path, Utf8PathBuf};
use text_size::{TextRange, TextSize};

use crate::green::{GreenElement, GreenNode, GreenToken, NodeOrToken};
use crate::position::{LineIndex, LineVisibility, MappedLineSpan};
use crate::{SyntaxAnnotation, SyntaxKind};

/// Parse settings the host configured for a tree.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SourceKind {
    Regular,
    Script,
}

/// Owned syntax tree for a single source file.
#[derive(Clone)]
pub struct SyntaxTree {
    data: triomphe::Arc<TreeData>,
}

struct TreeData {
    root: GreenNode,
    path: Utf8PathBuf,
    source_kind: SourceKind,
    text: OnceLock<Box<str>>,
    line_index: OnceLock<LineIndex>,
}

impl SyntaxTree {
    pub fn new(root: GreenNode, path: impl Into<Utf8PathBuf>, source_kind: SourceKind) -> Self {
        Self {
            data: triomphe::Arc::new(TreeData {
                root,
                path: path.into(),
                source_kind,
                text: OnceLock::new(),
                line_index: OnceLock::new(),
            }),
        }
    }

    /// Returns the root syntax node.
    pub fn root(&self) -> SyntaxNode {
        SyntaxNode {
            data: triomphe::Arc::new(NodeData {
                parent: None,
                index: 0,
                offset: TextSize::new(0),
                green: self.data.root.clone(),
            }),
        }
    }

    /// Returns the root green node.
    pub fn green_root(&self) -> &GreenNode {
        &self.data.root
    }

    pub fn path(&self) -> &Utf8Path {
        &self.data.path
    }

    pub fn source_kind(&self) -> SourceKind {
        self.data.source_kind
    }

    /// Returns the full source text, assembled from the green tokens.
    pub fn text(&self) -> &str {
        self.data.text.get_or_init(|| {
            let mut text = String::with_capacity(usize::from(self.text_len()));
            collect_text(&self.data.root, &mut text);
            text.into_boxed_str()
        })
    }

    pub fn text_len(&self) -> TextSize {
        self.data.root.text_len()
    }

    fn line_index(&self) -> &LineIndex {
        self.data.line_index.get_or_init(|| LineIndex::new(self.text()))
    }

    /// Returns a tree with a new root, keeping path and parse settings.
    pub fn with_root(&self, root: GreenNode) -> Self {
        Self::new(root, self.data.path.clone(), self.data.source_kind)
    }

    /// Returns a tree with a new file path, sharing the root.
    pub fn with_path(&self, path: impl Into<Utf8PathBuf>) -> Self {
        Self::new(self.data.root.clone(), path, self.data.source_kind)
    }

    /// Maps `span` to physical file/line/column coordinates.
    ///
    /// A plain tree has no rewrite history, so the result is never hidden.
    pub fn mapped_line_span(&self, span: TextRange) -> MappedLineSpan {
        let index = self.line_index();
        MappedLineSpan {
            path: self.data.path.clone(),
            start: index.line_col(span.start()),
            end: index.line_col(span.end()),
            hidden: false,
        }
    }

    /// Returns the visibility of `position`; always visible for a plain tree.
    pub fn line_visibility(&self, _position: TextSize) -> LineVisibility {
        LineVisibility::Visible
    }
}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("path", &self.path())
            .field("text_len", &self.text_len())
            .finish_non_exhaustive()
    }
}

/// Node cursor: a green node plus its absolute position and parent link.
#[derive(Clone)]
pub struct SyntaxNode {
    data: triomphe::Arc<NodeData>,
}

struct NodeData {
    parent: Option<SyntaxNode>,
    /// Index of this node in its parent's green children.
    index: usize,
    offset: TextSize,
    green: GreenNode,
}

impl PartialEq for SyntaxNode {
    fn eq(&self, other: &Self) -> bool {
        GreenNode::ptr_eq(&self.data.green, &other.data.green)
            && self.data.offset == other.data.offset
    }
}

impl Eq for SyntaxNode {}

impl SyntaxNode {
    pub fn kind(&self) -> SyntaxKind {
        self.data.green.kind()
    }

    pub fn green(&self) -> &GreenNode {
        &self.data.green
    }

    pub fn annotation(&self) -> Option<SyntaxAnnotation> {
        self.data.green.annotation()
    }

    /// Returns the range covered by this node, trivia included.
    pub fn range(&self) -> TextRange {
        TextRange::at(self.data.offset, self.data.green.text_len())
    }

    /// Returns the range with leading/trailing trivia trimmed away.
    pub fn trimmed_range(&self) -> TextRange {
        match (self.first_token(), self.last_token()) {
            (Some(first), Some(last)) => {
                TextRange::new(first.trimmed_range().start(), last.trimmed_range().end())
            }
            _ => TextRange::empty(self.data.offset),
        }
    }

    /// Returns the parent node if any.
    pub fn parent(&self) -> Option<Self> {
        self.data.parent.clone()
    }

    /// Returns an iterator of ancestors starting from this node.
    pub fn ancestors(&self) -> impl Iterator<Item = SyntaxNode> + use<> {
        std::iter::successors(Some(self.clone()), SyntaxNode::parent)
    }

    /// Iterates children including tokens.
    pub fn children_with_tokens(&self) -> SyntaxElementChildren {
        SyntaxElementChildren { parent: self.clone(), index: 0, offset: self.data.offset }
    }

    /// Iterates child nodes, skipping tokens.
    pub fn children(&self) -> impl Iterator<Item = SyntaxNode> + use<> {
        self.children_with_tokens().filter_map(NodeOrToken::into_node)
    }

    /// Returns the first token spanned by this node, if any.
    pub fn first_token(&self) -> Option<SyntaxToken> {
        let mut node = self.clone();
        loop {
            match node.children_with_tokens().next()? {
                NodeOrToken::Node(child) => node = child,
                NodeOrToken::Token(token) => return Some(token),
            }
        }
    }

    /// Returns the last token spanned by this node, if any.
    pub fn last_token(&self) -> Option<SyntaxToken> {
        let mut node = self.clone();
        loop {
            match node.children_with_tokens().last()? {
                NodeOrToken::Node(child) => node = child,
                NodeOrToken::Token(token) => return Some(token),
            }
        }
    }

    /// Returns the token whose full range contains `offset`.
    ///
    /// An offset on the boundary between two tokens belongs to the right one;
    /// the very end of the node maps to its last token.
    pub fn find_token(&self, offset: TextSize) -> Option<SyntaxToken> {
        if !self.range().contains_inclusive(offset) {
            return None;
        }
        let mut node = self.clone();
        loop {
            let mut pick: Option<GreenElement> = None;
            let mut pick_index = 0;
            let mut pick_offset = node.data.offset;

            let mut child_offset = node.data.offset;
            for (index, child) in node.data.green.children().iter().enumerate() {
                let end = child_offset + child.text_len();
                let is_last = index + 1 == node.data.green.children().len();
                if offset < end || (is_last && offset == end) {
                    pick = Some(child.clone());
                    pick_index = index;
                    pick_offset = child_offset;
                    break;
                }
                child_offset = end;
            }

            match pick? {
                NodeOrToken::Node(green) => {
                    node = Self {
                        data: triomphe::Arc::new(NodeData {
                            parent: Some(node.clone()),
                            index: pick_index,
                            offset: pick_offset,
                            green,
                        }),
                    };
                }
                NodeOrToken::Token(green) => {
                    return Some(SyntaxToken {
                        parent: node.clone(),
                        index: pick_index,
                        offset: pick_offset,
                        green,
                    });
                }
            }
        }
    }

    /// Replaces this node's subtree and returns the new root green node.
    ///
    /// Every node on the spine from here to the root is rebuilt; all other
    /// subtrees are shared with the original tree by reference.
    pub fn replace_with(&self, replacement: GreenNode) -> GreenNode {
        match &self.data.parent {
            None => replacement,
            Some(parent) => {
                let new_parent = parent
                    .data
                    .green
                    .replace_child(self.data.index, NodeOrToken::Node(replacement));
                parent.replace_with(new_parent)
            }
        }
    }

    /// Returns a preorder iterator over nodes and tokens.
    pub fn preorder_with_tokens(&self) -> PreorderWithTokens {
        PreorderWithTokens { stack: Vec::with_capacity(16), root: Some(self.clone()) }
    }

    /// Renders the subtree structure, one element per line.
    pub fn debug_dump(&self) -> String {
        let mut out = String::new();
        let mut depth = 0usize;
        for event in self.preorder_with_tokens() {
            match event {
                WalkEvent::Enter(node) => {
                    let range = node.range();
                    writeln!(out, "{:indent$}{:?}@{range:?}", "", node.kind(), indent = depth * 2)
                        .expect("writing to String cannot fail");
                    depth += 1;
                }
                WalkEvent::Leave(_) => depth -= 1,
                WalkEvent::Token(token) => {
                    let range = token.range();
                    writeln!(
                        out,
                        "{:indent$}{:?}@{range:?} {:?}",
                        "",
                        token.kind(),
                        token.text(),
                        indent = depth * 2
                    )
                    .expect("writing to String cannot fail");
                }
            }
        }
        out
    }
}

impl fmt::Debug for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?}", self.kind(), self.range())
    }
}

/// Token cursor tied to its parent node.
#[derive(Clone)]
pub struct SyntaxToken {
    parent: SyntaxNode,
    /// Index of this token in its parent's green children.
    index: usize,
    offset: TextSize,
    green: GreenToken,
}

impl PartialEq for SyntaxToken {
    fn eq(&self, other: &Self) -> bool {
        GreenToken::ptr_eq(&self.green, &other.green) && self.offset == other.offset
    }
}

impl Eq for SyntaxToken {}

impl SyntaxToken {
    pub fn kind(&self) -> SyntaxKind {
        self.green.kind()
    }

    pub fn green(&self) -> &GreenToken {
        &self.green
    }

    pub fn annotation(&self) -> Option<SyntaxAnnotation> {
        self.green.annotation()
    }

    /// Returns the significant width, zero for synthesized placeholders.
    pub fn width(&self) -> TextSize {
        self.green.width()
    }

    /// Returns the token range including attached trivia.
    pub fn range(&self) -> TextRange {
        TextRange::at(self.offset, self.green.text_len())
    }

    /// Returns the token range excluding trivia.
    pub fn trimmed_range(&self) -> TextRange {
        TextRange::new(
            self.offset + self.green.leading().len(),
            self.offset + self.green.text_len() - self.green.trailing().len(),
        )
    }

    /// Returns the token text including trivia.
    pub fn text(&self) -> &str {
        self.green.text()
    }

    /// Returns the parent node.
    pub fn parent(&self) -> SyntaxNode {
        self.parent.clone()
    }

    /// Replaces this token and returns the new root green node.
    pub fn replace_with(&self, replacement: GreenToken) -> GreenNode {
        let new_parent =
            self.parent.data.green.replace_child(self.index, NodeOrToken::Token(replacement));
        self.parent.replace_with(new_parent)
    }
}

impl fmt::Debug for SyntaxToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?} {:?}", self.kind(), self.range(), self.text())
    }
}

/// Node or token element inside the tree.
pub type SyntaxElement = NodeOrToken<SyntaxNode, SyntaxToken>;

impl SyntaxElement {
    pub fn range(&self) -> TextRange {
        match self {
            NodeOrToken::Node(node) => node.range(),
            NodeOrToken::Token(token) => token.range(),
        }
    }

    pub fn kind(&self) -> SyntaxKind {
        match self {
            NodeOrToken::Node(node) => node.kind(),
            NodeOrToken::Token(token) => token.kind(),
        }
    }
}

/// Iterator over a node's children including tokens.
#[derive(Clone)]
pub struct SyntaxElementChildren {
    parent: SyntaxNode,
    index: usize,
    offset: TextSize,
}

impl Iterator for SyntaxElementChildren {
    type Item = SyntaxElement;

    fn next(&mut self) -> Option<Self::Item> {
        let green = self.parent.data.green.children().get(self.index)?.clone();
        let index = self.index;
        let offset = self.offset;
        self.index += 1;
        self.offset += green.text_len();

        Some(match green {
            NodeOrToken::Node(green) => NodeOrToken::Node(SyntaxNode {
                data: triomphe::Arc::new(NodeData {
                    parent: Some(self.parent.clone()),
                    index,
                    offset,
                    green,
                }),
            }),
            NodeOrToken::Token(green) => {
                NodeOrToken::Token(SyntaxToken { parent: self.parent.clone(), index, offset, green })
            }
        })
    }
}

/// Preorder traversal over nodes and tokens.
pub struct PreorderWithTokens {
    stack: Vec<(SyntaxNode, SyntaxElementChildren)>,
    root: Option<SyntaxNode>,
}

impl PreorderWithTokens {
    /// Skips the current subtree during traversal.
    pub fn skip_subtree(&mut self) {
        assert!(self.stack.pop().is_some(), "must have a subtree to skip");
    }
}

impl Iterator for PreorderWithTokens {
    type Item = WalkEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let Some((_, active_node)) = self.stack.last_mut() else {
            let root = self.root.take()?;
            self.stack.push((root.clone(), root.children_with_tokens()));
            return Some(WalkEvent::Enter(root));
        };
        match active_node.next() {
            Some(NodeOrToken::Node(child)) => {
                self.stack.push((child.clone(), child.children_with_tokens()));
                Some(WalkEvent::Enter(child))
            }
            Some(NodeOrToken::Token(child)) => Some(WalkEvent::Token(child)),
            None => {
                let (exited_node, _) = self.stack.pop().expect("should have an exited-from node");
                Some(WalkEvent::Leave(exited_node))
            }
        }
    }
}

/// Preorder walk event including tokens.
#[derive(Clone)]
pub enum WalkEvent {
    Enter(SyntaxNode),
    Leave(SyntaxNode),
    Token(SyntaxToken),
}

fn collect_text(node: &GreenNode, out: &mut String) {
    for child in node.children() {
        match child {
            NodeOrToken::Node(node) => collect_text(node, out),
            NodeOrToken::Token(token) => out.push_str(token.text()),
        }
    }
}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use super::*;
    use crate::green::{TriviaPiece, TriviaPieceKind};
    use crate::position::LineCol;
    use crate::{Builder, GreenTrivia};

    fn ws(len: u32) -> TriviaPiece {
        TriviaPiece::new(TriviaPieceKind::Whitespace, len.into())
    }

    fn newline(len: u32) -> TriviaPiece {
        TriviaPiece::new(TriviaPieceKind::Newline, len.into())
    }

    /// Two statements, `let x = 1` and `let y = 2`, one per line.
    fn sample_tree() -> SyntaxTree {
        let mut builder = Builder::new();
        builder.start_node(SyntaxKind::SOURCE_FILE);
        for (name, value) in [("x ", "1\n"), ("y ", "2\n")] {
            builder.start_node(SyntaxKind::LET_STMT);
            builder.token_with_trivia(&[], SyntaxKind::LET_KW, "let ", &[ws(1)]);
            builder.token_with_trivia(&[], SyntaxKind::NAME, name, &[ws(1)]);
            builder.token_with_trivia(&[], SyntaxKind::EQ, "= ", &[ws(1)]);
            builder.token_with_trivia(&[], SyntaxKind::NUMBER, value, &[newline(1)]);
            builder.finish_node();
        }
        builder.finish_node();
        SyntaxTree::new(builder.finish(), "main.tove", SourceKind::Regular)
    }

    #[test]
    fn dump_and_text() {
        let tree = sample_tree();
        assert_eq!(tree.text(), "let x = 1\nlet y = 2\n");
        expect![[r#"
            SOURCE_FILE@0..20
              LET_STMT@0..10
                LET_KW@0..4 "let "
                NAME@4..6 "x "
                EQ@6..8 "= "
                NUMBER@8..10 "1\n"
              LET_STMT@10..20
                LET_KW@10..14 "let "
                NAME@14..16 "y "
                EQ@16..18 "= "
                NUMBER@18..20 "2\n"
        "#]]
        .assert_eq(&tree.root().debug_dump());
    }

    #[test]
    fn find_token_at_offset() {
        let tree = sample_tree();
        let root = tree.root();

        let name = root.find_token(5.into()).unwrap();
        assert_eq!(name.kind(), SyntaxKind::NAME);
        assert_eq!(name.range(), TextRange::new(4.into(), 6.into()));
        assert_eq!(name.trimmed_range(), TextRange::new(4.into(), 5.into()));

        // Boundary offsets belong to the token on the right.
        let eq = root.find_token(6.into()).unwrap();
        assert_eq!(eq.kind(), SyntaxKind::EQ);

        // The very end of the tree maps to the last token.
        let last = root.find_token(20.into()).unwrap();
        assert_eq!(last.range(), TextRange::new(18.into(), 20.into()));
    }

    #[test]
    fn trimmed_ranges_strip_trivia() {
        let tree = sample_tree();
        let stmt = tree.root().children().next().unwrap();
        assert_eq!(stmt.range(), TextRange::new(0.into(), 10.into()));
        assert_eq!(stmt.trimmed_range(), TextRange::new(0.into(), 9.into()));
    }

    #[test]
    fn replace_token_shares_untouched_subtrees() {
        let tree = sample_tree();
        let root = tree.root();
        let first_stmt = root.children().next().unwrap();
        let number = root.find_token(18.into()).unwrap();
        assert_eq!(number.kind(), SyntaxKind::NUMBER);

        let replacement = GreenToken::new(
            GreenTrivia::empty(),
            SyntaxKind::NUMBER,
            "3\n".into(),
            GreenTrivia::new(&[newline(1)]),
        );
        let edited = tree.with_root(number.replace_with(replacement));

        assert_eq!(edited.text(), "let x = 1\nlet y = 3\n");
        let edited_first = edited.root().children().next().unwrap();
        assert!(GreenNode::ptr_eq(edited_first.green(), first_stmt.green()));
    }

    #[test]
    fn physical_line_mapping() {
        let tree = sample_tree();
        let mapped = tree.mapped_line_span(TextRange::new(10.into(), 19.into()));
        assert_eq!(mapped.path, "main.tove");
        assert_eq!(mapped.start, LineCol { line: 1, col: 0 });
        assert_eq!(mapped.end, LineCol { line: 1, col: 9 });
        assert!(!mapped.hidden);
        assert_eq!(tree.line_visibility(12.into()), LineVisibility::Visible);
    }
}
