//! Immutable, structurally shared syntax tree for the Tove front end.
//!
//! Trees are built once and edited by producing new roots; every unedited
//! subtree is reused by reference, so green pointer identity is stable across
//! edits. Elements carry an optional opaque annotation that downstream
//! tooling uses to correlate them across rewrites.

mod annotation;
mod builder;
mod green;
mod position;
mod syntax;
mod syntax_kind;

/// Opaque identity marker attachable to tree elements.
pub use annotation::SyntaxAnnotation;
/// Event-based builder for green trees.
pub use builder::Builder;
/// Green layer types.
pub use green::{GreenElement, GreenNode, GreenToken, GreenTrivia, NodeOrToken, TriviaPiece, TriviaPieceKind};
/// Line/column mapping surface.
pub use position::{LineCol, LineIndex, LineVisibility, MappedLineSpan};
/// Primary syntax tree API types.
pub use syntax::{
    PreorderWithTokens, SourceKind, SyntaxElement, SyntaxElementChildren, SyntaxNode, SyntaxToken,
    SyntaxTree, WalkEvent,
};
/// Token and node kinds used throughout the tree.
pub use syntax_kind::SyntaxKind;
