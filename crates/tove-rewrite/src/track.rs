//! Element tagging and provenance recording.

use text_size::TextSize;
use tove_syntax::{
    GreenNode, GreenToken, NodeOrToken, SyntaxAnnotation, SyntaxTree, WalkEvent,
};

use crate::cancel::{CancellationToken, Cancelled};
use crate::store::Origin;
use crate::tree::TrackedTree;

/// Returns a copy of `tree` in which every node, and every token with a
/// nonzero significant width, carries exactly one identity annotation.
///
/// Idempotent: elements that already carry an annotation keep it, and fully
/// annotated subtrees are returned by reference, so annotating an annotated
/// tree yields the identical root green. Zero-width tokens have no observable
/// source range and are never annotated.
pub fn annotate(tree: &SyntaxTree, cancellation: &CancellationToken) -> Result<SyntaxTree, Cancelled> {
    Ok(match annotate_node(tree.green_root(), cancellation)? {
        Some(root) => tree.with_root(root),
        None => tree.clone(),
    })
}

/// Annotates a node's subtree, returning `None` when nothing changed.
fn annotate_node(
    node: &GreenNode,
    cancellation: &CancellationToken,
) -> Result<Option<GreenNode>, Cancelled> {
    cancellation.check()?;

    let mut new_children = None;
    for (index, child) in node.children().iter().enumerate() {
        let replacement = match child {
            NodeOrToken::Node(node) => annotate_node(node, cancellation)?.map(NodeOrToken::Node),
            NodeOrToken::Token(token) => annotate_token(token).map(NodeOrToken::Token),
        };
        if let Some(replacement) = replacement {
            new_children.get_or_insert_with(|| node.children().to_vec())[index] = replacement;
        }
    }

    let rebuilt = new_children.map(|children| node.with_children(children));
    Ok(match (rebuilt, node.annotation()) {
        (Some(rebuilt), Some(_)) => Some(rebuilt),
        (Some(rebuilt), None) => Some(rebuilt.with_annotation(SyntaxAnnotation::fresh())),
        (None, Some(_)) => None,
        (None, None) => Some(node.with_annotation(SyntaxAnnotation::fresh())),
    })
}

fn annotate_token(token: &GreenToken) -> Option<GreenToken> {
    if token.width() == TextSize::new(0) || token.annotation().is_some() {
        return None;
    }
    Some(token.with_annotation(SyntaxAnnotation::fresh()))
}

/// Records every annotated element of `tracked`'s tree as that annotation's
/// origin, depth first, first writer wins.
///
/// Only meaningful for the exact tree instance produced by [`annotate`]:
/// recording a later edited copy silently breaks the provenance chain, which
/// is why this runs solely inside [`TrackedTree::track_in`].
pub(crate) fn record(tracked: &TrackedTree, cancellation: &CancellationToken) -> Result<(), Cancelled> {
    let store = tracked.store();
    let owner = tracked.downgrade();

    for event in tracked.root().preorder_with_tokens() {
        cancellation.check()?;
        match event {
            WalkEvent::Enter(node) => {
                if let Some(annotation) = node.annotation() {
                    store.insert_node(
                        annotation,
                        Origin {
                            tree: owner.clone(),
                            range: node.range(),
                            trimmed_range: node.trimmed_range(),
                        },
                    );
                }
            }
            WalkEvent::Token(token) => {
                if let Some(annotation) = token.annotation() {
                    store.insert_token(
                        annotation,
                        Origin {
                            tree: owner.clone(),
                            range: token.range(),
                            trimmed_range: token.trimmed_range(),
                        },
                    );
                }
            }
            WalkEvent::Leave(_) => {}
        }
    }
    Ok(())
}
