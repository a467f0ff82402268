//! Generation wrapper: a syntax tree plus its rewrite state, with position
//! resolution across the provenance chain.

use std::fmt;
use std::sync::{Arc, Weak};

use camino::Utf8Path;
use text_size::{TextRange, TextSize};
use tove_syntax::{
    GreenNode, LineVisibility, MappedLineSpan, SourceKind, SyntaxNode, SyntaxTree,
};

use crate::cancel::{CancellationToken, Cancelled};
use crate::store::ProvenanceStore;
use crate::track;

/// One generation in a rewrite chain.
///
/// A generation is either a *baseline* (the tree exactly as tagging produced
/// it, or a plain wrapped tree) or *rewritten* (its root has diverged from
/// that baseline). Rewritten is terminal for an instance: further edits
/// produce new generations, themselves rewritten relative to whatever fed
/// them. The wrapper is substitutable for a plain tree: same root access,
/// same span and line queries, so downstream consumers never see tracking.
///
/// Each generation holds the generation it was derived from, so a live tree
/// keeps its entire provenance chain reachable; recorded origins only go
/// stale once no derived tree remains.
#[derive(Clone)]
pub struct TrackedTree(Arc<TrackedTreeData>);

pub(crate) struct TrackedTreeData {
    tree: SyntaxTree,
    rewritten: bool,
    store: &'static ProvenanceStore,
    derived_from: Option<TrackedTree>,
}

impl TrackedTree {
    /// Wraps a tree without tagging or recording anything.
    ///
    /// Position queries on such a wrapper answer directly from the tree, the
    /// same as a plain tree would.
    pub fn new(tree: SyntaxTree) -> Self {
        Self(Arc::new(TrackedTreeData {
            tree,
            rewritten: false,
            store: ProvenanceStore::global(),
            derived_from: None,
        }))
    }

    /// Tags `tree`, records provenance, and wraps the result as a baseline
    /// generation, using the process-wide store.
    pub fn track(tree: &SyntaxTree, cancellation: &CancellationToken) -> Result<Self, Cancelled> {
        Self::track_in(ProvenanceStore::global(), tree, cancellation)
    }

    /// Like [`track`](Self::track), against an explicit store.
    pub fn track_in(
        store: &'static ProvenanceStore,
        tree: &SyntaxTree,
        cancellation: &CancellationToken,
    ) -> Result<Self, Cancelled> {
        Self::track_with(store, tree, None, cancellation)
    }

    fn track_with(
        store: &'static ProvenanceStore,
        tree: &SyntaxTree,
        derived_from: Option<TrackedTree>,
        cancellation: &CancellationToken,
    ) -> Result<Self, Cancelled> {
        let tagged = track::annotate(tree, cancellation)?;
        let tracked = Self(Arc::new(TrackedTreeData {
            tree: tagged,
            rewritten: false,
            store,
            derived_from,
        }));
        track::record(&tracked, cancellation)?;
        Ok(tracked)
    }

    /// Re-tags the current tree and wraps it as the next pass's baseline.
    ///
    /// Existing annotations are kept and their recorded origins are untouched,
    /// so spans surviving several passes still resolve to the earliest
    /// generation; only newly synthesized elements gain fresh annotations
    /// recorded against the new baseline.
    pub fn retrack(&self, cancellation: &CancellationToken) -> Result<Self, Cancelled> {
        Self::track_with(self.0.store, &self.0.tree, Some(self.clone()), cancellation)
    }

    /// Returns a generation with a new root.
    ///
    /// The result is rewritten if this generation already was, or if `root`
    /// differs (by identity) from this generation's root.
    pub fn with_root(&self, root: GreenNode) -> Self {
        let rewritten = self.0.rewritten || !GreenNode::ptr_eq(&root, self.0.tree.green_root());
        Self(Arc::new(TrackedTreeData {
            tree: self.0.tree.with_root(root),
            rewritten,
            store: self.0.store,
            derived_from: Some(self.clone()),
        }))
    }

    /// Returns a generation with a new file path, keeping the rewrite state.
    pub fn with_path(&self, path: impl Into<camino::Utf8PathBuf>) -> Self {
        Self(Arc::new(TrackedTreeData {
            tree: self.0.tree.with_path(path),
            rewritten: self.0.rewritten,
            store: self.0.store,
            derived_from: Some(self.clone()),
        }))
    }

    pub fn root(&self) -> SyntaxNode {
        self.0.tree.root()
    }

    /// Returns the underlying tree.
    pub fn tree(&self) -> &SyntaxTree {
        &self.0.tree
    }

    pub fn path(&self) -> &Utf8Path {
        self.0.tree.path()
    }

    pub fn source_kind(&self) -> SourceKind {
        self.0.tree.source_kind()
    }

    pub fn text(&self) -> &str {
        self.0.tree.text()
    }

    /// Returns `true` once this generation's root has diverged from its
    /// tagged baseline.
    pub fn is_rewritten(&self) -> bool {
        self.0.rewritten
    }

    /// Returns `true` if both handles refer to the same generation.
    pub fn ptr_eq(left: &Self, right: &Self) -> bool {
        Arc::ptr_eq(&left.0, &right.0)
    }

    /// Returns the generation this one was derived from, if any.
    pub fn derived_from(&self) -> Option<&TrackedTree> {
        self.0.derived_from.as_ref()
    }

    pub(crate) fn store(&self) -> &'static ProvenanceStore {
        self.0.store
    }

    pub(crate) fn downgrade(&self) -> Weak<TrackedTreeData> {
        Arc::downgrade(&self.0)
    }

    pub(crate) fn upgrade(weak: &Weak<TrackedTreeData>) -> Option<Self> {
        weak.upgrade().map(Self)
    }

    /// Resolves `span` to its original generation and span.
    ///
    /// Walks the provenance chain to the earliest generation with a live
    /// mapping. `None` means the region cannot be traced to original source
    /// and must be treated as hidden — an expected outcome, not a fault.
    pub fn original_span(
        &self,
        span: TextRange,
        cancellation: &CancellationToken,
    ) -> Result<Option<(TrackedTree, TextRange)>, Cancelled> {
        cancellation.check()?;
        if !self.0.rewritten {
            // A baseline *is* the original.
            return Ok(Some((self.clone(), span)));
        }
        match self.original_span_step(span, cancellation)? {
            Some((tree, original)) => tree.original_span(original, cancellation),
            None => Ok(None),
        }
    }

    /// One resolution hop: finds the element of this tree covering `span` and
    /// looks its annotation up in the store.
    fn original_span_step(
        &self,
        span: TextRange,
        cancellation: &CancellationToken,
    ) -> Result<Option<(TrackedTree, TextRange)>, Cancelled> {
        debug_assert!(self.0.rewritten);

        let root = self.root();
        let Some(token) = root.find_token(span.start()) else {
            return Ok(None);
        };
        if token.width() == TextSize::new(0) {
            // Synthesized placeholder; nothing to trace.
            return Ok(None);
        }

        if token.range().contains_range(span) {
            let origin = token
                .annotation()
                .and_then(|annotation| self.0.store.token_origin(annotation));
            return Ok(origin.map(|origin| {
                let original =
                    if token.range() == span { origin.range } else { origin.trimmed_range };
                (origin.tree, original)
            }));
        }

        // `span` straddles tokens: climb to the nearest annotated ancestor
        // with a live origin. An ancestor that lost its record does not end
        // the walk; an outer one may still carry provenance.
        for node in token.parent().ancestors() {
            cancellation.check()?;
            if !node.range().contains_range(span) {
                continue;
            }
            let Some(origin) =
                node.annotation().and_then(|annotation| self.0.store.node_origin(annotation))
            else {
                continue;
            };
            let original = if node.range() == span { origin.range } else { origin.trimmed_range };
            return Ok(Some((origin.tree, original)));
        }

        Ok(None)
    }

    /// Maps `span` to file/line/column coordinates in the earliest generation
    /// that can still account for it.
    ///
    /// A region with no live mapping reports this tree's physical coordinates
    /// with `hidden` set: once a tree is rewritten, only lines traceable to
    /// the original tree may be visible.
    pub fn mapped_line_span(
        &self,
        span: TextRange,
        cancellation: &CancellationToken,
    ) -> Result<MappedLineSpan, Cancelled> {
        cancellation.check()?;
        if self.0.rewritten {
            if let Some((tree, original)) = self.original_span_step(span, cancellation)? {
                return tree.mapped_line_span(original, cancellation);
            }
        }

        let mut mapped = self.0.tree.mapped_line_span(span);
        mapped.hidden |= self.0.rewritten;
        Ok(mapped)
    }

    /// Returns the visibility of `position` for line-directive-driven tooling.
    pub fn line_visibility(
        &self,
        position: TextSize,
        cancellation: &CancellationToken,
    ) -> Result<LineVisibility, Cancelled> {
        cancellation.check()?;
        if self.0.rewritten {
            return match self.original_span_step(TextRange::empty(position), cancellation)? {
                Some((tree, original)) => tree.line_visibility(original.start(), cancellation),
                None => Ok(LineVisibility::Hidden),
            };
        }
        Ok(self.0.tree.line_visibility(position))
    }
}

impl fmt::Debug for TrackedTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedTree")
            .field("path", &self.path())
            .field("rewritten", &self.0.rewritten)
            .finish_non_exhaustive()
    }
}
