//! Process-wide weak association from identity annotations to the elements
//! they were recorded from.
//!
//! Entries hold only a [`Weak`] reference to the owning generation, so a
//! recorded origin dies with its generation; lookups of a dead entry report
//! absence, exactly like a missing one. Dead entries are swept opportunistically
//! when a table grows past its watermark, and eagerly via [`ProvenanceStore::prune`].

use std::sync::{LazyLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use rustc_hash::FxHashMap;
use text_size::TextRange;
use tove_syntax::SyntaxAnnotation;

use crate::tree::{TrackedTree, TrackedTreeData};

/// A recorded origin: the generation that owned the element when it was
/// recorded, plus the element's extents within that generation.
pub(crate) struct Origin {
    pub(crate) tree: Weak<TrackedTreeData>,
    /// Extent including trivia (the element's full span).
    pub(crate) range: TextRange,
    /// Significant extent (the element's span).
    pub(crate) trimmed_range: TextRange,
}

/// An origin whose generation is still alive.
pub(crate) struct LiveOrigin {
    pub(crate) tree: TrackedTree,
    pub(crate) range: TextRange,
    pub(crate) trimmed_range: TextRange,
}

const PRUNE_FLOOR: usize = 64;

#[derive(Default)]
struct OriginTable {
    entries: FxHashMap<SyntaxAnnotation, Origin>,
    prune_at: usize,
}

impl OriginTable {
    /// First writer wins; later inserts for the same annotation are no-ops.
    fn insert(&mut self, annotation: SyntaxAnnotation, origin: Origin) {
        if self.entries.len() >= self.prune_at.max(PRUNE_FLOOR) {
            self.sweep();
        }
        self.entries.entry(annotation).or_insert(origin);
    }

    fn get(&self, annotation: SyntaxAnnotation) -> Option<LiveOrigin> {
        let origin = self.entries.get(&annotation)?;
        let tree = TrackedTree::upgrade(&origin.tree)?;
        Some(LiveOrigin { tree, range: origin.range, trimmed_range: origin.trimmed_range })
    }

    fn sweep(&mut self) {
        self.entries.retain(|_, origin| origin.tree.strong_count() > 0);
        self.prune_at = (self.entries.len() * 2).max(PRUNE_FLOOR);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Weak associative store keyed by identity annotation, with separate node
/// and token tables.
///
/// Safe for concurrent readers and concurrent first-writer-wins inserts:
/// both contenders for one annotation observe success, exactly one write is
/// kept, and the losing origin is simply dropped.
#[derive(Default)]
pub struct ProvenanceStore {
    nodes: RwLock<OriginTable>,
    tokens: RwLock<OriginTable>,
}

impl ProvenanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide store used by default.
    pub fn global() -> &'static Self {
        static GLOBAL: LazyLock<ProvenanceStore> = LazyLock::new(ProvenanceStore::new);
        &GLOBAL
    }

    pub(crate) fn insert_node(&self, annotation: SyntaxAnnotation, origin: Origin) {
        write_lock(&self.nodes).insert(annotation, origin);
    }

    pub(crate) fn insert_token(&self, annotation: SyntaxAnnotation, origin: Origin) {
        write_lock(&self.tokens).insert(annotation, origin);
    }

    pub(crate) fn node_origin(&self, annotation: SyntaxAnnotation) -> Option<LiveOrigin> {
        read_lock(&self.nodes).get(annotation)
    }

    pub(crate) fn token_origin(&self, annotation: SyntaxAnnotation) -> Option<LiveOrigin> {
        read_lock(&self.tokens).get(annotation)
    }

    /// Drops every entry whose originating generation has been dropped.
    pub fn prune(&self) {
        write_lock(&self.nodes).sweep();
        write_lock(&self.tokens).sweep();
    }

    /// Current entry counts for the (node, token) tables, dead entries included.
    pub fn entry_counts(&self) -> (usize, usize) {
        (read_lock(&self.nodes).len(), read_lock(&self.tokens).len())
    }
}

// The tables hold no invariants across entries, so a poisoned lock is usable.
fn read_lock(table: &RwLock<OriginTable>) -> RwLockReadGuard<'_, OriginTable> {
    table.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_lock(table: &RwLock<OriginTable>) -> RwLockWriteGuard<'_, OriginTable> {
    table.write().unwrap_or_else(PoisonError::into_inner)
}
