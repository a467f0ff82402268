//! Provenance-tracking rewrite pipeline for the Tove syntax tree.
//!
//! Rewrite passes transform a compilation's trees before and during
//! compilation; this crate lets any position in the transformed trees be
//! resolved back to its original user-authored position, or reported as
//! hidden when the code was synthesized. Each pass works against a fresh
//! *generation*: the tree is tagged with identity annotations, every
//! annotated element is recorded in a process-wide weak store, and the
//! resolver climbs those records across arbitrarily many generations.
//!
//! Provenance reflects only whether an annotation survived a structural
//! transformation. Renamed or duplicated subtrees are not tracked, and a
//! synthesized node deriving from several originals maps to none of them.

mod cancel;
mod pass;
mod store;
mod track;
mod tree;


pub use cancel::{CancellationToken, Cancelled};
pub use pass::{
    Compilation, CompilationRewriteContext, HostOptions, ParseCallback, RewriteAction,
    RewritePass, RewritePassContext, run_rewrites,
};
pub use store::ProvenanceStore;
pub use track::annotate;
pub use tree::TrackedTree;
