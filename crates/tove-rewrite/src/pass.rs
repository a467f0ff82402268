//! Registration contract for rewrite passes and the driver that runs them.

use std::fmt;

use camino::Utf8Path;
use rustc_hash::FxHashMap;
use tove_syntax::{SourceKind, SyntaxTree};

use crate::cancel::{CancellationToken, Cancelled};
use crate::tree::TrackedTree;

/// The compilation being rewritten: an immutable, ordered collection of
/// syntax trees. Every mutation produces a new value.
#[derive(Clone, Debug, Default)]
pub struct Compilation {
    trees: Vec<TrackedTree>,
}

impl Compilation {
    pub fn new(trees: impl IntoIterator<Item = SyntaxTree>) -> Self {
        Self { trees: trees.into_iter().map(TrackedTree::new).collect() }
    }

    pub fn syntax_trees(&self) -> &[TrackedTree] {
        &self.trees
    }

    /// Returns a compilation with `tree` appended.
    pub fn add_syntax_tree(&self, tree: TrackedTree) -> Self {
        let mut trees = self.trees.clone();
        trees.push(tree);
        Self { trees }
    }

    /// Returns a compilation with `old` (matched by identity) replaced by `new`.
    pub fn replace_syntax_tree(&self, old: &TrackedTree, new: TrackedTree) -> Self {
        let trees = self
            .trees
            .iter()
            .map(|tree| if TrackedTree::ptr_eq(tree, old) { new.clone() } else { tree.clone() })
            .collect();
        Self { trees }
    }

    /// Tags and records every tree, wrapping each as a fresh baseline.
    pub(crate) fn tracked(&self, cancellation: &CancellationToken) -> Result<Self, Cancelled> {
        let trees = self
            .trees
            .iter()
            .map(|tree| tree.retrack(cancellation))
            .collect::<Result<_, _>>()?;
        Ok(Self { trees })
    }
}

/// String key/value options supplied by the host.
#[derive(Clone, Debug, Default)]
pub struct HostOptions {
    values: FxHashMap<String, String>,
}

impl HostOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }
}

/// Parses an auxiliary file into a tree using host-configured settings,
/// returning `None` when the file cannot be parsed.
pub type ParseCallback<'a> = dyn Fn(&Utf8Path, SourceKind) -> Option<SyntaxTree> + Sync + 'a;

/// A registered rewrite: consumes the previous compilation state and
/// produces the next one.
pub type RewriteAction =
    Box<dyn Fn(CompilationRewriteContext<'_>) -> Result<Compilation, Cancelled> + Send + Sync>;

/// A rewrite pass registers its rewrite callbacks against this context.
///
/// A pass contributes rewrites and nothing else; diagnostics are a separate
/// capability that does not pass through here.
pub trait RewritePass {
    fn register(&self, context: &mut RewritePassContext);
}

/// Per-compilation registration context handed to each pass.
pub struct RewritePassContext {
    options: HostOptions,
    cancellation: CancellationToken,
    rewrites: Vec<RewriteAction>,
}

impl RewritePassContext {
    pub fn new(options: HostOptions, cancellation: CancellationToken) -> Self {
        Self { options, cancellation, rewrites: Vec::new() }
    }

    pub fn options(&self) -> &HostOptions {
        &self.options
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Registers a rewrite callback; callbacks run in registration order.
    pub fn register_rewrite(
        &mut self,
        rewrite: impl Fn(CompilationRewriteContext<'_>) -> Result<Compilation, Cancelled>
        + Send
        + Sync
        + 'static,
    ) {
        self.rewrites.push(Box::new(rewrite));
    }
}

/// Everything a rewrite callback may see while it runs.
pub struct CompilationRewriteContext<'a> {
    compilation: Compilation,
    options: &'a HostOptions,
    cancellation: &'a CancellationToken,
    parse: &'a ParseCallback<'a>,
}

impl<'a> CompilationRewriteContext<'a> {
    pub fn compilation(&self) -> &Compilation {
        &self.compilation
    }

    pub fn into_compilation(self) -> Compilation {
        self.compilation
    }

    pub fn options(&self) -> &'a HostOptions {
        self.options
    }

    pub fn cancellation(&self) -> &'a CancellationToken {
        self.cancellation
    }

    /// Parses `path` with the host's parse settings for the given kind.
    pub fn parse(&self, path: &Utf8Path, kind: SourceKind) -> Option<SyntaxTree> {
        (self.parse)(path, kind)
    }
}

impl fmt::Debug for CompilationRewriteContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompilationRewriteContext")
            .field("compilation", &self.compilation)
            .finish_non_exhaustive()
    }
}

/// Runs every rewrite registered by `passes` against `compilation`.
///
/// Passes register in slice order and callbacks run in registration order,
/// each consuming the previous callback's output. Before each callback the
/// driver re-tracks every tree — tag, record, wrap as the next baseline — so
/// edits made by the callback are resolvable against what it was handed.
pub fn run_rewrites(
    passes: &[&dyn RewritePass],
    compilation: Compilation,
    options: &HostOptions,
    parse: &ParseCallback<'_>,
    cancellation: &CancellationToken,
) -> Result<Compilation, Cancelled> {
    let mut context = RewritePassContext::new(options.clone(), cancellation.clone());
    for pass in passes {
        pass.register(&mut context);
    }

    let mut compilation = compilation;
    for rewrite in &context.rewrites {
        cancellation.check()?;
        compilation = compilation.tracked(cancellation)?;
        compilation = rewrite(CompilationRewriteContext {
            compilation,
            options,
            cancellation,
            parse,
        })?;
    }
    Ok(compilation)
}
