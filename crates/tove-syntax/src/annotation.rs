use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque identity marker attachable to green elements.
///
/// Annotations are keys, never values: every call to [`SyntaxAnnotation::fresh`]
/// yields a marker distinct from all others issued in this process, and two
/// annotations compare equal only when they originate from the same call.
/// Ids are never reused.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct SyntaxAnnotation(NonZeroU64);

impl SyntaxAnnotation {
    /// Issues a fresh annotation.
    pub fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        let raw = NEXT.fetch_add(1, Ordering::Relaxed);
        Self(NonZeroU64::new(raw).expect("annotation id space exhausted"))
    }
}
