//! Line/column surface shared by plain and tracked trees.

use camino::Utf8PathBuf;
pub use line_index::{LineCol, LineIndex};

/// Whether a line participates in line-directive-driven tooling.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LineVisibility {
    Visible,
    Hidden,
}

/// A span mapped to file/line/column coordinates.
///
/// `hidden` marks a region that cannot be traced to original source; the
/// physical coordinates are still reported so callers can show *something*,
/// but tooling that honors visibility must skip the region.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MappedLineSpan {
    pub path: Utf8PathBuf,
    pub start: LineCol,
    pub end: LineCol,
    pub hidden: bool,
}
