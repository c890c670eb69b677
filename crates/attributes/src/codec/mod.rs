//! Line-oriented text persistence for container trees.
//!
//! ```text
//! [Player]
//! *hp:I(80,0,100)
//! #name:Hero
//! ^attack:F(12.5):
//! @gold:I(300)
//! [Player.bag[0]]
//! ...
//! ```
//!
//! Each container becomes a `[path]` section; the first path segment is the
//! root kind, child containers append `.name`, sequence items `.name[i]`.
//! Data lines are `sigil name ":" payload`:
//!
//! | sigil | holder | payload |
//! |---|---|---|
//! | `*` | [`BoundedValue`](crate::BoundedValue) | `T(current,min,max)` |
//! | `#` | [`ExString`](crate::ExString) | raw text up to end of line |
//! | `^` | [`ReactiveValue`](crate::ReactiveValue) | `T(base):` |
//! | `@` | [`ExNum`](crate::ExNum) | `T(value)` |
//!
//! `T` is `I`, `F` or `D` (i32, f32, f64). Numbers use Rust's
//! locale-independent `Display`/`FromStr`, so floats round-trip bit-exactly.

mod decode;
mod encode;
mod line;
mod path;

pub use decode::{load, load_from};
pub use encode::{encode, encode_with};
pub use path::{SectionPath, Segment};

pub(crate) use line::name_defect;

use crate::error::LoadError;

/// A problem found on one input line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadIssue {
    /// 1-based line number.
    pub line_no: usize,
    pub error: LoadError,
}

/// Outcome of a best-effort load.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Data lines applied to a holder.
    pub lines_applied: usize,
    /// Data lines skipped, including those inside skipped sections.
    pub lines_skipped: usize,
    /// Section headers that failed to resolve.
    pub sections_skipped: usize,
    pub issues: Vec<LoadIssue>,
    /// True once the whole blob was consumed; false only for empty input.
    pub success: bool,
}

impl LoadReport {
    /// True when every data line was applied.
    pub fn is_clean(&self) -> bool {
        self.success && self.issues.is_empty() && self.lines_skipped == 0
    }
}
