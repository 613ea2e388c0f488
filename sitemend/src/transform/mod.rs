//! Content transformations.
//!
//! Every strategy implements [`Transform`]: a pure, total function from the
//! current file content to a [`TransformResult`]. Strategies never fail; a
//! missing anchor or marker simply produces an unchanged result.
//!
//! - `literal` — ordered `(from, to)` substring replacement
//! - `collapse` — blank-line and trailing-whitespace normalization
//! - `inject` — idempotent block insertion at an anchor tag
//! - `remove` — removal of an exact block

pub mod collapse;
pub mod inject;
pub mod literal;
pub mod remove;

use std::fmt::Debug;

pub use collapse::BlankLineCollapse;
pub use inject::{Anchor, Injection, Placement};
pub use literal::{LiteralReplace, Replacement};
pub use remove::Removal;

/// Outcome of applying a transform to one file's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformResult {
    /// Content before the transform.
    pub original: String,
    /// Content after the transform (equal to `original` when unchanged).
    pub content: String,
    /// Whether `content` differs from `original`.
    pub changed: bool,
    /// Number of substitutions, insertions or removals performed.
    pub substitutions: usize,
}

impl TransformResult {
    /// Result for a transform that left the content alone.
    #[must_use]
    pub fn unchanged(original: &str) -> Self {
        Self {
            original: original.to_owned(),
            content: original.to_owned(),
            changed: false,
            substitutions: 0,
        }
    }

    /// Result for new content; `changed` is derived from a byte comparison.
    #[must_use]
    pub fn from_content(original: &str, content: String, substitutions: usize) -> Self {
        let changed = content != original;
        Self {
            original: original.to_owned(),
            content,
            changed,
            substitutions: if changed { substitutions } else { 0 },
        }
    }
}

/// A content transformation strategy.
pub trait Transform: Debug {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Apply the transform to `content`. Must not panic on any input.
    fn apply(&self, content: &str) -> TransformResult;
}

/// Byte offset of the first ASCII case-insensitive occurrence of `needle`.
///
/// Lowercasing ASCII keeps byte offsets stable, so the offset is valid in
/// the original string.
pub(crate) fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    haystack
        .to_ascii_lowercase()
        .find(&needle.to_ascii_lowercase())
}
