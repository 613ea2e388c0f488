//! Literal substring replacement.

use serde::Deserialize;

use super::{Transform, TransformResult};

/// One `from -> to` pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Replacement {
    pub from: String,
    pub to: String,
}

impl Replacement {
    #[must_use]
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Replaces every occurrence of each marker in a single left-to-right scan.
///
/// All markers are matched against the original text, so a replacement is
/// never rescanned by a later pair. When two markers match at the same
/// offset the earlier pair wins. Pairs with an empty `from` are ignored.
/// With `ignore_case`, markers match regardless of ASCII case (useful for
/// origin URLs typed inconsistently).
#[derive(Debug, Clone, Default)]
pub struct LiteralReplace {
    replacements: Vec<Replacement>,
    ignore_case: bool,
}

impl LiteralReplace {
    #[must_use]
    pub fn new(replacements: Vec<Replacement>) -> Self {
        Self {
            replacements,
            ignore_case: false,
        }
    }

    #[must_use]
    pub fn ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    #[must_use]
    pub fn replacements(&self) -> &[Replacement] {
        &self.replacements
    }
}

impl Transform for LiteralReplace {
    fn name(&self) -> &'static str {
        "literal-replace"
    }

    fn apply(&self, content: &str) -> TransformResult {
        // ASCII lowercasing keeps byte offsets identical to `content`.
        let (haystack, needles): (String, Vec<String>) = if self.ignore_case {
            (
                content.to_ascii_lowercase(),
                self.replacements
                    .iter()
                    .map(|r| r.from.to_ascii_lowercase())
                    .collect(),
            )
        } else {
            (
                content.to_owned(),
                self.replacements.iter().map(|r| r.from.clone()).collect(),
            )
        };

        let mut out = String::with_capacity(content.len());
        let mut pos = 0;
        let mut total = 0;
        while let Some((start, idx)) = earliest_match(&haystack, &needles, pos) {
            out.push_str(&content[pos..start]);
            out.push_str(&self.replacements[idx].to);
            pos = start + needles[idx].len();
            total += 1;
        }
        if total == 0 {
            return TransformResult::unchanged(content);
        }
        out.push_str(&content[pos..]);
        TransformResult::from_content(content, out, total)
    }
}

/// Offset and pair index of the leftmost marker at or after `pos`.
fn earliest_match(haystack: &str, needles: &[String], pos: usize) -> Option<(usize, usize)> {
    needles
        .iter()
        .enumerate()
        .filter(|(_, needle)| !needle.is_empty())
        .filter_map(|(idx, needle)| haystack[pos..].find(needle.as_str()).map(|off| (pos + off, idx)))
        .min()
}
