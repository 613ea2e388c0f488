//! Idempotent block insertion.

use super::{Transform, TransformResult, find_ignore_ascii_case};

/// Where the block goes relative to the anchor tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Insert the block (followed by a newline) right before the anchor.
    Before,
    /// Insert a newline and the block right after the anchor.
    After,
}

/// A tag used to locate the insertion point, matched ignoring ASCII case.
///
/// A tag without a closing `>` (such as `<head`) is treated as the start of
/// an opening tag. It only matches when followed by `>`, `/` or whitespace,
/// so `<head` does not match `<header>`. With [`Placement::After`] the block
/// lands after the tag's `>`, so attributes are preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub tag: String,
    pub placement: Placement,
}

impl Anchor {
    #[must_use]
    pub fn before(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            placement: Placement::Before,
        }
    }

    #[must_use]
    pub fn after(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            placement: Placement::After,
        }
    }

    /// Byte offset where a block should be inserted in `content`, if the tag is present.
    fn insertion_point(&self, content: &str) -> Option<usize> {
        let start = self.find(content)?;
        match self.placement {
            Placement::Before => Some(start),
            Placement::After => {
                let end = start + self.tag.len();
                if self.tag.ends_with('>') {
                    Some(end)
                } else {
                    content[end..].find('>').map(|gt| end + gt + 1)
                }
            }
        }
    }

    /// Offset of the first occurrence of the tag that is a whole tag name.
    fn find(&self, content: &str) -> Option<usize> {
        let open_tag = !self.tag.ends_with('>');
        let mut from = 0;
        loop {
            let start = from + find_ignore_ascii_case(&content[from..], &self.tag)?;
            let end = start + self.tag.len();
            let bounded = content[end..]
                .chars()
                .next()
                .is_some_and(|c| c == '>' || c == '/' || c.is_ascii_whitespace());
            if !open_tag || bounded {
                return Some(start);
            }
            from = end;
        }
    }
}

/// Inserts a fixed block at the first anchor found, unless the block is
/// already present anywhere in the content.
///
/// Anchors are tried in order; the first one present wins and only its
/// first occurrence is used. Without a matching anchor the content is left
/// alone, or the block is prepended when `prepend_if_missing` is set.
#[derive(Debug, Clone)]
pub struct Injection {
    block: String,
    anchors: Vec<Anchor>,
    prepend_if_missing: bool,
}

impl Injection {
    #[must_use]
    pub fn new(block: impl Into<String>, anchors: Vec<Anchor>) -> Self {
        Self {
            block: block.into(),
            anchors,
            prepend_if_missing: false,
        }
    }

    /// Inject right before `</head>`.
    #[must_use]
    pub fn before_head_close(block: impl Into<String>) -> Self {
        Self::new(block, vec![Anchor::before("</head>")])
    }

    #[must_use]
    pub fn prepend_if_missing(mut self, prepend: bool) -> Self {
        self.prepend_if_missing = prepend;
        self
    }

    #[must_use]
    pub fn block(&self) -> &str {
        &self.block
    }
}

impl Transform for Injection {
    fn name(&self) -> &'static str {
        "inject"
    }

    fn apply(&self, content: &str) -> TransformResult {
        if self.block.is_empty() || content.contains(&self.block) {
            return TransformResult::unchanged(content);
        }
        match insert_at_anchor(content, &self.block, &self.anchors, self.prepend_if_missing) {
            Some(updated) => TransformResult::from_content(content, updated, 1),
            None => TransformResult::unchanged(content),
        }
    }
}

/// Insert `block` at the first anchor present in `content`.
///
/// Returns `None` when no anchor matches and prepending is off.
pub(crate) fn insert_at_anchor(
    content: &str,
    block: &str,
    anchors: &[Anchor],
    prepend_if_missing: bool,
) -> Option<String> {
    let mut out = String::with_capacity(content.len() + block.len() + 2);
    for anchor in anchors {
        let Some(at) = anchor.insertion_point(content) else {
            continue;
        };
        out.push_str(&content[..at]);
        match anchor.placement {
            Placement::Before => {
                out.push_str(block);
                out.push('\n');
            }
            Placement::After => {
                out.push('\n');
                out.push_str(block);
            }
        }
        out.push_str(&content[at..]);
        return Some(out);
    }

    if prepend_if_missing {
        out.push_str(block);
        if !block.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(content);
        return Some(out);
    }
    None
}
