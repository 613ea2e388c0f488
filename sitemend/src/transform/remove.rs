//! Removal of a known block (e.g. a retired ad network script).

use super::{Transform, TransformResult};

/// Removes every occurrence of an exact block. Absent block: no-op.
#[derive(Debug, Clone)]
pub struct Removal {
    block: String,
}

impl Removal {
    #[must_use]
    pub fn new(block: impl Into<String>) -> Self {
        Self {
            block: block.into(),
        }
    }
}

impl Transform for Removal {
    fn name(&self) -> &'static str {
        "remove"
    }

    fn apply(&self, content: &str) -> TransformResult {
        if self.block.is_empty() {
            return TransformResult::unchanged(content);
        }
        let count = content.matches(self.block.as_str()).count();
        if count == 0 {
            return TransformResult::unchanged(content);
        }
        TransformResult::from_content(content, content.replace(self.block.as_str(), ""), count)
    }
}
