//! Replacement rule files.
//!
//! A rule file lists the `from -> to` pairs for a [`LiteralReplace`] run, so
//! recurring swaps (ad network rotation, domain moves) live in version
//! control instead of in edited script constants. JSON and YAML are
//! accepted, chosen by file extension:
//!
//! ```yaml
//! ignore_case: true
//! rules:
//!   - from: https://cyberhimself.github.io/thistv.movies
//!     to: https://thistv.linkpc.net
//! ```

use std::path::Path;

use anyhow::{Context, bail};
use serde::Deserialize;

use crate::transform::{LiteralReplace, Replacement};

#[derive(Debug, Clone, Default, Deserialize)]
#[non_exhaustive]
pub struct RuleFile {
    /// Match markers ignoring ASCII case.
    #[serde(default)]
    pub ignore_case: bool,
    pub rules: Vec<Replacement>,
}

impl RuleFile {
    /// Parse rule file content; `yaml` selects the YAML parser, JSON otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the content does not parse, if there are no
    /// rules, or if a rule has an empty `from` marker.
    pub fn parse(content: &str, yaml: bool) -> anyhow::Result<Self> {
        let file: Self = if yaml {
            serde_saphyr::from_str(content).map_err(|e| anyhow::anyhow!("YAML parse error: {e}"))?
        } else {
            serde_json::from_str(content).context("JSON parse error")?
        };
        file.validate()?;
        Ok(file)
    }

    /// Load a rule file from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid (see [`RuleFile::parse`]).
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rule file {}", path.display()))?;
        let yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml" | "yml")
        );
        Self::parse(&content, yaml).with_context(|| format!("Invalid rule file {}", path.display()))
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.rules.is_empty() {
            bail!("rule file contains no rules");
        }
        if let Some(idx) = self.rules.iter().position(|r| r.from.is_empty()) {
            bail!("rule #{} has an empty `from` marker", idx + 1);
        }
        Ok(())
    }

    #[must_use]
    pub fn into_transform(self) -> LiteralReplace {
        LiteralReplace::new(self.rules).ignore_case(self.ignore_case)
    }
}
