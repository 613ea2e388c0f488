//! The movie catalog that drives SEO injection.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Catalog file content: `{ "items": [...] }`.
#[derive(Debug, Clone, Default, Deserialize)]
#[non_exhaustive]
pub struct Catalog {
    #[serde(default)]
    pub items: Vec<CatalogItem>,
}

impl Catalog {
    /// Load a catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid catalog.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("Invalid catalog {}", path.display()))
    }

    /// # Errors
    ///
    /// Returns an error if `content` is not a valid catalog document.
    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

/// One page of the site and the metadata describing it.
///
/// Every field is optional; missing text fields render as empty strings.
/// Text fields accept any JSON scalar, so `"runtime": 142` reads as `"142"`,
/// and `genres` accepts `null`, a single string or a list.
#[derive(Debug, Clone, Default, Deserialize)]
#[non_exhaustive]
pub struct CatalogItem {
    /// Page path relative to the site root, e.g. `movies/dune.html`.
    #[serde(default, deserialize_with = "lenient_text")]
    pub link: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(rename = "seo-title", default, deserialize_with = "lenient_text")]
    pub seo_title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
    /// Poster image URL.
    #[serde(default, deserialize_with = "lenient_text")]
    pub poster: Option<String>,
    /// Release year, stored either as a number or a string.
    pub year: Option<Value>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub genres: Vec<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub runtime: Option<String>,
    /// `movie` unless stated otherwise.
    #[serde(rename = "type", default, deserialize_with = "lenient_text")]
    pub kind: Option<String>,
    /// Trailer embed URL.
    #[serde(default, deserialize_with = "lenient_text")]
    pub trailer: Option<String>,
}

fn value_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_text(Value::deserialize(deserializer)?))
}

fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(values) => values.into_iter().filter_map(value_text).collect(),
        other => value_text(other).into_iter().collect(),
    })
}

impl CatalogItem {
    #[must_use]
    pub fn is_movie(&self) -> bool {
        self.kind.as_deref().unwrap_or("movie") == "movie"
    }

    /// The year as text; numbers are printed without quotes.
    #[must_use]
    pub fn year_text(&self) -> String {
        match &self.year {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    pub(crate) fn seo_title(&self) -> &str {
        self.seo_title.as_deref().unwrap_or_default()
    }

    pub(crate) fn poster(&self) -> &str {
        self.poster.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_catalog() {
        let catalog = Catalog::from_json(
            r#"{"items": [
                {"link": "movies/dune.html", "seo-title": "Dune (2021)", "year": 2021,
                 "genres": ["Sci-Fi"], "type": "movie"},
                {"title": "No link", "year": "1999", "type": "series"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(catalog.items.len(), 2);

        let dune = &catalog.items[0];
        assert_eq!(dune.link.as_deref(), Some("movies/dune.html"));
        assert_eq!(dune.seo_title(), "Dune (2021)");
        assert_eq!(dune.year_text(), "2021");
        assert!(dune.is_movie());

        let other = &catalog.items[1];
        assert_eq!(other.year_text(), "1999");
        assert!(!other.is_movie());
        assert_eq!(other.poster(), "");
    }

    #[test]
    fn test_missing_items_is_empty() {
        assert!(Catalog::from_json("{}").unwrap().items.is_empty());
        assert!(Catalog::from_json("[1, 2]").is_err());
    }

    #[test]
    fn test_loose_field_types_are_accepted() {
        let catalog = Catalog::from_json(
            r#"{"items": [
                {"link": "a.html", "runtime": 142, "genres": null},
                {"link": "b.html", "genres": "Drama", "title": 1984},
                {"link": "c.html", "genres": ["Action", null, 7]}
            ]}"#,
        )
        .unwrap();

        let a = &catalog.items[0];
        assert_eq!(a.runtime.as_deref(), Some("142"));
        assert!(a.genres.is_empty());

        let b = &catalog.items[1];
        assert_eq!(b.genres, vec!["Drama".to_owned()]);
        assert_eq!(b.title.as_deref(), Some("1984"));

        assert_eq!(catalog.items[2].genres, vec!["Action".to_owned(), "7".to_owned()]);
    }
}
