use super::catalog::CatalogItem;
use super::html_escape;

/// Longest description kept as-is in meta tags.
const DESCRIPTION_LIMIT: usize = 155;
/// Where an over-long description is cut before backing off to a word boundary.
const DESCRIPTION_CUT: usize = 152;

/// Build the description, canonical, Open Graph and Twitter tags for a page.
#[must_use]
pub fn build_meta_tags(item: &CatalogItem, page_url: &str) -> String {
    let desc = html_escape(&truncate_description(
        item.description.as_deref().unwrap_or_default(),
    ));
    let title = html_escape(item.seo_title());
    let poster = html_escape(item.poster());
    let url = html_escape(page_url);

    [
        format!(r#"<meta name="description" content="{desc}" />"#),
        format!(r#"<link rel="canonical" href="{url}" />"#),
        format!(r#"<meta property="og:title" content="{title}" />"#),
        format!(r#"<meta property="og:description" content="{desc}" />"#),
        format!(r#"<meta property="og:image" content="{poster}" />"#),
        format!(r#"<meta property="og:url" content="{url}" />"#),
        r#"<meta property="og:type" content="video.movie" />"#.to_owned(),
        r#"<meta name="twitter:card" content="summary_large_image" />"#.to_owned(),
        format!(r#"<meta name="twitter:title" content="{title}" />"#),
        format!(r#"<meta name="twitter:description" content="{desc}" />"#),
        format!(r#"<meta name="twitter:image" content="{poster}" />"#),
    ]
    .join("\n")
}

/// Trim and shorten a description to fit search-result snippets.
///
/// Text longer than 155 characters is cut at 152, backed off to the last
/// space and suffixed with `...`.
#[must_use]
pub fn truncate_description(description: &str) -> String {
    let desc = description.trim();
    if desc.chars().count() <= DESCRIPTION_LIMIT {
        return desc.to_owned();
    }
    let head: String = desc.chars().take(DESCRIPTION_CUT).collect();
    let kept = head.rsplit_once(' ').map_or(head.as_str(), |(before, _)| before);
    format!("{kept}...")
}
