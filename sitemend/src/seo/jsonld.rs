use serde::Serialize;

use super::catalog::CatalogItem;

#[derive(Serialize)]
struct MovieLd<'a> {
    #[serde(rename = "@context")]
    context: &'static str,
    #[serde(rename = "@type")]
    kind: &'static str,
    name: String,
    image: &'a str,
    description: &'a str,
    #[serde(rename = "datePublished")]
    date_published: String,
    genre: &'a [String],
    duration: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    trailer: Option<TrailerLd<'a>>,
}

#[derive(Serialize)]
struct TrailerLd<'a> {
    #[serde(rename = "@type")]
    kind: &'static str,
    name: String,
    #[serde(rename = "embedUrl")]
    embed_url: &'a str,
}

/// Build schema.org structured data for a catalog item.
///
/// The result is pretty-printed JSON with every `</` written as `<\/`, so
/// it can be embedded in a `<script>` element as-is.
#[must_use]
pub fn build_jsonld(item: &CatalogItem) -> String {
    let ld = MovieLd {
        context: "https://schema.org",
        kind: if item.is_movie() { "Movie" } else { "CreativeWork" },
        name: item.seo_title().replace('"', ""),
        image: item.poster(),
        description: item.description.as_deref().unwrap_or_default(),
        date_published: item.year_text(),
        genre: &item.genres,
        duration: item.runtime.as_deref().unwrap_or_default(),
        trailer: item
            .trailer
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(|embed_url| TrailerLd {
                kind: "VideoObject",
                name: format!("{} Trailer", item.title.as_deref().unwrap_or_default()),
                embed_url,
            }),
    };
    // Serializing plain strings and slices cannot fail.
    serde_json::to_string_pretty(&ld)
        .unwrap_or_default()
        .replace("</", "<\\/")
}

/// Wrap structured data in its script element.
#[must_use]
pub fn jsonld_script(item: &CatalogItem) -> String {
    format!(
        "<script type=\"application/ld+json\">\n{}\n</script>",
        build_jsonld(item)
    )
}
