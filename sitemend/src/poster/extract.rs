//! Poster URL extractors.
//!
//! Title pages are scanned with a handful of regexes rather than parsed;
//! each extractor looks for one well-known place a poster URL shows up.

use std::fmt::Debug;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    match Regex::new(r"(?is)<([a-z][a-z0-9-]*)\b[^>]*>") {
        Ok(regex) => regex,
        Err(err) => panic!("Invalid tag regex: {err}"),
    }
});

static ATTR: LazyLock<Regex> = LazyLock::new(|| {
    match Regex::new(r#"(?is)([a-z_:][-a-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#) {
        Ok(regex) => regex,
        Err(err) => panic!("Invalid attribute regex: {err}"),
    }
});

static AMAZON_JPEG: LazyLock<Regex> = LazyLock::new(|| {
    match Regex::new(r#"https://m\.media-amazon\.com/images/[^\s"']+\.jpg"#) {
        Ok(regex) => regex,
        Err(err) => panic!("Invalid image URL regex: {err}"),
    }
});

static HEIGHT: LazyLock<Regex> = LazyLock::new(|| match Regex::new(r"UY(\d+)") {
    Ok(regex) => regex,
    Err(err) => panic!("Invalid height regex: {err}"),
});

pub(crate) static QUALITY: LazyLock<Regex> = LazyLock::new(|| match Regex::new(r"QL(\d+)") {
    Ok(regex) => regex,
    Err(err) => panic!("Invalid quality regex: {err}"),
});

/// One strategy for locating a poster URL in a title page.
pub trait Extractor: Debug {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// The poster URL, if this strategy finds one. Never fails otherwise.
    fn extract(&self, html: &str) -> Option<String>;
}

/// `<meta property="og:image" content="…">`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenGraphImage;

impl Extractor for OpenGraphImage {
    fn name(&self) -> &'static str {
        "og:image"
    }

    fn extract(&self, html: &str) -> Option<String> {
        tags(html, "meta")
            .find(|tag| attr(tag, "property").is_some_and(|p| p.eq_ignore_ascii_case("og:image")))
            .and_then(|tag| attr(tag, "content"))
            .filter(|url| !url.is_empty())
    }
}

/// First image inside the element marked `data-testid="hero-media__poster"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeroPoster;

impl Extractor for HeroPoster {
    fn name(&self) -> &'static str {
        "hero poster"
    }

    fn extract(&self, html: &str) -> Option<String> {
        let hero = TAG.captures_iter(html).find(|caps| {
            attr(whole(caps), "data-testid").is_some_and(|id| id == "hero-media__poster")
        })?;
        let after = hero.get(0).map_or(html.len(), |m| m.end());
        tags(&html[after..], "img")
            .next()
            .and_then(|img| attr(img, "src"))
            .filter(|src| !src.is_empty())
    }
}

/// First `<img>` carrying the `ipc-image` class.
#[derive(Debug, Clone, Copy, Default)]
pub struct IpcImage;

impl Extractor for IpcImage {
    fn name(&self) -> &'static str {
        "ipc-image"
    }

    fn extract(&self, html: &str) -> Option<String> {
        tags(html, "img")
            .filter(|img| {
                attr(img, "class")
                    .is_some_and(|class| class.split_whitespace().any(|c| c == "ipc-image"))
            })
            .find_map(|img| attr(img, "src").filter(|src| !src.is_empty()))
    }
}

/// Amazon-hosted `_V1_` JPEG whose `UY` height is closest to `target_height`.
///
/// The chosen URL is rewritten to request exactly `UY<target_height>` at
/// quality `QL50`.
#[derive(Debug, Clone, Copy)]
pub struct AmazonSized {
    pub target_height: u32,
}

impl AmazonSized {
    pub const DEFAULT_HEIGHT: u32 = 562;

    #[must_use]
    pub fn new(target_height: u32) -> Self {
        Self { target_height }
    }
}

impl Default for AmazonSized {
    fn default() -> Self {
        Self::new(Self::DEFAULT_HEIGHT)
    }
}

impl Extractor for AmazonSized {
    fn name(&self) -> &'static str {
        "amazon sized"
    }

    fn extract(&self, html: &str) -> Option<String> {
        let best = AMAZON_JPEG
            .find_iter(html)
            .map(|m| m.as_str())
            .filter(|url| url.contains("_V1_") && url.contains("UY"))
            .min_by_key(|url| height(url).abs_diff(self.target_height))?;

        let sized = HEIGHT.replace_all(best, format!("UY{}", self.target_height).as_str());
        Some(QUALITY.replace_all(&sized, "QL50").into_owned())
    }
}

/// The default chain, in priority order.
///
/// With a target height the Amazon size-aware extractor goes first, since
/// only it can pick a rendition; the markup-based strategies follow as
/// fallbacks.
#[must_use]
pub fn default_chain(target_height: Option<u32>) -> Vec<Box<dyn Extractor + Send + Sync>> {
    let mut chain: Vec<Box<dyn Extractor + Send + Sync>> = Vec::with_capacity(4);
    if let Some(h) = target_height {
        chain.push(Box::new(AmazonSized::new(h)));
    }
    chain.push(Box::new(OpenGraphImage));
    chain.push(Box::new(HeroPoster));
    chain.push(Box::new(IpcImage));
    chain
}

/// Run `chain` in order, returning the first URL found and the extractor that found it.
#[must_use]
pub fn run_chain(
    chain: &[Box<dyn Extractor + Send + Sync>],
    html: &str,
) -> Option<(&'static str, String)> {
    chain
        .iter()
        .find_map(|e| e.extract(html).map(|url| (e.name(), url)))
}

fn height(url: &str) -> u32 {
    HEIGHT
        .captures(url)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

fn whole<'h>(caps: &Captures<'h>) -> &'h str {
    caps.get(0).map_or("", |m| m.as_str())
}

/// Opening tags named `name` (ASCII case-insensitive), in document order.
fn tags<'h>(html: &'h str, name: &'h str) -> impl Iterator<Item = &'h str> + 'h {
    TAG.captures_iter(html).filter_map(move |caps| {
        caps.get(1)
            .is_some_and(|n| n.as_str().eq_ignore_ascii_case(name))
            .then(|| whole(&caps))
    })
}

/// Value of attribute `name` in an opening tag, with common entities decoded.
fn attr(tag: &str, name: &str) -> Option<String> {
    ATTR.captures_iter(tag).find_map(|caps| {
        let key = caps.get(1)?;
        if !key.as_str().eq_ignore_ascii_case(name) {
            return None;
        }
        let value = caps.get(2).or_else(|| caps.get(3)).or_else(|| caps.get(4))?;
        Some(decode_entities(value.as_str().trim()))
    })
}

fn decode_entities(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
