//! Poster URL lookup for `IMDb` titles.
//!
//! [`PosterClient`] fetches a title page and runs an ordered chain of
//! [`Extractor`]s over it until one yields an image URL. Amazon-hosted
//! renditions can then be shrunk with [`fit_quality`] until they fit a
//! size budget.

pub mod client;
pub mod extract;

use std::path::PathBuf;

use thiserror::Error;

pub use client::PosterClient;
pub use extract::{
    AmazonSized, Extractor, HeroPoster, IpcImage, OpenGraphImage, default_chain, run_chain,
};

use extract::QUALITY;

/// Lowest `QL` value [`fit_quality`] will request.
pub const MIN_QUALITY: u32 = 10;
const QUALITY_STEP: u32 = 10;

#[derive(Debug, Error)]
pub enum PosterError {
    #[error("invalid IMDb id '{0}': expected 'tt' followed by at least 7 digits")]
    InvalidId(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("no poster image found for {0}")]
    NotFound(String),

    #[error("failed to save {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Check that `id` looks like an `IMDb` title id (`tt` and at least 7 digits).
///
/// # Errors
///
/// Returns [`PosterError::InvalidId`] otherwise.
pub fn validate_imdb_id(id: &str) -> Result<(), PosterError> {
    let valid = id
        .strip_prefix("tt")
        .is_some_and(|digits| digits.len() >= 7 && digits.bytes().all(|b| b.is_ascii_digit()));
    if valid {
        Ok(())
    } else {
        Err(PosterError::InvalidId(id.to_owned()))
    }
}

/// Outcome of [`fit_quality`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityFit {
    pub url: String,
    /// Last probed size, when the server reported one.
    pub size_bytes: Option<u64>,
    /// `QL` value of `url`, if it carries one.
    pub quality: Option<u32>,
}

impl QualityFit {
    #[must_use]
    pub fn within(&self, max_kb: u64) -> bool {
        self.size_bytes
            .is_none_or(|size| size <= max_kb.saturating_mul(1024))
    }
}

/// Lower the `QL` parameter of `url` in steps of 10 until `probe` reports a
/// size of at most `max_kb` kilobytes or quality reaches 10.
///
/// `probe` returns the byte size of a URL, or `None` when it is unknown; an
/// unknown size stops the search. URLs without a `QL` parameter are probed
/// once and returned unchanged.
pub fn fit_quality<F>(url: &str, max_kb: u64, mut probe: F) -> QualityFit
where
    F: FnMut(&str) -> Option<u64>,
{
    let budget = max_kb.saturating_mul(1024);
    let mut current = url.to_owned();
    let mut quality = quality_of(url);

    loop {
        let size = probe(&current);
        let fits = size.is_none_or(|s| s <= budget);
        match quality {
            Some(q) if !fits && q > MIN_QUALITY => {
                let next = q.saturating_sub(QUALITY_STEP).max(MIN_QUALITY);
                tracing::debug!(from = q, to = next, size, "reducing poster quality");
                current = QUALITY
                    .replace_all(&current, format!("QL{next}").as_str())
                    .into_owned();
                quality = Some(next);
            }
            _ => {
                return QualityFit {
                    url: current,
                    size_bytes: size,
                    quality,
                };
            }
        }
    }
}

fn quality_of(url: &str) -> Option<u32> {
    QUALITY
        .captures(url)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
