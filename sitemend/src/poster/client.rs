//! Blocking HTTP client for title pages and poster images.

use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT_LANGUAGE, CONTENT_LENGTH, HeaderMap, HeaderValue};
use tracing::{debug, info};

use super::extract::{Extractor, default_chain, run_chain};
use super::{PosterError, validate_imdb_id};
use crate::persist::write_atomic;

pub const DEFAULT_BASE_URL: &str = "https://www.imdb.com";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches title pages and resolves their poster URL.
///
/// One request per call, no retries.
#[derive(Debug)]
pub struct PosterClient {
    http: Client,
    base_url: String,
    extractors: Vec<Box<dyn Extractor + Send + Sync>>,
}

impl PosterClient {
    /// Client for the public site with the default extractor chain.
    ///
    /// # Errors
    ///
    /// Returns [`PosterError::Client`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, PosterError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(TIMEOUT)
            .build()
            .map_err(PosterError::Client)?;
        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_owned(),
            extractors: default_chain(None),
        })
    }

    /// Point the client at another host (mirrors, tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_extractors(mut self, extractors: Vec<Box<dyn Extractor + Send + Sync>>) -> Self {
        self.extractors = extractors;
        self
    }

    #[must_use]
    pub fn title_url(&self, imdb_id: &str) -> String {
        format!("{}/title/{imdb_id}/", self.base_url.trim_end_matches('/'))
    }

    /// Download the title page for `imdb_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is malformed, the request fails or the
    /// server answers with a non-2xx status.
    pub fn fetch_page(&self, imdb_id: &str) -> Result<String, PosterError> {
        validate_imdb_id(imdb_id)?;
        let url = self.title_url(imdb_id);
        debug!(%url, "fetching title page");
        let resp = self.get(&url)?;
        resp.text().map_err(|source| PosterError::Http { url, source })
    }

    /// Resolve the poster URL for `imdb_id` using the extractor chain.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`PosterClient::fetch_page`], or
    /// [`PosterError::NotFound`] when no extractor finds an image.
    pub fn fetch_poster(&self, imdb_id: &str) -> Result<String, PosterError> {
        let html = self.fetch_page(imdb_id)?;
        let (via, url) = run_chain(&self.extractors, &html)
            .ok_or_else(|| PosterError::NotFound(imdb_id.to_owned()))?;
        info!(imdb_id, extractor = via, %url, "poster found");
        Ok(url)
    }

    /// Size of the resource at `url`, from a `HEAD` request and, failing
    /// that, the headers of a `GET`. `None` when the server does not say.
    #[must_use]
    pub fn content_length(&self, url: &str) -> Option<u64> {
        let from_head = self
            .http
            .head(url)
            .send()
            .ok()
            .filter(|r| r.status().is_success())
            .and_then(|r| header_length(&r))
            .filter(|len| *len > 0);
        from_head.or_else(|| {
            let resp = self.http.get(url).send().ok()?;
            if !resp.status().is_success() {
                return None;
            }
            header_length(&resp).or_else(|| resp.content_length())
        })
    }

    /// Download `url` to `dest`, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the status is not 2xx or the
    /// file cannot be written.
    pub fn download(&self, url: &str, dest: &Path) -> Result<u64, PosterError> {
        let resp = self.get(url)?;
        let bytes = resp.bytes().map_err(|source| PosterError::Http {
            url: url.to_owned(),
            source,
        })?;
        write_atomic(dest, &bytes).map_err(|source| PosterError::Io {
            path: dest.to_path_buf(),
            source,
        })?;
        info!(path = %dest.display(), bytes = bytes.len(), "poster saved");
        Ok(u64::try_from(bytes.len()).unwrap_or(u64::MAX))
    }

    fn get(&self, url: &str) -> Result<Response, PosterError> {
        let resp = self.http.get(url).send().map_err(|source| PosterError::Http {
            url: url.to_owned(),
            source,
        })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(PosterError::Status {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }
        Ok(resp)
    }
}

fn header_length(resp: &Response) -> Option<u64> {
    resp.headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}
