//! Best-effort cover image resolution.
//!
//! Every listed book gets a [`Cover`]: either a URL found through the
//! external lookup service or [`Cover::Fallback`]. Lookup failures are
//! logged and never reach the caller.

use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use shelf_kernel::settings::CoverSettings;
use thiserror::Error;

use super::models::{Book, ListedBook};

const USER_AGENT: &str = concat!("shelf/", env!("CARGO_PKG_VERSION"));

/// Outcome of resolving one book's cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cover {
    Found(String),
    Fallback,
}

impl Cover {
    /// Display URL, substituting `fallback` when no cover was found.
    pub fn url<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self {
            Cover::Found(url) => url,
            Cover::Fallback => fallback,
        }
    }
}

#[derive(Debug, Error)]
pub enum CoverError {
    #[error("cover lookup request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("cover lookup returned HTTP {0}")]
    Status(u16),
}

/// External catalog lookup keyed by cover identifier (ISBN).
#[async_trait]
pub trait CoverLookup: Send + Sync {
    /// `Ok(None)` means the service answered but had no usable image.
    async fn lookup(&self, identifier: &str) -> Result<Option<String>, CoverError>;
}

/// Google Books volumes API client.
pub struct GoogleBooksClient {
    http: reqwest::Client,
    lookup_url: String,
}

impl GoogleBooksClient {
    pub fn from_settings(settings: &CoverSettings) -> Result<Self, CoverError> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout_ms) = settings.timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }

        Ok(Self {
            http: builder.build()?,
            lookup_url: settings.lookup_url.clone(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Default, Deserialize)]
struct Volume {
    #[serde(rename = "volumeInfo", default)]
    volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
struct VolumeInfo {
    #[serde(rename = "imageLinks")]
    image_links: Option<ImageLinks>,
}

#[derive(Debug, Default, Deserialize)]
struct ImageLinks {
    thumbnail: Option<String>,
    #[serde(rename = "smallThumbnail")]
    small_thumbnail: Option<String>,
}

/// Display URL of the first returned volume, served over https.
fn thumbnail_url(response: VolumesResponse) -> Option<String> {
    let links = response.items.into_iter().next()?.volume_info.image_links?;
    let url = links.thumbnail.or(links.small_thumbnail)?;

    Some(match url.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None => url,
    })
}

#[async_trait]
impl CoverLookup for GoogleBooksClient {
    async fn lookup(&self, identifier: &str) -> Result<Option<String>, CoverError> {
        let response = self
            .http
            .get(&self.lookup_url)
            .query(&[("q", format!("isbn:{identifier}"))])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoverError::Status(status.as_u16()));
        }

        let volumes: VolumesResponse = response.json().await?;
        Ok(thumbnail_url(volumes))
    }
}

/// Resolve a single book's cover, swallowing every lookup failure.
pub async fn resolve_cover(lookup: &dyn CoverLookup, book: &Book) -> Cover {
    let Some(identifier) = book
        .cover_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
    else {
        return Cover::Fallback;
    };

    match lookup.lookup(identifier).await {
        Ok(Some(url)) => Cover::Found(url),
        Ok(None) => {
            tracing::debug!(book_id = book.id, identifier, "no cover found");
            Cover::Fallback
        }
        Err(e) => {
            tracing::warn!(
                book_id = book.id,
                identifier,
                error = %e,
                "cover lookup failed; using fallback"
            );
            Cover::Fallback
        }
    }
}

/// Resolve covers for all books concurrently, preserving input order.
pub async fn resolve_covers(lookup: &dyn CoverLookup, books: Vec<Book>) -> Vec<ListedBook> {
    let covers = join_all(books.iter().map(|book| resolve_cover(lookup, book))).await;

    books
        .into_iter()
        .zip(covers)
        .map(|(book, cover)| ListedBook { book, cover })
        .collect()
}
