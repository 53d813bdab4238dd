//! Thumbnail resolution and download.
//!
//! Three steps per card:
//! 1. [`resolve_image_url`] reads the card's image URL, retrying while the
//!    lazily rendered `src` is still empty
//! 2. [`local_path`] maps the URL to `<images dir>/<last path segment>`
//! 3. [`ImageDownloader::download`] fetches the bytes once, no retry, and
//!    overwrites whatever is at the destination

use crate::retry::{Attempted, RetryPolicy};
use crate::site::{PageError, SearchPage};
use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, instrument};
use url::Url;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image URL still unavailable after {attempts} attempts")]
    ResourceUnavailable { attempts: u32 },
    #[error("image URL lookup failed after {attempts} attempts: {source}")]
    LookupFailed { attempts: u32, source: PageError },
    #[error("image URL {0:?} has no usable file name")]
    InvalidImageUrl(String),
    #[error("image download from {url} failed with status {status}")]
    TransferError { url: String, status: StatusCode },
    #[error("image request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("could not save image: {0}")]
    Io(#[from] std::io::Error),
}

/// Read a card's image URL, retrying until it is non-empty.
///
/// # Errors
///
/// Once the policy's attempts are used up: [`ImageError::LookupFailed`] if
/// the page itself errored, [`ImageError::ResourceUnavailable`] if the `src`
/// only ever came back empty.
pub async fn resolve_image_url<P: SearchPage>(
    page: &P,
    card: &P::Card,
    policy: &RetryPolicy,
) -> Result<String, ImageError> {
    let outcome = policy
        .until_some("image url", move |_| async move {
            page.image_src(card)
                .await
                .map(|src| src.filter(|s| !s.trim().is_empty()))
        })
        .await;

    match outcome {
        Attempted::Resolved { value, .. } => Ok(value),
        Attempted::Exhausted {
            attempts,
            last_error: Some(source),
        } => Err(ImageError::LookupFailed { attempts, source }),
        Attempted::Exhausted {
            attempts,
            last_error: None,
        } => Err(ImageError::ResourceUnavailable { attempts }),
    }
}

/// Destination for an image: the URL path's last segment under `output_dir`.
pub fn local_path(url: &str, output_dir: &Path) -> Result<PathBuf, ImageError> {
    let invalid = || ImageError::InvalidImageUrl(url.to_string());
    let parsed = Url::parse(url).map_err(|_| invalid())?;
    let name = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .ok_or_else(invalid)?;
    Ok(output_dir.join(name))
}

/// Fetches an image and stores it on disk.
pub trait ImageDownloader {
    /// Download `url` into `dest`, returning the number of bytes written.
    async fn download(&self, url: &str, dest: &Path) -> Result<u64, ImageError>;
}

/// [`ImageDownloader`] over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpImageDownloader {
    client: reqwest::Client,
}

impl HttpImageDownloader {
    pub fn new(timeout: Duration) -> Result<Self, ImageError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl ImageDownloader for HttpImageDownloader {
    #[instrument(level = "debug", skip_all, fields(%url, dest = %dest.display()))]
    async fn download(&self, url: &str, dest: &Path) -> Result<u64, ImageError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::TransferError {
                url: url.to_string(),
                status,
            });
        }
        let bytes = response.bytes().await?;
        fs::write(dest, &bytes).await?;
        debug!(bytes = bytes.len(), "Saved image");
        Ok(bytes.len() as u64)
    }
}
