//! Artwork fetching and decoding.
//!
//! Loads run on short-lived worker threads; the controller only ever sees the
//! finished [`ArtworkResult`] on its channel.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::Sender;
use image::DynamicImage;
use reqwest::blocking::Client;
use reqwest::Url;
use tracing::debug;

use crate::cover::{prepare_artwork, PreparedArtwork};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to request {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode artwork {reference}: {source}")]
    Decode {
        reference: String,
        #[source]
        source: image::ImageError,
    },
    #[error("unsupported artwork reference '{0}'")]
    Unsupported(String),
    #[error("artwork worker unavailable: {0}")]
    Worker(String),
}

/// Anything that can turn an artwork reference into a decoded image.
pub trait ArtworkSource: Send + Sync {
    fn fetch(&self, reference: &str) -> Result<DynamicImage, LoadError>;
}

/// Where an artwork reference points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtworkLocation {
    Remote(Url),
    Local(PathBuf),
}

impl ArtworkLocation {
    pub fn parse(reference: &str) -> Result<Self, LoadError> {
        let reference = reference.trim();
        let lowered = reference.to_ascii_lowercase();
        if lowered.starts_with("http://") || lowered.starts_with("https://") {
            return Url::parse(reference)
                .map(ArtworkLocation::Remote)
                .map_err(|_| LoadError::Unsupported(reference.to_string()));
        }
        if lowered.starts_with("file://") {
            return Url::parse(reference)
                .ok()
                .and_then(|url| url.to_file_path().ok())
                .map(ArtworkLocation::Local)
                .ok_or_else(|| LoadError::Unsupported(reference.to_string()));
        }
        if reference.contains("://") || reference.is_empty() {
            return Err(LoadError::Unsupported(reference.to_string()));
        }
        Ok(ArtworkLocation::Local(PathBuf::from(reference)))
    }
}

/// Fetches `http(s)://` artwork over HTTP and everything else from disk.
#[derive(Debug, Clone)]
pub struct DefaultArtworkSource {
    http: Client,
}

impl DefaultArtworkSource {
    pub fn new(timeout: Duration) -> Result<Self, LoadError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| LoadError::Http {
                url: String::from("<client>"),
                source,
            })?;
        Ok(Self { http })
    }

    fn fetch_remote(&self, url: &Url) -> Result<Vec<u8>, LoadError> {
        debug!(%url, "downloading artwork");
        let http_error = |source| LoadError::Http {
            url: url.to_string(),
            source,
        };
        let response = self
            .http
            .get(url.clone())
            .send()
            .map_err(http_error)?
            .error_for_status()
            .map_err(http_error)?;
        let bytes = response.bytes().map_err(http_error)?;
        Ok(bytes.to_vec())
    }

    fn fetch_local(path: &Path) -> Result<Vec<u8>, LoadError> {
        debug!(path = %path.display(), "reading artwork");
        fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl ArtworkSource for DefaultArtworkSource {
    fn fetch(&self, reference: &str) -> Result<DynamicImage, LoadError> {
        let bytes = match ArtworkLocation::parse(reference)? {
            ArtworkLocation::Remote(url) => self.fetch_remote(&url)?,
            ArtworkLocation::Local(path) => Self::fetch_local(&path)?,
        };
        image::load_from_memory(&bytes).map_err(|source| LoadError::Decode {
            reference: reference.to_string(),
            source,
        })
    }
}

/// Monotonic sequence number of an `update_artwork` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

/// Hands out request ids and decides which results are still wanted.
#[derive(Debug, Default)]
pub struct ArtworkRequests {
    latest: u64,
}

impl ArtworkRequests {
    pub fn issue(&mut self) -> RequestId {
        self.latest += 1;
        RequestId(self.latest)
    }

    /// Only the most recently issued request may touch render state.
    pub fn is_current(&self, request: RequestId) -> bool {
        request.0 == self.latest
    }
}

/// Finished load, tagged with the request that started it.
#[derive(Debug)]
pub struct ArtworkResult {
    pub request: RequestId,
    pub reference: String,
    /// `Ok(None)` means the image decoded but had no pixels.
    pub outcome: Result<Option<PreparedArtwork>, LoadError>,
}

/// Fetches and processes `reference` on a worker thread.
///
/// The result is sent on `results`; a closed channel (controller destroyed)
/// silently discards it.
pub fn spawn_load(
    source: Arc<dyn ArtworkSource>,
    request: RequestId,
    reference: String,
    results: Sender<ArtworkResult>,
) -> Result<(), LoadError> {
    thread::Builder::new()
        .name("fluid-artwork".into())
        .spawn(move || {
            let outcome = source
                .fetch(&reference)
                .map(|image| prepare_artwork(&image));
            let _ = results.send(ArtworkResult {
                request,
                reference,
                outcome,
            });
        })
        .map(|_| ())
        .map_err(|err| LoadError::Worker(err.to_string()))
}
