//! # Fetch Module
//!
//! Resolves image locators into raw bytes.
//!
//! ## Locators
//! - `http://...` / `https://...` - fetched with a blocking HTTP client
//! - a plain path - read from the local filesystem, only when the fetcher
//!   was built with local files enabled
//! - any other scheme, and `data:` URIs - rejected
//!
//! Payloads larger than [`MAX_IMAGE_BYTES`] are rejected. Fetch failures are
//! reported as [`FetchError`], never as image content.

mod file;
mod http;

pub use file::FileFetcher;
pub use http::HttpFetcher;

use crate::error::FetchError;
use std::fmt;
use std::io::Read;
use std::path::PathBuf;

/// Largest image payload accepted from any source (32 MiB)
pub const MAX_IMAGE_BYTES: u64 = 32 * 1024 * 1024;

/// Where an image lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// An http(s) URL
    Remote(String),
    /// A path on the local filesystem
    Local(PathBuf),
}

impl Locator {
    /// Parse a locator string.
    ///
    /// Surrounding whitespace is ignored; an empty string is invalid.
    pub fn parse(raw: &str) -> Result<Self, FetchError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(FetchError::InvalidLocator {
                locator: raw.to_string(),
            });
        }

        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Ok(Locator::Remote(trimmed.to_string()))
        } else if lower.contains("://") || lower.starts_with("data:") {
            Err(FetchError::InvalidLocator {
                locator: raw.to_string(),
            })
        } else {
            Ok(Locator::Local(PathBuf::from(trimmed)))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Locator::Remote(_))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Remote(url) => write!(f, "{}", url),
            Locator::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Retrieves the bytes behind a locator
pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, locator: &Locator) -> Result<Vec<u8>, FetchError>;
}

/// Read at most `limit` bytes from `reader`, failing once the payload
/// grows past it
pub(crate) fn read_capped<R: Read>(
    reader: R,
    limit: u64,
    locator: &str,
) -> Result<Vec<u8>, FetchError> {
    let mut bytes = Vec::new();
    reader
        .take(limit + 1)
        .read_to_end(&mut bytes)
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::TimedOut {
                FetchError::TimedOut {
                    locator: locator.to_string(),
                }
            } else {
                FetchError::Body {
                    locator: locator.to_string(),
                    source: e,
                }
            }
        })?;

    if bytes.len() as u64 > limit {
        return Err(FetchError::TooLarge {
            locator: locator.to_string(),
            limit,
        });
    }
    Ok(bytes)
}

/// Fetcher that dispatches on the locator kind.
///
/// Local paths are refused unless the fetcher was built with
/// [`DefaultFetcher::with_local_files`].
pub struct DefaultFetcher {
    http: HttpFetcher,
    file: Option<FileFetcher>,
}

impl DefaultFetcher {
    /// Remote URLs only
    pub fn new(http: HttpFetcher) -> Self {
        Self { http, file: None }
    }

    /// Remote URLs plus paths on the local filesystem
    pub fn with_local_files(http: HttpFetcher) -> Self {
        Self {
            http,
            file: Some(FileFetcher),
        }
    }

    pub fn reads_local_files(&self) -> bool {
        self.file.is_some()
    }
}

impl ImageFetcher for DefaultFetcher {
    fn fetch(&self, locator: &Locator) -> Result<Vec<u8>, FetchError> {
        match (locator, &self.file) {
            (Locator::Remote(_), _) => self.http.fetch(locator),
            (Locator::Local(_), Some(file)) => file.fetch(locator),
            (Locator::Local(_), None) => Err(FetchError::InvalidLocator {
                locator: locator.to_string(),
            }),
        }
    }
}
