//! Local filesystem fetcher.

use super::{read_capped, ImageFetcher, Locator, MAX_IMAGE_BYTES};
use crate::error::FetchError;
use std::fs::File;
use tracing::debug;

/// Reads images from disk
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

impl ImageFetcher for FileFetcher {
    fn fetch(&self, locator: &Locator) -> Result<Vec<u8>, FetchError> {
        let path = match locator {
            Locator::Local(path) => path,
            Locator::Remote(url) => {
                return Err(FetchError::InvalidLocator {
                    locator: url.clone(),
                })
            }
        };

        let file = File::open(path).map_err(|e| FetchError::Io {
            path: path.clone(),
            source: e,
        })?;
        let bytes = read_capped(file, MAX_IMAGE_BYTES, &path.display().to_string())?;
        debug!(path = %path.display(), len = bytes.len(), "Read image file");
        Ok(bytes)
    }
}
