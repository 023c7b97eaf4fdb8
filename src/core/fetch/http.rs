//! Blocking HTTP fetcher.

use super::{read_capped, ImageFetcher, Locator, MAX_IMAGE_BYTES};
use crate::error::FetchError;
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Downloads images over http(s)
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    max_bytes: u64,
}

impl HttpFetcher {
    /// Create a fetcher whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("picture-match/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            max_bytes: MAX_IMAGE_BYTES,
        })
    }

    /// Override the payload size limit
    pub fn max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}

impl ImageFetcher for HttpFetcher {
    fn fetch(&self, locator: &Locator) -> Result<Vec<u8>, FetchError> {
        let url = match locator {
            Locator::Remote(url) => url,
            Locator::Local(path) => {
                return Err(FetchError::InvalidLocator {
                    locator: path.display().to_string(),
                })
            }
        };

        let transport_error = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::TimedOut {
                    locator: url.clone(),
                }
            } else {
                FetchError::Request {
                    locator: url.clone(),
                    source: e,
                }
            }
        };

        debug!(url = %url, "Fetching image");
        let response = self.client.get(url).send().map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "Image fetch failed");
            return Err(FetchError::Status {
                locator: url.clone(),
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        if let Some(len) = response.content_length() {
            if len > self.max_bytes {
                warn!(url = %url, len, limit = self.max_bytes, "Image too large");
                return Err(FetchError::TooLarge {
                    locator: url.clone(),
                    limit: self.max_bytes,
                });
            }
        }

        // Content-Length may be missing or wrong; cap the read itself too.
        let bytes = read_capped(response, self.max_bytes, url)?;
        debug!(url = %url, len = bytes.len(), "Fetched image");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve a single canned HTTP response on a random local port
    fn serve_once(response: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(response);
            }
        });
        format!("http://{}/image.png", addr)
    }

    #[test]
    fn returns_body_on_success() {
        let url = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello",
        );
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();

        let bytes = fetcher.fetch(&Locator::parse(&url).unwrap()).unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn non_success_status_is_an_error() {
        let url = serve_once(
            b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();

        match fetcher.fetch(&Locator::parse(&url).unwrap()) {
            Err(FetchError::Status { status, .. }) => assert_eq!(status, 404),
            other => panic!("expected status error, got {:?}", other.map(|b| b.len())),
        }
    }

    #[test]
    fn oversized_content_length_is_rejected() {
        let url = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Length: 4294967296\r\nConnection: close\r\n\r\n\x89PNG",
        );
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();

        match fetcher.fetch(&Locator::parse(&url).unwrap()) {
            Err(FetchError::TooLarge { limit, .. }) => assert_eq!(limit, MAX_IMAGE_BYTES),
            other => panic!("expected size error, got {:?}", other.map(|b| b.len())),
        }
    }

    #[test]
    fn body_without_length_is_capped() {
        let url = serve_once(b"HTTP/1.1 200 OK\r\nConnection: close\r\n\r\nhello world");
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap().max_bytes(5);

        assert!(matches!(
            fetcher.fetch(&Locator::parse(&url).unwrap()),
            Err(FetchError::TooLarge { limit: 5, .. })
        ));
    }

    #[test]
    fn local_locator_is_rejected() {
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
        let locator = Locator::Local("target.png".into());
        assert!(matches!(
            fetcher.fetch(&locator),
            Err(FetchError::InvalidLocator { .. })
        ));
    }
}
