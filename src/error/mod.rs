//! # Error Module
//!
//! Error types for the picture-match game backend.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - which image, which stage, what went wrong
//! - **Never a fake score** - a failed comparison is an error, not a 0
//! - **Classify** - every error maps to an [`ErrorKind`] and an HTTP status

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum GameError {
    #[error("Scoring error: {0}")]
    Score(#[from] ScoreError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Image generation error: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Timed out after {}s while {stage}", .budget.as_secs())]
    Timeout { stage: String, budget: Duration },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors raised by the similarity scorer.
///
/// Every variant means "could not compare".
#[derive(Error, Debug)]
pub enum ScoreError {
    #[error("Failed to decode {label} image: {reason}")]
    Decode { label: String, reason: String },

    #[error("The {label} image is empty")]
    EmptyImage { label: String },

    #[error("Failed to normalize {label} image: {reason}")]
    Normalize { label: String, reason: String },
}

/// Errors that occur while retrieving image bytes
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid image locator: '{locator}'")]
    InvalidLocator { locator: String },

    #[error("Failed to fetch image {locator}: {status} {reason}")]
    Status {
        locator: String,
        status: u16,
        reason: String,
    },

    #[error("Request for image {locator} failed: {source}")]
    Request {
        locator: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request for image {locator} timed out")]
    TimedOut { locator: String },

    #[error("Image {locator} exceeds the {limit} byte limit")]
    TooLarge { locator: String, limit: u64 },

    #[error("Failed to read body of image {locator}: {source}")]
    Body {
        locator: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read image file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors reported by (or while talking to) the image generation provider
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("No API key configured. Set OPENAI_API_KEY and try again.")]
    MissingApiKey,

    #[error("Prompt must not be empty")]
    EmptyPrompt,

    #[error("Provider rate limit reached: {message}")]
    RateLimited { message: String },

    #[error("Provider rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Provider request timed out")]
    TimedOut,

    #[error("Unexpected provider response: {0}")]
    MalformedResponse(String),
}

/// Coarse classification used for response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Decode,
    Fetch,
    Timeout,
    Upstream,
    RateLimited,
    InvalidRequest,
    Internal,
}

impl ErrorKind {
    /// HTTP status code for this kind of failure
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::InvalidRequest => 400,
            ErrorKind::Decode => 422,
            ErrorKind::RateLimited => 429,
            ErrorKind::Internal => 500,
            ErrorKind::Fetch | ErrorKind::Upstream => 502,
            ErrorKind::Timeout => 504,
        }
    }
}

impl GameError {
    /// Classify this error.
    ///
    /// Transport timeouts inside a fetch or a provider call count as
    /// timeouts, not as fetch/upstream failures.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::Score(_) => ErrorKind::Decode,
            GameError::Fetch(FetchError::TimedOut { .. }) => ErrorKind::Timeout,
            GameError::Fetch(_) => ErrorKind::Fetch,
            GameError::Upstream(UpstreamError::TimedOut) => ErrorKind::Timeout,
            GameError::Upstream(UpstreamError::RateLimited { .. }) => ErrorKind::RateLimited,
            GameError::Upstream(UpstreamError::EmptyPrompt) => ErrorKind::InvalidRequest,
            GameError::Upstream(UpstreamError::MissingApiKey) => ErrorKind::Internal,
            GameError::Upstream(_) => ErrorKind::Upstream,
            GameError::Timeout { .. } => ErrorKind::Timeout,
            GameError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            GameError::Config(_) | GameError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether the failure was caused by a wall-clock budget running out
    pub fn is_timeout(&self) -> bool {
        self.kind() == ErrorKind::Timeout
    }
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, GameError>;
