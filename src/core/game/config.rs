//! Service configuration, read from the environment.

use crate::core::generator::DEFAULT_BASE_URL;
use crate::error::{GameError, Result};
use std::time::Duration;

/// Wall-clock budget for one workflow (generate or compare)
pub const DEFAULT_BUDGET: Duration = Duration::from_secs(60);

/// Per-request timeout for image downloads
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Runtime configuration for the game service
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Provider API key; generation is disabled without one
    pub api_key: Option<String>,
    /// Provider base URL
    pub base_url: String,
    /// Image model name
    pub model: String,
    /// Budget for each workflow
    pub budget: Duration,
    /// Timeout for each image download
    pub fetch_timeout: Duration,
    /// Accept local file paths as image locators. Never enabled from the
    /// environment; the HTTP API only fetches http(s) URLs.
    pub local_files: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: "dall-e-3".to_string(),
            budget: DEFAULT_BUDGET,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            local_files: false,
        }
    }
}

impl GameConfig {
    /// Read configuration from the process environment.
    ///
    /// | Variable                     | Meaning                  |
    /// |------------------------------|--------------------------|
    /// | `OPENAI_API_KEY`             | provider API key         |
    /// | `OPENAI_BASE_URL`            | provider base URL        |
    /// | `OPENAI_IMAGE_MODEL`         | image model              |
    /// | `PICTURE_MATCH_TIMEOUT_SECS` | workflow budget, seconds |
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        config.api_key = non_empty("OPENAI_API_KEY");
        if let Some(base_url) = non_empty("OPENAI_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(model) = non_empty("OPENAI_IMAGE_MODEL") {
            config.model = model;
        }
        if let Some(raw) = non_empty("PICTURE_MATCH_TIMEOUT_SECS") {
            config.budget = parse_budget(&raw)?;
        }

        Ok(config)
    }

    /// Override the workflow budget
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    /// Allow or refuse local file paths as image locators
    pub fn with_local_files(mut self, enabled: bool) -> Self {
        self.local_files = enabled;
        self
    }
}

fn parse_budget(raw: &str) -> Result<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(GameError::Config(format!(
            "PICTURE_MATCH_TIMEOUT_SECS must be a positive number of seconds, got '{}'",
            raw
        ))),
    }
}
