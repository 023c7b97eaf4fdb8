//! Client for an OpenAI-compatible image generation endpoint.

use super::ImageGenerator;
use crate::error::UpstreamError;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Default provider base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: &'a str,
    quality: &'a str,
}

#[derive(Deserialize)]
struct GenerationResponse {
    data: Vec<GeneratedImage>,
}

#[derive(Deserialize)]
struct GeneratedImage {
    url: Option<String>,
}

#[derive(Deserialize)]
struct ProviderErrorBody {
    error: ProviderError,
}

#[derive(Deserialize)]
struct ProviderError {
    message: String,
}

/// Generates images through `POST {base_url}/images/generations`
pub struct OpenAiGenerator {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    size: String,
    quality: String,
}

impl OpenAiGenerator {
    /// Create a generator with the game's defaults: dall-e-3, one
    /// 1024x1024 image at standard quality.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, UpstreamError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(UpstreamError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| UpstreamError::Unavailable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            model: "dall-e-3".to_string(),
            size: "1024x1024".to_string(),
            quality: "standard".to_string(),
        })
    }

    /// Point the client at a different provider deployment
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the model name
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/images/generations", self.base_url)
    }
}

/// Map a non-success provider response onto an error kind
fn classify_failure(status: StatusCode, body: &str) -> UpstreamError {
    let message = serde_json::from_str::<ProviderErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| status.canonical_reason().unwrap_or("Unknown").to_string());

    match status {
        StatusCode::TOO_MANY_REQUESTS => UpstreamError::RateLimited { message },
        s if s.is_server_error() => {
            UpstreamError::Unavailable(format!("{} {}", s.as_u16(), message))
        }
        s => UpstreamError::Rejected {
            status: s.as_u16(),
            message,
        },
    }
}

impl ImageGenerator for OpenAiGenerator {
    fn generate(&self, prompt: &str) -> Result<String, UpstreamError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(UpstreamError::EmptyPrompt);
        }

        let request = GenerationRequest {
            model: &self.model,
            prompt,
            n: 1,
            size: &self.size,
            quality: &self.quality,
        };

        info!(model = %self.model, "Requesting image generation");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    UpstreamError::TimedOut
                } else {
                    UpstreamError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let error = classify_failure(status, &body);
            warn!(status = status.as_u16(), error = %error, "Image generation failed");
            return Err(error);
        }

        let body: GenerationResponse = response
            .json()
            .map_err(|e| UpstreamError::MalformedResponse(e.to_string()))?;

        body.data
            .into_iter()
            .next()
            .and_then(|image| image.url)
            .ok_or_else(|| UpstreamError::MalformedResponse("response contained no image URL".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_api_key_is_rejected() {
        let result = OpenAiGenerator::new("  ", Duration::from_secs(5));
        assert!(matches!(result, Err(UpstreamError::MissingApiKey)));
    }

    #[test]
    fn empty_prompt_is_rejected_before_any_request() {
        let generator = OpenAiGenerator::new("sk-test", Duration::from_secs(5))
            .unwrap()
            .base_url("http://127.0.0.1:9");
        assert!(matches!(generator.generate("   "), Err(UpstreamError::EmptyPrompt)));
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        let generator = OpenAiGenerator::new("sk-test", Duration::from_secs(5))
            .unwrap()
            .base_url("http://localhost:8080/v1/");
        assert_eq!(generator.endpoint(), "http://localhost:8080/v1/images/generations");
    }

    #[test]
    fn rate_limit_is_classified() {
        let body = r#"{"error":{"message":"Rate limit exceeded"}}"#;
        match classify_failure(StatusCode::TOO_MANY_REQUESTS, body) {
            UpstreamError::RateLimited { message } => assert_eq!(message, "Rate limit exceeded"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn bad_prompt_is_a_rejection() {
        let body = r#"{"error":{"message":"Your request was rejected by the safety system"}}"#;
        assert!(matches!(
            classify_failure(StatusCode::BAD_REQUEST, body),
            UpstreamError::Rejected { status: 400, .. }
        ));
    }

    #[test]
    fn outage_is_unavailable() {
        assert!(matches!(
            classify_failure(StatusCode::SERVICE_UNAVAILABLE, "<html>"),
            UpstreamError::Unavailable(_)
        ));
    }

    #[test]
    fn request_serializes_expected_fields() {
        let request = GenerationRequest {
            model: "dall-e-3",
            prompt: "A magical forest",
            n: 1,
            size: "1024x1024",
            quality: "standard",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "dall-e-3");
        assert_eq!(json["n"], 1);
        assert_eq!(json["size"], "1024x1024");
    }
}
