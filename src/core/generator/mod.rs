//! # Generator Module
//!
//! Produces images from text prompts through an external provider.
//!
//! - `prompts` - the fixed target prompts new rounds draw from
//! - `openai` - client for an OpenAI-compatible images endpoint

mod openai;
pub mod prompts;

pub use openai::{OpenAiGenerator, DEFAULT_BASE_URL};
pub use prompts::{random_prompt, target_prompts, Language};

use crate::error::UpstreamError;

/// Turns a prompt into a retrievable image URL
pub trait ImageGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, UpstreamError>;
}
