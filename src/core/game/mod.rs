//! # Game Module
//!
//! Orchestrates a round of the game:
//! 1. Draw a hidden target prompt and generate the target image
//! 2. Generate the player's image from their own prompt
//! 3. Fetch both images and score how closely they match
//!
//! Every workflow runs under a wall-clock budget (60s by default). Running
//! out of budget is reported as a timeout, never as a score.

mod config;
mod deadline;
mod service;

pub use config::{GameConfig, DEFAULT_BUDGET, DEFAULT_FETCH_TIMEOUT};
pub use deadline::Deadline;
pub use service::{GameService, GameServiceBuilder};

use crate::core::generator::Language;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A started round: the hidden prompt and the image generated from it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    pub id: Uuid,
    pub language: Language,
    pub prompt: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}
