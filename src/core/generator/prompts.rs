//! Target prompts for new rounds, keyed by language.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Languages the game ships prompts for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Norwegian (the game's default)
    #[default]
    No,
    /// English
    En,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::No => "no",
            Language::En => "en",
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "no" | "nb" | "nn" => Ok(Language::No),
            "en" => Ok(Language::En),
            other => Err(format!("unsupported language '{}' (expected 'no' or 'en')", other)),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

const PROMPTS_NO: &[&str] = &[
    "En søt kattunge som leker med et garnnøste",
    "Et fargerikt undervannseventyr med tropiske fisker",
    "En magisk skog med glødende sopper",
    "Et koselig trehusferie i skogen",
    "En fantasifull lekeplass med regnbuerutsjebane",
];

const PROMPTS_EN: &[&str] = &[
    "A cute kitten playing with a ball of yarn",
    "A colorful underwater adventure with tropical fish",
    "A magical forest with glowing mushrooms",
    "A cozy treehouse vacation in the woods",
    "A whimsical playground with rainbow slides",
];

/// All target prompts for a language
pub fn target_prompts(language: Language) -> &'static [&'static str] {
    match language {
        Language::No => PROMPTS_NO,
        Language::En => PROMPTS_EN,
    }
}

/// Pick a target prompt uniformly at random
pub fn random_prompt<R: Rng + ?Sized>(language: Language, rng: &mut R) -> &'static str {
    // Both tables are non-empty constants.
    target_prompts(language).choose(rng).copied().unwrap_or(PROMPTS_EN[0])
}
