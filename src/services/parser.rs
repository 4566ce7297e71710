//! Recovers the card array from free-form model output.
//!
//! Models are told to answer with bare JSON, but replies regularly arrive
//! wrapped in a markdown fence or surrounded by chatter. Each strategy below
//! is tried in order and the first one that yields an array wins.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::Flashcard;
use crate::services::error::GenerationError;

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:json)?\s*\n?").expect("valid regex"));

static ARRAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("valid regex"));

type Strategy = fn(&str) -> Option<Vec<Flashcard>>;

const STRATEGIES: &[(&str, Strategy)] = &[
    ("direct", parse_direct),
    ("fenced", parse_fenced),
    ("embedded_array", parse_embedded_array),
];

fn parse_direct(raw: &str) -> Option<Vec<Flashcard>> {
    serde_json::from_str(raw).ok()
}

fn parse_fenced(raw: &str) -> Option<Vec<Flashcard>> {
    let stripped = FENCE_RE.replace_all(raw, "");
    serde_json::from_str(stripped.trim()).ok()
}

fn parse_embedded_array(raw: &str) -> Option<Vec<Flashcard>> {
    let found = ARRAY_RE.find(raw)?;
    serde_json::from_str(found.as_str()).ok()
}

/// Parse the model's raw reply into flashcards.
pub fn parse_flashcards(raw: &str) -> Result<Vec<Flashcard>, GenerationError> {
    for (name, strategy) in STRATEGIES {
        if let Some(cards) = strategy(raw) {
            tracing::debug!(strategy = *name, cards = cards.len(), "Parsed model response");
            return Ok(cards);
        }
    }
    Err(GenerationError::Parse)
}
