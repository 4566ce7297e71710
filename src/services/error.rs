//! Failures raised by the extraction and generation pipeline.
//!
//! These carry the detail needed for logging. The HTTP layer decides what
//! is shown to the caller, see [`crate::error::AppError`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid YouTube URL: {0}")]
    InvalidUrl(String),

    #[error("Video is too long ({duration:.0}s, limit is {limit}s)")]
    VideoTooLong { duration: f64, limit: u64 },

    #[error("Selected segment is too large ({chars} characters, limit is {limit}). Narrow the range.")]
    SegmentTooLarge { chars: usize, limit: usize },

    #[error("Segment out of range: {0}")]
    SegmentOutOfRange(String),

    #[error("Captions are disabled for this video")]
    CaptionsDisabled,

    #[error("No transcript found for this video")]
    NoTranscript,

    #[error("Transcript fetch failed: {0}")]
    Fetch(String),

    #[error("Corrupted PDF: {0}")]
    CorruptedPdf(String),
}

impl From<reqwest::Error> for ExtractError {
    fn from(err: reqwest::Error) -> Self {
        ExtractError::Fetch(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Model request failed: {0}")]
    Upstream(String),

    #[error("Could not parse flashcards from model response")]
    Parse,
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        GenerationError::Upstream(err.to_string())
    }
}
