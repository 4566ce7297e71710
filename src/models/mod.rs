use serde::{Deserialize, Serialize};

/// A generated card that has not been saved to a deck yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

#[derive(Debug, Serialize)]
pub struct PdfExtraction {
    pub total_pages: usize,
    pub extracted_pages: usize,
    pub pages: Vec<String>,
    pub truncated: bool,
    /// 1-based page where the body content probably starts.
    pub suggested_start_page: usize,
}

/// One timed caption segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptChunk {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinuteBucket {
    pub minute: u64,
    pub start: f64,
    pub preview: String,
}

#[derive(Debug, Serialize)]
pub struct TranscriptExtraction {
    pub video_id: String,
    pub total_duration_seconds: f64,
    pub needs_segmentation: bool,
    pub start_seconds: u64,
    pub end_seconds: u64,
    pub minutes: Vec<MinuteBucket>,
    pub text: String,
    pub char_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct YoutubeRequest {
    #[serde(default)]
    pub url: String,
    pub start_seconds: Option<i64>,
    pub end_seconds: Option<i64>,
}
