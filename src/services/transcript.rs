//! Turns a YouTube caption track into generation-ready text.
//!
//! Transcripts longer than [`YOUTUBE_MAX_SEGMENT_CHARS`] cannot be sent to the
//! model in one go, so the caller picks a time range instead. A per-minute
//! outline is always returned to drive that range picker.

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;

use crate::config::{YOUTUBE_MAX_DURATION_SECONDS, YOUTUBE_MAX_SEGMENT_CHARS};
use crate::models::{MinuteBucket, TranscriptChunk, TranscriptExtraction};
use crate::services::error::ExtractError;
use crate::utils::text::{char_len, join_fragments, truncate_chars};

const MINUTE_PREVIEW_CHARS: usize = 200;

static VIDEO_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:https?://)?(?:www\.)?(?:youtube\.com/watch\?(?:[^#]*&)?v=|youtube\.com/embed/|youtu\.be/)([A-Za-z0-9_-]+)",
    )
    .expect("valid regex")
});

/// Source of caption chunks for a video, ordered by start time.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptChunk>, ExtractError>;
}

/// Pull the video identifier out of a watch, embed or short link.
pub fn parse_video_id(url: &str) -> Result<String, ExtractError> {
    VIDEO_ID_RE
        .captures(url.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| ExtractError::InvalidUrl(url.to_string()))
}

pub struct TranscriptExtractor {
    source: Arc<dyn TranscriptSource>,
}

impl TranscriptExtractor {
    pub fn new(source: Arc<dyn TranscriptSource>) -> Self {
        TranscriptExtractor { source }
    }

    pub async fn extract(
        &self,
        url: &str,
        start_seconds: Option<u64>,
        end_seconds: Option<u64>,
    ) -> Result<TranscriptExtraction, ExtractError> {
        let video_id = parse_video_id(url)?;
        let chunks = self.source.fetch(&video_id).await?;
        let result = build_extraction(video_id, &chunks, start_seconds, end_seconds)?;

        tracing::info!(
            video_id = %result.video_id,
            duration = result.total_duration_seconds,
            needs_segmentation = result.needs_segmentation,
            start = result.start_seconds,
            end = result.end_seconds,
            chars = result.char_count,
            "Extracted transcript"
        );
        Ok(result)
    }
}

/// Whole seconds, halves go to the even neighbour.
fn round_seconds(seconds: f64) -> u64 {
    seconds.max(0.0).round_ties_even() as u64
}

/// Assemble the extraction result from already fetched chunks.
pub fn build_extraction(
    video_id: String,
    chunks: &[TranscriptChunk],
    start_seconds: Option<u64>,
    end_seconds: Option<u64>,
) -> Result<TranscriptExtraction, ExtractError> {
    let last = chunks.last().ok_or(ExtractError::NoTranscript)?;
    let total_duration = last.start + last.duration;
    if total_duration > YOUTUBE_MAX_DURATION_SECONDS as f64 {
        return Err(ExtractError::VideoTooLong {
            duration: total_duration,
            limit: YOUTUBE_MAX_DURATION_SECONDS,
        });
    }

    let minutes = minute_buckets(chunks);
    let full_text = join_fragments(chunks.iter().map(|c| c.text.as_str()));
    let needs_segmentation = char_len(&full_text) > YOUTUBE_MAX_SEGMENT_CHARS;

    let (text, start, end) = if needs_segmentation {
        let start = start_seconds.unwrap_or(0);
        let end = end_seconds.unwrap_or_else(|| default_segment_end(chunks, total_duration));
        if start as f64 >= total_duration {
            return Err(ExtractError::SegmentOutOfRange(format!(
                "start {start}s is beyond the end of the video ({}s)",
                round_seconds(total_duration)
            )));
        }
        // A caller-chosen bound must leave a non-empty window. With both
        // bounds defaulted the window can only be empty when the first
        // chunk alone exceeds the budget, and that stays a valid reply.
        let caller_bounded = start_seconds.is_some() || end_seconds.is_some();
        if caller_bounded && end <= start {
            return Err(ExtractError::SegmentOutOfRange(format!(
                "end {end}s must be after start {start}s"
            )));
        }

        let text = join_fragments(
            chunks
                .iter()
                .filter(|c| c.start >= start as f64 && c.start < end as f64)
                .map(|c| c.text.as_str()),
        );
        let chars = char_len(&text);
        if chars > YOUTUBE_MAX_SEGMENT_CHARS {
            return Err(ExtractError::SegmentTooLarge {
                chars,
                limit: YOUTUBE_MAX_SEGMENT_CHARS,
            });
        }
        (text, start, end)
    } else {
        (full_text, 0, round_seconds(total_duration))
    };

    Ok(TranscriptExtraction {
        video_id,
        total_duration_seconds: total_duration,
        needs_segmentation,
        start_seconds: start,
        end_seconds: end,
        minutes,
        char_count: char_len(&text),
        text,
    })
}

/// End of the longest leading range that fits the character budget.
fn default_segment_end(chunks: &[TranscriptChunk], total_duration: f64) -> u64 {
    let mut running = 0usize;
    for chunk in chunks {
        running += char_len(&chunk.text) + 1;
        if running > YOUTUBE_MAX_SEGMENT_CHARS {
            return round_seconds(chunk.start);
        }
    }
    round_seconds(total_duration)
}

/// One bucket per minute that has captions. Previews keep the raw text.
pub fn minute_buckets(chunks: &[TranscriptChunk]) -> Vec<MinuteBucket> {
    let mut grouped: BTreeMap<u64, (f64, Vec<&str>)> = BTreeMap::new();
    for chunk in chunks {
        let minute = (chunk.start.max(0.0) / 60.0).floor() as u64;
        grouped
            .entry(minute)
            .or_insert_with(|| (chunk.start, Vec::new()))
            .1
            .push(chunk.text.as_str());
    }

    grouped
        .into_iter()
        .map(|(minute, (start, texts))| {
            let joined = texts.join(" ");
            MinuteBucket {
                minute,
                start,
                preview: truncate_chars(&joined, MINUTE_PREVIEW_CHARS).to_string(),
            }
        })
        .collect()
}
