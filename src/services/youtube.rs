//! Caption fetching from youtube.com.
//!
//! The watch page embeds the player response, whose `captions` object lists
//! the available caption tracks. A video without that object has captions
//! turned off; a video whose tracks are all in other languages has no usable
//! transcript. The chosen track is downloaded as timed-text XML.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;

use crate::config::YoutubeConfig;
use crate::models::TranscriptChunk;
use crate::services::error::ExtractError;
use crate::services::transcript::TranscriptSource;

const WATCH_URL: &str = "https://www.youtube.com/watch";

static TEXT_ELEMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<text start="([0-9.]+)"(?: dur="([0-9.]+)")?[^>]*>(.*?)</text>"#)
        .expect("valid regex")
});

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionsRenderer {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
    /// `asr` marks auto-generated captions.
    #[serde(default)]
    kind: Option<String>,
}

impl CaptionTrack {
    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

pub struct YouTubeCaptions {
    client: reqwest::Client,
    languages: Vec<String>,
}

impl YouTubeCaptions {
    pub fn new(config: &YoutubeConfig) -> Result<Self, ExtractError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent("Mozilla/5.0 (compatible; cardforge)")
            .build()?;
        Ok(YouTubeCaptions {
            client,
            languages: config.languages.clone(),
        })
    }
}

#[async_trait]
impl TranscriptSource for YouTubeCaptions {
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptChunk>, ExtractError> {
        let page = self
            .client
            .get(WATCH_URL)
            .query(&[("v", video_id)])
            .header("Accept-Language", "en-US")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let tracks = caption_tracks(&page)?;
        let track = pick_track(&tracks, &self.languages).ok_or(ExtractError::NoTranscript)?;
        tracing::debug!(
            video_id,
            language = %track.language_code,
            generated = track.is_generated(),
            "Selected caption track"
        );

        let xml = self
            .client
            .get(&track.base_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let chunks = parse_timed_text(&xml);
        if chunks.is_empty() {
            return Err(ExtractError::NoTranscript);
        }
        Ok(chunks)
    }
}

/// Locate and decode the caption track list embedded in a watch page.
fn caption_tracks(page: &str) -> Result<Vec<CaptionTrack>, ExtractError> {
    let Some(marker) = page.find("\"captions\":") else {
        if page.contains("\"playabilityStatus\":{\"status\":\"ERROR\"") {
            return Err(ExtractError::Fetch("video is unavailable".into()));
        }
        return Err(ExtractError::CaptionsDisabled);
    };

    let rest = &page[marker + "\"captions\":".len()..];
    let json = balanced_object(rest)
        .ok_or_else(|| ExtractError::Fetch("malformed captions block".into()))?;

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Captions {
        player_captions_tracklist_renderer: Option<CaptionsRenderer>,
    }

    let captions: Captions =
        serde_json::from_str(json).map_err(|e| ExtractError::Fetch(e.to_string()))?;
    match captions.player_captions_tracklist_renderer {
        Some(renderer) if !renderer.caption_tracks.is_empty() => Ok(renderer.caption_tracks),
        _ => Err(ExtractError::CaptionsDisabled),
    }
}

/// The JSON object at the start of `text`, matched by brace depth.
fn balanced_object(text: &str) -> Option<&str> {
    if !text.starts_with('{') {
        return None;
    }
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (idx, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[..=idx]);
                }
            }
            _ => {}
        }
    }
    None
}

/// First preferred language wins; within a language, manual tracks beat
/// auto-generated ones.
fn pick_track<'a>(tracks: &'a [CaptionTrack], languages: &[String]) -> Option<&'a CaptionTrack> {
    languages.iter().find_map(|lang| {
        let matching: Vec<&CaptionTrack> =
            tracks.iter().filter(|t| &t.language_code == lang).collect();
        matching
            .iter()
            .find(|t| !t.is_generated())
            .or_else(|| matching.first())
            .copied()
    })
}

/// Parse `<text start=".." dur="..">` elements of a timed-text document.
fn parse_timed_text(xml: &str) -> Vec<TranscriptChunk> {
    TEXT_ELEMENT_RE
        .captures_iter(xml)
        .filter_map(|caps| {
            let start: f64 = caps.get(1)?.as_str().parse().ok()?;
            let duration: f64 = caps
                .get(2)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0.0);
            // Entities can be double-encoded, e.g. `&amp;#39;`.
            let once = html_escape::decode_html_entities(caps.get(3)?.as_str());
            let decoded = html_escape::decode_html_entities(&once);
            let text = TAG_RE.replace_all(&decoded, "").trim().to_string();
            (!text.is_empty()).then_some(TranscriptChunk {
                text,
                start,
                duration,
            })
        })
        .collect()
}
