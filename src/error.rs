use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde_json::json;

use crate::services::error::{ExtractError, GenerationError};

const GENERIC_INTERNAL: &str = "An internal error occurred";

/// Error type returned by every HTTP handler.
///
/// Renders as `{"error": <message>, "code": <CODE>}`. Server-side failures
/// are logged in full and reported with a sanitized message.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg.clone())
            }
            AppError::Extract(err) => extract_parts(err),
            AppError::Generation(err) => {
                tracing::warn!(error = %err, "Flashcard generation failed");
                let message = match err {
                    GenerationError::Upstream(_) => {
                        "Failed to generate flashcards. Please try again."
                    }
                    GenerationError::Parse => "Could not parse flashcards from AI response.",
                };
                (StatusCode::BAD_GATEWAY, "GENERATION_FAILED", message.to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    GENERIC_INTERNAL.to_string(),
                )
            }
        }
    }
}

fn extract_parts(err: &ExtractError) -> (StatusCode, &'static str, String) {
    match err {
        ExtractError::InvalidUrl(_) => (
            StatusCode::BAD_REQUEST,
            "INVALID_URL",
            "Invalid YouTube URL.".to_string(),
        ),
        ExtractError::VideoTooLong { .. } => {
            (StatusCode::BAD_REQUEST, "VIDEO_TOO_LONG", err.to_string())
        }
        ExtractError::SegmentTooLarge { .. } => {
            (StatusCode::BAD_REQUEST, "SEGMENT_TOO_LARGE", err.to_string())
        }
        ExtractError::SegmentOutOfRange(_) => {
            (StatusCode::BAD_REQUEST, "SEGMENT_OUT_OF_RANGE", err.to_string())
        }
        ExtractError::CaptionsDisabled => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "CAPTIONS_DISABLED",
            "Captions are disabled for this video.".to_string(),
        ),
        ExtractError::NoTranscript => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "NO_TRANSCRIPT",
            "No transcript found for this video.".to_string(),
        ),
        ExtractError::CorruptedPdf(detail) => {
            tracing::error!(error = %detail, "PDF extraction failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CORRUPTED_FILE",
                "Could not read the PDF. The file may be corrupted.".to_string(),
            )
        }
        ExtractError::Fetch(detail) => {
            tracing::error!(error = %detail, "Transcript fetch failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                GENERIC_INTERNAL.to_string(),
            )
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let body = json!({
            "error": message,
            "detail": message,
            "code": code,
        });
        (status, Json(body)).into_response()
    }
}
