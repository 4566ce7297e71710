use std::sync::Arc;

use axum::{
    Router,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    response::Json,
    routing::{get, post},
};
use http::StatusCode;
use tower_http::trace::TraceLayer;

use crate::config::{
    GENERATE_MAX_CHARS, GENERATE_MIN_CHARS, PDF_MAX_FILE_SIZE_BYTES, PDF_MAX_FILE_SIZE_MB,
};
use crate::error::{AppError, AppResult};
use crate::models::{Flashcard, GenerateRequest, PdfExtraction, TranscriptExtraction, YoutubeRequest};
use crate::services::generator::FlashcardGenerator;
use crate::services::pdf;
use crate::services::transcript::TranscriptExtractor;
use crate::utils::text::char_len;

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<FlashcardGenerator>,
    pub transcripts: Arc<TranscriptExtractor>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/generate/", post(generate))
        .route("/extract/pdf/", post(extract_pdf))
        .route("/extract/youtube/", post(extract_youtube))
        .with_state(state)
        // Over-limit bodies surface as extractor rejections, which render as JSON 413s.
        .layer(DefaultBodyLimit::max(
            PDF_MAX_FILE_SIZE_BYTES + MULTIPART_OVERHEAD_BYTES,
        ))
        .layer(TraceLayer::new_for_http())
}

async fn health_check() -> &'static str {
    "OK"
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::PayloadTooLarge(rejection.body_text());
    }
    AppError::BadRequest(rejection.body_text())
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return too_large();
    }
    AppError::BadRequest(err.body_text())
}

fn too_large() -> AppError {
    AppError::PayloadTooLarge(format!(
        "File exceeds the {PDF_MAX_FILE_SIZE_MB} MB limit."
    ))
}

/// Trimmed input text, if its length is within the accepted bounds.
fn validate_text(text: &str) -> AppResult<&str> {
    let text = text.trim();
    let len = char_len(text);
    if len < GENERATE_MIN_CHARS {
        return Err(AppError::BadRequest(format!(
            "text must be at least {GENERATE_MIN_CHARS} characters (got {len})."
        )));
    }
    if len > GENERATE_MAX_CHARS {
        return Err(AppError::BadRequest(format!(
            "text must be at most {GENERATE_MAX_CHARS} characters (got {len})."
        )));
    }
    Ok(text)
}

async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> AppResult<Json<Vec<Flashcard>>> {
    let Json(request) = payload.map_err(json_rejection)?;
    let text = validate_text(&request.text)?;
    let cards = state.generator.generate(text).await?;
    Ok(Json(cards))
}

fn is_pdf(content_type: Option<&str>, file_name: Option<&str>) -> bool {
    content_type == Some("application/pdf")
        || file_name.is_some_and(|name| name.to_ascii_lowercase().ends_with(".pdf"))
}

async fn extract_pdf(
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<PdfExtraction>> {
    let mut multipart = multipart.map_err(|r| AppError::BadRequest(r.body_text()))?;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("pdf") {
            continue;
        }
        if !is_pdf(field.content_type(), field.file_name()) {
            return Err(AppError::BadRequest("File must be a PDF.".into()));
        }

        let data = field.bytes().await.map_err(multipart_error)?;
        if data.len() > PDF_MAX_FILE_SIZE_BYTES {
            return Err(too_large());
        }

        let result = tokio::task::spawn_blocking(move || pdf::extract_pdf(&data))
            .await
            .map_err(|e| AppError::Internal(format!("PDF extraction task failed: {e}")))??;
        return Ok(Json(result));
    }

    Err(AppError::BadRequest("No PDF file provided.".into()))
}

fn non_negative(name: &str, value: Option<i64>) -> AppResult<Option<u64>> {
    value
        .map(|v| {
            u64::try_from(v)
                .map_err(|_| AppError::BadRequest(format!("{name} must not be negative.")))
        })
        .transpose()
}

async fn extract_youtube(
    State(state): State<AppState>,
    payload: Result<Json<YoutubeRequest>, JsonRejection>,
) -> AppResult<Json<TranscriptExtraction>> {
    let Json(request) = payload.map_err(json_rejection)?;

    let url = request.url.trim();
    if url.is_empty() {
        return Err(AppError::BadRequest("A YouTube URL is required.".into()));
    }
    let start = non_negative("start_seconds", request.start_seconds)?;
    let end = non_negative("end_seconds", request.end_seconds)?;
    if let (Some(start), Some(end)) = (start, end) {
        if end <= start {
            return Err(AppError::BadRequest(
                "end_seconds must be greater than start_seconds.".into(),
            ));
        }
    }

    let result = state.transcripts.extract(url, start, end).await?;
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http::Request;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::services::generator::tests::StubClient;
    use crate::services::pdf::tests::build_pdf;
    use crate::services::transcript::tests::{StubSource, chunk};

    const CARDS_REPLY: &str = r#"```json
[{"front":"What is ATP?","back":"The cell's energy currency."}]
```"#;

    fn app_with(client: StubClient, source: StubSource) -> Router {
        router(AppState {
            generator: Arc::new(FlashcardGenerator::new(Arc::new(client))),
            transcripts: Arc::new(TranscriptExtractor::new(Arc::new(source))),
        })
    }

    fn app() -> Router {
        app_with(
            StubClient::replying(CARDS_REPLY),
            StubSource::Chunks(vec![
                chunk("welcome to the lecture", 0.0, 4.0),
                chunk("today: enzymes", 65.0, 3.0),
            ]),
        )
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn post_file(field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--BOUNDARY\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n--BOUNDARY--\r\n");

        Request::post("/extract/pdf/")
            .header("content-type", "multipart/form-data; boundary=BOUNDARY")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn generate_enforces_length_bounds() {
        let (status, body) = send(app(), post_json("/generate/", json!({ "text": "a".repeat(49) }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");

        let (status, body) = send(app(), post_json("/generate/", json!({ "text": "a".repeat(50) }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["front"], "What is ATP?");

        let (status, _) = send(app(), post_json("/generate/", json!({ "text": "a".repeat(50_000) }))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(app(), post_json("/generate/", json!({ "text": "a".repeat(50_001) }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn generate_counts_trimmed_text() {
        let padded = format!("   {}   ", "a".repeat(48));
        let (status, _) = send(app(), post_json("/generate/", json!({ "text": padded }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn generate_rejects_malformed_bodies() {
        let request = Request::post("/generate/")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, _) = send(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(app(), post_json("/generate/", json!({ "body": "x" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn generate_maps_model_failures_to_bad_gateway() {
        let text = json!({ "text": "a".repeat(60) });

        let failing = app_with(StubClient::failing("timeout"), StubSource::Missing);
        let (status, body) = send(failing, post_json("/generate/", text.clone())).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], "GENERATION_FAILED");

        let rambling = app_with(StubClient::replying("Sorry, no cards today."), StubSource::Missing);
        let (status, _) = send(rambling, post_json("/generate/", text)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn pdf_upload_returns_pages() {
        let pdf = build_pdf(&["cover page".to_string(), "chapter one".to_string()]);
        let (status, body) = send(app(), post_file("pdf", "notes.pdf", "application/pdf", &pdf)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_pages"], 2);
        assert_eq!(body["extracted_pages"], 2);
        assert_eq!(body["truncated"], false);
        assert_eq!(body["suggested_start_page"], 1);
        assert_eq!(body["pages"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn pdf_upload_validates_the_file() {
        let (status, _) = send(app(), post_file("pdf", "notes.txt", "text/plain", b"hello")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(app(), post_file("document", "notes.pdf", "application/pdf", b"%PDF")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(app(), post_file("pdf", "notes.pdf", "application/pdf", b"garbage")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "CORRUPTED_FILE");

        let (status, _) = send(app(), post_json("/extract/pdf/", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn pdf_upload_over_limit_is_rejected() {
        let oversized = vec![b'0'; PDF_MAX_FILE_SIZE_BYTES + 1];
        let (status, body) =
            send(app(), post_file("pdf", "big.pdf", "application/pdf", &oversized)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
    }

    #[tokio::test]
    async fn request_body_over_limit_is_json_413() {
        let limit = PDF_MAX_FILE_SIZE_BYTES + MULTIPART_OVERHEAD_BYTES;

        let oversized = vec![b'0'; limit + 1];
        let (status, body) =
            send(app(), post_file("pdf", "big.pdf", "application/pdf", &oversized)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
        assert_eq!(body["detail"], body["error"]);

        let (status, body) =
            send(app(), post_json("/generate/", json!({ "text": "a".repeat(limit) }))).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
    }

    #[tokio::test]
    async fn youtube_returns_transcript() {
        let request = post_json("/extract/youtube/", json!({ "url": "https://youtu.be/abc123" }));
        let (status, body) = send(app(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["video_id"], "abc123");
        assert_eq!(body["needs_segmentation"], false);
        assert_eq!(body["text"], "welcome to the lecture today: enzymes");
        assert_eq!(body["end_seconds"], 68);
        assert_eq!(body["minutes"][1]["minute"], 1);
    }

    #[tokio::test]
    async fn youtube_validates_request() {
        let (status, _) = send(app(), post_json("/extract/youtube/", json!({ "url": "  " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            app(),
            post_json("/extract/youtube/", json!({ "url": "https://example.com/abc123" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_URL");

        let (status, _) = send(
            app(),
            post_json(
                "/extract/youtube/",
                json!({ "url": "https://youtu.be/abc123", "start_seconds": -5 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            app(),
            post_json(
                "/extract/youtube/",
                json!({ "url": "https://youtu.be/abc123", "start_seconds": 20, "end_seconds": 10 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn youtube_caption_errors_are_unprocessable() {
        let request = || post_json("/extract/youtube/", json!({ "url": "https://youtu.be/abc123" }));

        let disabled = app_with(StubClient::replying("[]"), StubSource::Disabled);
        let (status, body) = send(disabled, request()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "CAPTIONS_DISABLED");

        let missing = app_with(StubClient::replying("[]"), StubSource::Missing);
        let (status, body) = send(missing, request()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "NO_TRANSCRIPT");
    }
}
