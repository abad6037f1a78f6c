pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::import::handlers;
use crate::state::AppState;

/// Headroom above the file cap for multipart framing, so a file just under
/// the cap is not rejected by the body limit.
const BODY_LIMIT_HEADROOM: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = usize::try_from(state.import.max_file_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(BODY_LIMIT_HEADROOM);

    Router::new()
        .route("/health", get(health::health_handler))
        // Import sessions
        .route(
            "/api/v1/import/sessions",
            post(handlers::handle_create_session),
        )
        .route(
            "/api/v1/import/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_delete_session),
        )
        .route(
            "/api/v1/import/sessions/:id/reset",
            post(handlers::handle_reset_session),
        )
        .route(
            "/api/v1/import/sessions/:id/document",
            post(handlers::handle_upload_document),
        )
        .route(
            "/api/v1/import/sessions/:id/parse",
            post(handlers::handle_parse),
        )
        .route(
            "/api/v1/import/sessions/:id/progress",
            get(handlers::handle_poll_progress),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::{Config, ExtractionBackend};
    use crate::document::docx::fixtures::docx_from_text;
    use crate::extraction::{
        CandidateResume, ExtractionRequest, ServiceError, StructuredExtractor,
    };

    const BOUNDARY: &str = "resume-import-test-boundary";

    struct FixedExtractor(Value);

    #[async_trait]
    impl StructuredExtractor for FixedExtractor {
        async fn extract(&self, _: &ExtractionRequest) -> Result<CandidateResume, ServiceError> {
            Ok(CandidateResume(self.0.clone()))
        }

        fn backend(&self) -> &'static str {
            "fixed"
        }
    }

    fn test_state(max_upload_bytes: u64) -> AppState {
        let config = Config {
            backend: ExtractionBackend::Function {
                url: "http://localhost/parse".into(),
                key: None,
            },
            extraction_timeout_secs: 5,
            max_upload_bytes,
            development_mode: false,
            session_ttl_secs: 3600,
            port: 0,
            rust_log: "debug".into(),
        };
        AppState::new(
            config,
            Arc::new(FixedExtractor(json!({"fullName": "John Doe"}))),
        )
    }

    fn app() -> Router {
        build_router(test_state(10 * 1024 * 1024))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post(uri: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn multipart_upload(uri: &str, file_name: &str, bytes: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
                 filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn create_session(app: &Router) -> String {
        let (status, body) = send(app, post("/api/v1/import/sessions")).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["state"], "idle");
        body["session_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app();
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["backend"], "fixed");
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let app = app();
        let uri = format!("/api/v1/import/sessions/{}", uuid::Uuid::new_v4());
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_upload_rejects_executable() {
        let app = app();
        let id = create_session(&app).await;

        let (status, body) = send(
            &app,
            multipart_upload(
                &format!("/api/v1/import/sessions/{id}/document"),
                "resume.exe",
                b"",
            ),
        )
        .await;

        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body["error"]["code"], "INVALID_FILE_TYPE");
        assert_eq!(body["error"]["message"], "Please upload a PDF or DOCX file");
        assert_eq!(body["error"]["retryable"], false);
    }

    #[tokio::test]
    async fn test_executable_refused_without_reading_body() {
        let app = app();
        let id = create_session(&app).await;

        // The part is never terminated; reading its data would fail as a bad request.
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"setup.exe\"\r\nContent-Type: application/octet-stream\r\n\r\nMZ..."
        );
        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("/api/v1/import/sessions/{id}/document"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        let (status, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body["error"]["code"], "INVALID_FILE_TYPE");
    }

    #[tokio::test]
    async fn test_upload_over_cap_is_file_too_large() {
        let app = build_router(test_state(1024));
        let id = create_session(&app).await;

        let (status, body) = send(
            &app,
            multipart_upload(
                &format!("/api/v1/import/sessions/{id}/document"),
                "resume.pdf",
                &vec![b'%'; 4096],
            ),
        )
        .await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"]["code"], "FILE_TOO_LARGE");
    }

    #[tokio::test]
    async fn test_upload_then_parse_flow() {
        let app = app();
        let id = create_session(&app).await;
        let docx = docx_from_text("John Doe\njohn@x.com\n555-123-4567");

        let (status, report) = send(
            &app,
            multipart_upload(
                &format!("/api/v1/import/sessions/{id}/document"),
                "resume.docx",
                &docx,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["no_text"], false);
        assert_eq!(report["file_type"], "docx");

        let (status, resume) = send(&app, post(&format!("/api/v1/import/sessions/{id}/parse"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resume["fullName"], "John Doe");
        assert_eq!(resume["email"], "john@x.com");
        assert_eq!(resume["phone"], "555-123-4567");
        assert_eq!(resume["skills"], json!([]));

        let request = Request::builder()
            .uri(format!("/api/v1/import/sessions/{id}"))
            .body(Body::empty())
            .unwrap();
        let (_, status_body) = send(&app, request).await;
        assert_eq!(status_body["state"], "done");
        assert_eq!(status_body["progress"]["phase"], "parsing");
        assert_eq!(status_body["progress"]["fraction"], 1.0);
    }

    #[tokio::test]
    async fn test_parse_without_document_conflicts() {
        let app = app();
        let id = create_session(&app).await;
        let (status, body) = send(&app, post(&format!("/api/v1/import/sessions/{id}/parse"))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "INVALID_TRANSITION");
    }

    #[tokio::test]
    async fn test_malformed_parse_options_rejected() {
        let app = app();
        let id = create_session(&app).await;
        let docx = docx_from_text("John Doe");
        send(
            &app,
            multipart_upload(
                &format!("/api/v1/import/sessions/{id}/document"),
                "resume.docx",
                &docx,
            ),
        )
        .await;

        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("/api/v1/import/sessions/{id}/parse"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"user_id": "#))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("/api/v1/import/sessions/{id}/parse"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"user_id": "user-42"}"#))
            .unwrap();
        let (status, resume) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resume["fullName"], "John Doe");
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_poll_times_out_with_current_event() {
        let app = app();
        let id = create_session(&app).await;
        let request = Request::builder()
            .uri(format!("/api/v1/import/sessions/{id}/progress"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn test_reset_and_delete() {
        let app = app();
        let id = create_session(&app).await;

        let (status, body) = send(&app, post(&format!("/api/v1/import/sessions/{id}/reset"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "idle");

        let delete = Request::builder()
            .method(Method::DELETE)
            .uri(format!("/api/v1/import/sessions/{id}"))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, delete).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, post(&format!("/api/v1/import/sessions/{id}/reset"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
