//! HTTP API tests with a recording transport

use std::sync::{Arc, Mutex};

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use lettre::Message;
use smtp_diag::api::{build_router, AppState, ErrorResponse, SendResponse};
use smtp_diag::config::MailConfig;
use smtp_diag::mail::{MailError, MailTransport};
use tower::ServiceExt;

/// Keeps every message handed to it
#[derive(Default)]
struct Recorder {
    sent: Mutex<Vec<String>>,
}

impl MailTransport for Recorder {
    fn send(&self, message: &Message) -> Result<(), MailError> {
        let formatted = String::from_utf8_lossy(&message.formatted()).to_string();
        self.sent.lock().unwrap().push(formatted);
        Ok(())
    }
}

fn config() -> MailConfig {
    let mut config = MailConfig::default();
    config.values.default_from_email = Some("diag@example.com".to_string());
    config
}

async fn post(recorder: Arc<Recorder>, uri: &str, body: &str) -> (StatusCode, Vec<u8>) {
    let app = build_router(AppState::new(config(), recorder));
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

#[tokio::test]
async fn test_send_delivers_one_message_with_defaults() {
    let recorder = Arc::new(Recorder::default());

    let (status, body) = post(recorder.clone(), "/send/", r#"{"to_email": "ops@example.com"}"#).await;

    assert_eq!(status, StatusCode::OK);
    let body: SendResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(body.message, "Email sent successfully to ops@example.com");

    let sent = recorder.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("From: diag@example.com"));
    assert!(sent[0].contains("Subject: Test Email"));
    assert!(sent[0].contains("This is a test email from smtp-diag."));
}

#[tokio::test]
async fn test_send_html_uses_custom_subject() {
    let recorder = Arc::new(Recorder::default());

    let (status, _) = post(
        recorder.clone(),
        "/send-html/",
        r#"{"to_email": "ops@example.com", "subject": "Relay check"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let sent = recorder.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("Subject: Relay check"));
    assert!(sent[0].contains("Content-Type: text/html; charset=utf-8"));
    assert!(sent[0].contains("<h1>This is a test HTML email</h1>"));
}

#[tokio::test]
async fn test_invalid_recipient_is_server_error() {
    let recorder = Arc::new(Recorder::default());

    let (status, body) = post(recorder.clone(), "/send/", r#"{"to_email": "not an address"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert!(!body.success);
    assert!(body.error.contains("not an address"));
    assert!(recorder.sent.lock().unwrap().is_empty());
}
