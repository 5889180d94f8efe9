//! HTTP API request handlers

use axum::extract::State;
use axum::response::{IntoResponse, Json};
use bytes::Bytes;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::api::error::{ApiError, ApiResult};
use crate::api::server::AppState;
use crate::api::types::*;
use crate::mail::{self, MailError, MailTransport};

/// Liveness probe
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Send a plain-text test email
pub async fn send_test_email(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<SendResponse>> {
    let request: SendRequest = parse_body(&body)?;
    let to_email = required_recipient(request.to_email)?;
    let subject = request.subject.unwrap_or_else(|| DEFAULT_SUBJECT.to_string());
    let message = request.message.unwrap_or_else(|| DEFAULT_MESSAGE.to_string());

    let to = to_email.clone();
    deliver(&state, move |transport, from| {
        mail::send_plain_text_mail(transport, &subject, &message, from, &to)
    })
    .await?;

    Ok(Json(SendResponse {
        success: true,
        message: format!("Email sent successfully to {}", to_email),
    }))
}

/// Send an HTML test email
pub async fn send_html_email(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<SendResponse>> {
    let request: SendHtmlRequest = parse_body(&body)?;
    let to_email = required_recipient(request.to_email)?;
    let subject = request.subject.unwrap_or_else(|| DEFAULT_HTML_SUBJECT.to_string());
    let html_content = request.html_content.unwrap_or_else(|| DEFAULT_HTML_CONTENT.to_string());

    let to = to_email.clone();
    deliver(&state, move |transport, from| {
        mail::send_html_mail(transport, &subject, &html_content, from, &to)
    })
    .await?;

    Ok(Json(SendResponse {
        success: true,
        message: format!("HTML email sent successfully to {}", to_email),
    }))
}

/// Current mail settings without secrets
pub async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        success: true,
        config: state.config.status(),
    })
}

/// Decode a request body that must be a JSON object
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> ApiResult<T> {
    let invalid = |e: serde_json::Error| {
        log::debug!("Rejecting request body: {}", e);
        ApiError::BadRequest("Invalid JSON in request body".to_string())
    };

    let object: Map<String, Value> = serde_json::from_slice(body).map_err(invalid)?;
    serde_json::from_value(Value::Object(object)).map_err(invalid)
}

fn required_recipient(to_email: Option<String>) -> ApiResult<String> {
    match to_email {
        Some(to) if !to.is_empty() => Ok(to),
        _ => Err(ApiError::BadRequest("to_email is required".to_string())),
    }
}

/// Run a blocking delivery on the blocking thread pool
async fn deliver<F>(state: &AppState, job: F) -> ApiResult<()>
where
    F: FnOnce(&dyn MailTransport, &str) -> Result<(), MailError> + Send + 'static,
{
    let transport = state.transport.clone();
    let from = state.config.default_from_email().to_string();

    tokio::task::spawn_blocking(move || job(transport.as_ref(), &from)).await??;
    Ok(())
}
