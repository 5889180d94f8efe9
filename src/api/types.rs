//! HTTP API request and response bodies

use serde::{Deserialize, Serialize};

use crate::config::ConfigStatus;

/// Subject used when a plain-text request omits one
pub const DEFAULT_SUBJECT: &str = "Test Email";

/// Body used when a plain-text request omits one
pub const DEFAULT_MESSAGE: &str = "This is a test email from smtp-diag.";

/// Subject used when an HTML request omits one
pub const DEFAULT_HTML_SUBJECT: &str = "Test HTML Email";

/// Body used when an HTML request omits one
pub const DEFAULT_HTML_CONTENT: &str = "<h1>This is a test HTML email</h1>";

/// `POST /send/` body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendRequest {
    pub to_email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

/// `POST /send-html/` body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendHtmlRequest {
    pub to_email: Option<String>,
    pub subject: Option<String>,
    pub html_content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub success: bool,
    pub config: ConfigStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}
