//! Error handling module
//!
//! This module defines the crate-level error type and result alias used by
//! the command-line interface and the HTTP server.

use thiserror::Error;
use std::io;

use crate::mail::MailError;

/// smtp-diag error type
#[derive(Error, Debug)]
pub enum DiagError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Mail delivery error
    #[error("Failed to send email: {0}")]
    Mail(#[from] MailError),

    /// Other error
    #[error("Other error: {0}")]
    Other(String),
}

/// Result type alias
///
/// This is a `Result` type alias that uses our custom `DiagError`.
pub type Result<T> = std::result::Result<T, DiagError>;
