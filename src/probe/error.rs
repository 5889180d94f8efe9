//! Probe error classification

use std::io;
use thiserror::Error;

use super::target::ProbeTarget;

/// Classified certificate probe failure
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Connect, read or write timed out
    #[error("Connection timeout to {host}:{port}")]
    Timeout { host: String, port: u16 },

    /// Host name could not be resolved
    #[error("DNS resolution failed: {0}")]
    Dns(String),

    /// Nothing listens on the target port
    #[error("Connection refused by {host}:{port}")]
    ConnectionRefused { host: String, port: u16 },

    /// Peer hung up before the exchange finished
    #[error("Connection closed by {host}:{port}: {detail}")]
    ConnectionClosed { host: String, port: u16, detail: String },

    /// TLS layer rejected the handshake
    #[error("TLS handshake failed: {0}")]
    TlsHandshake(String),

    /// Anything else, reported with its kind
    #[error("Error: {kind}: {message}")]
    Other { kind: String, message: String },
}

impl ProbeError {
    /// Classify an I/O error raised while talking to `target`
    pub fn from_io(err: io::Error, target: &ProbeTarget) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ProbeError::Timeout {
                host: target.host().to_string(),
                port: target.port(),
            },
            io::ErrorKind::ConnectionRefused => ProbeError::ConnectionRefused {
                host: target.host().to_string(),
                port: target.port(),
            },
            io::ErrorKind::UnexpectedEof => ProbeError::ConnectionClosed {
                host: target.host().to_string(),
                port: target.port(),
                detail: err.to_string(),
            },
            kind => ProbeError::Other {
                kind: format!("{:?}", kind),
                message: err.to_string(),
            },
        }
    }

    /// Whether the strict handshake may be retried without verification
    pub fn is_tls_failure(&self) -> bool {
        matches!(self, ProbeError::TlsHandshake(_))
    }
}

impl From<openssl::error::ErrorStack> for ProbeError {
    fn from(err: openssl::error::ErrorStack) -> Self {
        ProbeError::Other {
            kind: "SslError".to_string(),
            message: err.to_string(),
        }
    }
}
