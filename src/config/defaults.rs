//! Default configuration values
//!
//! Single source of truth for defaults. They mirror the conventional
//! defaults of a local mail setup: plain SMTP on localhost port 25.

use std::net::SocketAddr;
use std::time::Duration;

use super::types::{CertificateParser, MailBackend};

/// Environment variable prefix for all configuration options
pub const ENV_PREFIX: &str = "SMTP_DIAG_";

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "smtp-diag.json";

/// Default mail host
pub const HOST_STR: &str = "localhost";

/// Default mail port
pub const PORT: u16 = 25;

/// Default sender address
pub const DEFAULT_FROM_EMAIL_STR: &str = "webmaster@localhost";

/// Default HTTP listen address as string
pub const LISTEN_STR: &str = "127.0.0.1:8000";

/// Default log level as string
pub const LOG_LEVEL_STR: &str = "info";

/// Default network timeout in seconds
pub const TIMEOUT_SECS: u64 = 10;

/// Default mail backend
pub fn backend() -> MailBackend {
    MailBackend::Smtp
}

/// Default certificate parser
pub fn cert_parser() -> CertificateParser {
    CertificateParser::Structured
}

/// Default HTTP listen address
pub fn listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8000))
}

/// Default network timeout
pub fn timeout() -> Duration {
    Duration::from_secs(TIMEOUT_SECS)
}
