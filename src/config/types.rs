//! Configuration types
//!
//! This module contains the main configuration types used throughout the application.

use std::collections::HashMap;
use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use serde::{Deserialize, Deserializer, Serialize};
use log::debug;

use crate::config::defaults;
use crate::config::error::{ConfigError, Result};

/// Mail delivery backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MailBackend {
    /// Deliver through an SMTP relay
    Smtp,
    /// Print the formatted message to stdout
    Console,
}

impl Default for MailBackend {
    fn default() -> Self {
        defaults::backend()
    }
}

impl fmt::Display for MailBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MailBackend::Smtp => write!(f, "smtp"),
            MailBackend::Console => write!(f, "console"),
        }
    }
}

impl FromStr for MailBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "smtp" => Ok(Self::Smtp),
            "console" => Ok(Self::Console),
            _ => Err(ConfigError::InvalidValue(
                "backend".to_string(),
                format!("Invalid mail backend: {}. Valid values are: smtp, console", s)
            )),
        }
    }
}

/// Which certificate parser the probe uses
///
/// `Structured` parses the DER encoding of the peer certificate.
/// `Raw` reads the name/value fields the TLS session exposes directly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CertificateParser {
    Structured,
    Raw,
}

impl Default for CertificateParser {
    fn default() -> Self {
        defaults::cert_parser()
    }
}

impl fmt::Display for CertificateParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CertificateParser::Structured => write!(f, "structured"),
            CertificateParser::Raw => write!(f, "raw"),
        }
    }
}

impl FromStr for CertificateParser {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "structured" => Ok(Self::Structured),
            "raw" => Ok(Self::Raw),
            _ => Err(ConfigError::InvalidValue(
                "cert_parser".to_string(),
                format!("Invalid certificate parser: {}. Valid values are: structured, raw", s)
            )),
        }
    }
}

/// Source of a configuration value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueSource {
    /// Default value
    Default,
    /// From configuration file
    File,
    /// From environment variable
    Environment,
    /// From command line argument
    CommandLine,
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::Default => write!(f, "default"),
            ValueSource::File => write!(f, "file"),
            ValueSource::Environment => write!(f, "environment"),
            ValueSource::CommandLine => write!(f, "command line"),
        }
    }
}

/// Custom deserializer for socket addresses
fn deserialize_socket_addr<'de, D>(deserializer: D) -> std::result::Result<Option<SocketAddr>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = Option::<String>::deserialize(deserializer)?;
    match s {
        Some(addr_str) => parse_socket_addr(&addr_str)
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Parse a socket address string, resolving host names if needed
pub fn parse_socket_addr(addr: &str) -> Result<SocketAddr> {
    if let Ok(addr) = addr.parse::<SocketAddr>() {
        return Ok(addr);
    }

    match addr.to_socket_addrs() {
        Ok(mut addrs) => addrs.next().ok_or_else(|| ConfigError::InvalidValue(
            "listen".to_string(),
            format!("Could not resolve address: {}", addr)
        )),
        Err(e) => Err(ConfigError::InvalidValue(
            "listen".to_string(),
            format!("Invalid socket address '{}': {}", addr, e)
        )),
    }
}

/// Parse a boolean flag the way environment variables usually spell it
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration values
///
/// Every field is optional so that partial sources (a file, the
/// environment, the command line) can be layered on top of each other.
/// Field names also accept the conventional `EMAIL_*` setting names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigValues {
    // --- Mail settings ---

    /// Mail backend (smtp, console)
    #[serde(default, alias = "email_backend")]
    pub backend: Option<MailBackend>,

    /// SMTP host
    #[serde(default, alias = "email_host")]
    pub host: Option<String>,

    /// SMTP port
    #[serde(default, alias = "email_port")]
    pub port: Option<u16>,

    /// Upgrade the connection with STARTTLS
    #[serde(default, alias = "email_use_tls")]
    pub use_tls: Option<bool>,

    /// Use implicit TLS from the first byte
    #[serde(default, alias = "email_use_ssl")]
    pub use_ssl: Option<bool>,

    /// SMTP user name
    #[serde(default, alias = "email_host_user")]
    pub host_user: Option<String>,

    /// SMTP password
    #[serde(default, alias = "email_host_password")]
    pub host_password: Option<String>,

    /// Sender address for test messages
    #[serde(default)]
    pub default_from_email: Option<String>,

    /// Network timeout in seconds
    #[serde(default, alias = "email_timeout")]
    pub timeout: Option<u64>,

    // --- Tool settings ---

    /// HTTP API listen address (host:port)
    #[serde(default, deserialize_with = "deserialize_socket_addr")]
    pub listen: Option<SocketAddr>,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default)]
    pub log_level: Option<String>,

    /// Certificate parser used by the probe
    #[serde(default)]
    pub cert_parser: Option<CertificateParser>,
}

impl ConfigValues {
    /// Names of the fields that carry a value
    pub fn present_fields(&self) -> Vec<&'static str> {
        let fields = [
            ("backend", self.backend.is_some()),
            ("host", self.host.is_some()),
            ("port", self.port.is_some()),
            ("use_tls", self.use_tls.is_some()),
            ("use_ssl", self.use_ssl.is_some()),
            ("host_user", self.host_user.is_some()),
            ("host_password", self.host_password.is_some()),
            ("default_from_email", self.default_from_email.is_some()),
            ("timeout", self.timeout.is_some()),
            ("listen", self.listen.is_some()),
            ("log_level", self.log_level.is_some()),
            ("cert_parser", self.cert_parser.is_some()),
        ];

        fields
            .into_iter()
            .filter_map(|(name, present)| present.then_some(name))
            .collect()
    }
}

/// Mail configuration
///
/// Immutable once built; passed explicitly to the probe, the mail sender
/// and the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailConfig {
    /// Configuration values
    pub values: ConfigValues,

    /// Configuration file path
    pub config_file: Option<PathBuf>,

    /// Source tracking for configuration values
    pub sources: HashMap<String, ValueSource>,
}

impl Deref for MailConfig {
    type Target = ConfigValues;

    fn deref(&self) -> &Self::Target {
        &self.values
    }
}

impl<'de> Deserialize<'de> for MailConfig {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let values = ConfigValues::deserialize(deserializer)?;
        Ok(Self::from_values(values))
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        let mut config = Self::empty();

        // Apply default values and track their source
        config.set_default_values();

        config
    }
}

/// Configuration status safe to expose over the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigStatus {
    pub email_backend: String,
    pub email_host: String,
    pub email_port: u16,
    pub email_use_tls: bool,
    pub email_use_ssl: bool,
    pub default_from_email: String,
    pub has_credentials: bool,
}

impl MailConfig {
    /// Configuration without any values or sources
    pub fn empty() -> Self {
        Self::from_values(ConfigValues::default())
    }

    /// Wrap raw values without tracking sources
    pub fn from_values(values: ConfigValues) -> Self {
        Self {
            values,
            config_file: None,
            sources: HashMap::new(),
        }
    }

    /// Set default values for all configuration options that are still unset
    pub fn set_default_values(&mut self) {
        macro_rules! default_field {
            ($name:ident, $value:expr) => {
                if self.values.$name.is_none() {
                    self.values.$name = Some($value);
                    self.sources.insert(stringify!($name).to_string(), ValueSource::Default);
                }
            };
        }

        default_field!(backend, defaults::backend());
        default_field!(host, defaults::HOST_STR.to_string());
        default_field!(port, defaults::PORT);
        default_field!(use_tls, false);
        default_field!(use_ssl, false);
        default_field!(host_user, String::new());
        default_field!(host_password, String::new());
        default_field!(default_from_email, defaults::DEFAULT_FROM_EMAIL_STR.to_string());
        default_field!(timeout, defaults::TIMEOUT_SECS);
        default_field!(listen, defaults::listen());
        default_field!(log_level, defaults::LOG_LEVEL_STR.to_string());
        default_field!(cert_parser, defaults::cert_parser());
    }

    /// Get the source of a configuration value
    pub fn source(&self, name: &str) -> String {
        self.sources
            .get(name)
            .map(ToString::to_string)
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Get the mail backend
    pub fn backend(&self) -> MailBackend {
        self.values.backend.unwrap_or_default()
    }

    /// Get the SMTP host
    pub fn host(&self) -> &str {
        self.values.host.as_deref().unwrap_or(defaults::HOST_STR)
    }

    /// Get the SMTP port
    pub fn port(&self) -> u16 {
        self.values.port.unwrap_or(defaults::PORT)
    }

    /// Whether STARTTLS is used
    pub fn use_tls(&self) -> bool {
        self.values.use_tls.unwrap_or(false)
    }

    /// Whether implicit TLS is used
    pub fn use_ssl(&self) -> bool {
        self.values.use_ssl.unwrap_or(false)
    }

    /// Get the SMTP user name
    pub fn host_user(&self) -> &str {
        self.values.host_user.as_deref().unwrap_or("")
    }

    /// Get the SMTP password
    pub fn host_password(&self) -> &str {
        self.values.host_password.as_deref().unwrap_or("")
    }

    /// Whether both a user name and a password are configured
    pub fn has_credentials(&self) -> bool {
        !self.host_user().is_empty() && !self.host_password().is_empty()
    }

    /// Get the sender address
    pub fn default_from_email(&self) -> &str {
        self.values
            .default_from_email
            .as_deref()
            .unwrap_or(defaults::DEFAULT_FROM_EMAIL_STR)
    }

    /// Get the timeout in seconds
    pub fn timeout_secs(&self) -> u64 {
        self.values.timeout.unwrap_or(defaults::TIMEOUT_SECS)
    }

    /// Get the network timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs())
    }

    /// Get the HTTP listen address
    pub fn listen(&self) -> SocketAddr {
        self.values.listen.unwrap_or_else(defaults::listen)
    }

    /// Get the log level
    pub fn log_level(&self) -> &str {
        self.values.log_level.as_deref().unwrap_or(defaults::LOG_LEVEL_STR)
    }

    /// Get the certificate parser
    pub fn cert_parser(&self) -> CertificateParser {
        self.values.cert_parser.unwrap_or_default()
    }

    /// Get the configuration file path
    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    /// Status report without secrets
    pub fn status(&self) -> ConfigStatus {
        ConfigStatus {
            email_backend: self.backend().to_string(),
            email_host: self.host().to_string(),
            email_port: self.port(),
            email_use_tls: self.use_tls(),
            email_use_ssl: self.use_ssl(),
            default_from_email: self.default_from_email().to_string(),
            has_credentials: self.has_credentials(),
        }
    }

    /// Merge two configurations
    ///
    /// Values present in `other` win and are attributed to `source`.
    pub fn merge(&self, other: &MailConfig, source: ValueSource) -> Self {
        let mut result = self.clone();

        macro_rules! merge_field {
            ($name:ident) => {
                if other.values.$name.is_some() {
                    result.values.$name = other.values.$name.clone();
                    result.sources.insert(stringify!($name).to_string(), source);
                }
            };
        }

        // Mail settings
        merge_field!(backend);
        merge_field!(host);
        merge_field!(port);
        merge_field!(use_tls);
        merge_field!(use_ssl);
        merge_field!(host_user);
        merge_field!(host_password);
        merge_field!(default_from_email);
        merge_field!(timeout);

        // Tool settings
        merge_field!(listen);
        merge_field!(log_level);
        merge_field!(cert_parser);

        if let Some(path) = &other.config_file {
            result.config_file = Some(path.clone());
        }

        result
    }

    /// Log the configuration
    pub fn log(&self) {
        debug!("=== Configuration ===");
        debug!("Mail settings:");
        debug!("  Backend: {} (from {})", self.backend(), self.source("backend"));
        debug!("  Host: {} (from {})", self.host(), self.source("host"));
        debug!("  Port: {} (from {})", self.port(), self.source("port"));
        debug!("  STARTTLS: {} (from {})", self.use_tls(), self.source("use_tls"));
        debug!("  Implicit TLS: {} (from {})", self.use_ssl(), self.source("use_ssl"));
        debug!("  User: {} (from {})", self.host_user(), self.source("host_user"));
        debug!(
            "  Password: {} (from {})",
            if self.host_password().is_empty() { "<empty>" } else { "<set>" },
            self.source("host_password")
        );
        debug!("  From: {} (from {})", self.default_from_email(), self.source("default_from_email"));
        debug!("  Timeout: {} seconds (from {})", self.timeout_secs(), self.source("timeout"));

        debug!("Tool settings:");
        debug!("  Listen address: {} (from {})", self.listen(), self.source("listen"));
        debug!("  Log level: {} (from {})", self.log_level(), self.source("log_level"));
        debug!("  Certificate parser: {} (from {})", self.cert_parser(), self.source("cert_parser"));

        if let Some(file) = self.config_file() {
            debug!("  Configuration file: {}", file.display());
        }

        debug!("=====================");
    }
}
