//! Configuration sources
//!
//! This module defines the trait and implementations for loading configuration
//! from defaults, a JSON file, environment variables and parsed command-line flags.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use log::{debug, warn};

use crate::config::error::{ConfigError, Result};
use crate::config::types::{
    CertificateParser, ConfigValues, MailBackend, MailConfig, ValueSource, parse_bool, parse_socket_addr,
};

/// Configuration source trait
pub trait ConfigSource {
    /// Load configuration from this source
    fn load(&self) -> Result<MailConfig>;

    /// Get the source type
    fn source_type(&self) -> ValueSource;
}

/// Attach the source type to every value present in `values`
fn tracked(values: ConfigValues, source: ValueSource) -> MailConfig {
    let mut config = MailConfig::from_values(values);
    for name in config.values.present_fields() {
        config.sources.insert(name.to_string(), source);
    }
    config
}

/// Default configuration source
pub struct DefaultSource;

impl ConfigSource for DefaultSource {
    fn load(&self) -> Result<MailConfig> {
        debug!("Loading default configuration");
        Ok(MailConfig::default())
    }

    fn source_type(&self) -> ValueSource {
        ValueSource::Default
    }
}

/// JSON file configuration source
pub struct FileSource {
    pub path: PathBuf,
}

impl FileSource {
    /// Create a new file source
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ConfigSource for FileSource {
    fn load(&self) -> Result<MailConfig> {
        debug!("Loading configuration from file: {}", self.path.display());

        if !self.path.exists() {
            warn!("Configuration file not found: {}", self.path.display());
            warn!("Will use default values unless overridden by environment variables or command line arguments");
            return Ok(MailConfig::empty());
        }

        let contents = fs::read_to_string(&self.path).map_err(|e| {
            warn!("Failed to read configuration file {}: {}", self.path.display(), e);
            ConfigError::FileReadError(self.path.clone(), e.to_string())
        })?;

        let values: ConfigValues = serde_json::from_str(&contents).map_err(|e| {
            let err_msg = format!("Error parsing {}: {}", self.path.display(), e);
            warn!("{}", err_msg);
            ConfigError::ParseError(err_msg)
        })?;

        let mut config = tracked(values, self.source_type());
        config.config_file = Some(self.path.clone());

        Ok(config)
    }

    fn source_type(&self) -> ValueSource {
        ValueSource::File
    }
}

/// Environment variable configuration source
///
/// Variable names are the prefix followed by the conventional setting name,
/// e.g. `SMTP_DIAG_EMAIL_HOST`. Unparseable values are logged and skipped.
pub struct EnvSource {
    pub prefix: String,
}

impl EnvSource {
    /// Create a new environment source
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }

    fn var(&self, name: &str) -> Option<(String, String)> {
        let full_name = format!("{}{}", self.prefix, name);
        env::var(&full_name).ok().map(|value| {
            debug!("Found environment variable {}", full_name);
            (full_name, value)
        })
    }
}

impl ConfigSource for EnvSource {
    fn load(&self) -> Result<MailConfig> {
        debug!("Loading configuration from environment variables with prefix: {}", self.prefix);

        let mut values = ConfigValues::default();

        macro_rules! parsed {
            ($env:expr, $field:ident, $parse:expr) => {
                if let Some((name, raw)) = self.var($env) {
                    match $parse(raw.as_str()) {
                        Some(value) => values.$field = Some(value),
                        None => warn!("Invalid value in environment: {}={}", name, raw),
                    }
                }
            };
        }

        parsed!("EMAIL_BACKEND", backend, |s: &str| s.parse::<MailBackend>().ok());
        parsed!("EMAIL_HOST", host, |s: &str| Some(s.to_string()));
        parsed!("EMAIL_PORT", port, |s: &str| s.parse::<u16>().ok());
        parsed!("EMAIL_USE_TLS", use_tls, parse_bool);
        parsed!("EMAIL_USE_SSL", use_ssl, parse_bool);
        parsed!("EMAIL_HOST_USER", host_user, |s: &str| Some(s.to_string()));
        parsed!("EMAIL_HOST_PASSWORD", host_password, |s: &str| Some(s.to_string()));
        parsed!("DEFAULT_FROM_EMAIL", default_from_email, |s: &str| Some(s.to_string()));
        parsed!("TIMEOUT", timeout, |s: &str| s.parse::<u64>().ok());
        parsed!("LISTEN", listen, |s: &str| parse_socket_addr(s).ok());
        parsed!("LOG_LEVEL", log_level, |s: &str| Some(s.to_string()));
        parsed!("CERT_PARSER", cert_parser, |s: &str| s.parse::<CertificateParser>().ok());

        Ok(tracked(values, self.source_type()))
    }

    fn source_type(&self) -> ValueSource {
        ValueSource::Environment
    }
}

/// Command line argument configuration source
///
/// Holds the values taken from already-parsed command-line flags.
pub struct CliSource {
    pub values: ConfigValues,
}

impl CliSource {
    /// Create a new command line source
    pub fn new(values: ConfigValues) -> Self {
        Self { values }
    }
}

impl ConfigSource for CliSource {
    fn load(&self) -> Result<MailConfig> {
        debug!("Loading configuration from command line arguments");
        Ok(tracked(self.values.clone(), self.source_type()))
    }

    fn source_type(&self) -> ValueSource {
        ValueSource::CommandLine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_yields_empty_config() {
        let source = FileSource::new("/nonexistent/smtp-diag.json");
        let config = source.load().unwrap();

        assert!(config.values.present_fields().is_empty());
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_file_source_tracks_values() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"host": "smtp.example.com", "port": 587, "use_tls": true}}"#).unwrap();

        let config = FileSource::new(file.path()).load().unwrap();

        assert_eq!(config.values.host.as_deref(), Some("smtp.example.com"));
        assert_eq!(config.values.port, Some(587));
        assert_eq!(config.source("use_tls"), "file");
        assert_eq!(config.source("backend"), "unknown");
        assert_eq!(config.config_file.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_file_source_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        match FileSource::new(file.path()).load() {
            Err(ConfigError::ParseError(msg)) => assert!(msg.contains("Error parsing")),
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_env_source() {
        env::set_var("SMTP_DIAG_TEST_EMAIL_HOST", "relay.example.com");
        env::set_var("SMTP_DIAG_TEST_EMAIL_PORT", "2525");
        env::set_var("SMTP_DIAG_TEST_EMAIL_USE_TLS", "yes");
        env::set_var("SMTP_DIAG_TEST_TIMEOUT", "not-a-number");

        let config = EnvSource::new("SMTP_DIAG_TEST_").load().unwrap();

        env::remove_var("SMTP_DIAG_TEST_EMAIL_HOST");
        env::remove_var("SMTP_DIAG_TEST_EMAIL_PORT");
        env::remove_var("SMTP_DIAG_TEST_EMAIL_USE_TLS");
        env::remove_var("SMTP_DIAG_TEST_TIMEOUT");

        assert_eq!(config.values.host.as_deref(), Some("relay.example.com"));
        assert_eq!(config.values.port, Some(2525));
        assert_eq!(config.values.use_tls, Some(true));
        assert_eq!(config.values.timeout, None);
        assert_eq!(config.source("port"), "environment");
    }

    #[test]
    fn test_cli_source() {
        let values = ConfigValues {
            log_level: Some("debug".to_string()),
            ..Default::default()
        };

        let config = CliSource::new(values).load().unwrap();
        assert_eq!(config.log_level(), "debug");
        assert_eq!(config.source("log_level"), "command line");
    }
}
