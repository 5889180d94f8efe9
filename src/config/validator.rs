//! Configuration validator
//!
//! This module provides functionality for validating configuration.

use lettre::message::Mailbox;

use crate::config::error::{ConfigError, Result};
use crate::config::types::MailConfig;

/// Validate the configuration
///
/// Only fatal problems are reported here; see
/// [`ConfigValidator::check_warnings`] for the rest.
pub fn validate_config(config: &MailConfig) -> Result<()> {
    validate_mail_settings(config)?;
    validate_general_settings(config)
}

/// Validate mail settings
fn validate_mail_settings(config: &MailConfig) -> Result<()> {
    if config.use_tls() && config.use_ssl() {
        return Err(ConfigError::InvalidCombination(
            "use_tls and use_ssl are mutually exclusive, enable only one of them".to_string()
        ));
    }

    if config.port() == 0 {
        return Err(ConfigError::InvalidValue(
            "port".to_string(),
            "Port must be greater than 0".to_string()
        ));
    }

    if config.host().trim().is_empty() {
        return Err(ConfigError::InvalidValue(
            "host".to_string(),
            "Host must not be empty".to_string()
        ));
    }

    if let Err(e) = config.default_from_email().parse::<Mailbox>() {
        return Err(ConfigError::InvalidValue(
            "default_from_email".to_string(),
            format!("'{}' is not a valid address: {}", config.default_from_email(), e)
        ));
    }

    Ok(())
}

/// Validate general settings
fn validate_general_settings(config: &MailConfig) -> Result<()> {
    if config.timeout_secs() == 0 {
        return Err(ConfigError::InvalidValue(
            "timeout".to_string(),
            "Timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Configuration validator trait
pub trait ConfigValidator {
    /// Check configuration for non-fatal issues
    fn check_warnings(&self) -> Vec<String>;
}

impl ConfigValidator for MailConfig {
    fn check_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        match self.log_level() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            level => {
                warnings.push(format!("Invalid log level '{}', using default 'info'", level));
            }
        }

        match (self.host_user().is_empty(), self.host_password().is_empty()) {
            (false, true) => warnings.push(
                "host_user is set without host_password, SMTP authentication is disabled".to_string()
            ),
            (true, false) => warnings.push(
                "host_password is set without host_user, SMTP authentication is disabled".to_string()
            ),
            _ => {}
        }

        warnings
    }
}
