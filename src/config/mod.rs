//! Configuration module
//!
//! This module handles application configuration: loading from defaults,
//! a JSON file, environment variables and command-line flags, tracking where
//! each value came from, and validating the result.

pub mod builder;
pub mod defaults;
pub mod error;
pub mod source;
pub mod types;
pub mod validator;

// Re-export types and traits
pub use self::builder::{ConfigBuilder, load};
pub use self::defaults::{DEFAULT_CONFIG_FILE, ENV_PREFIX};
pub use self::error::ConfigError;
pub use self::source::{CliSource, ConfigSource, DefaultSource, EnvSource, FileSource};
pub use self::types::{
    CertificateParser, ConfigStatus, ConfigValues, MailBackend, MailConfig, ValueSource,
    parse_socket_addr,
};
pub use self::validator::{ConfigValidator, validate_config};
