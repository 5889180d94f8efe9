//! smtp-diag: SMTP diagnostics
//!
//! This library bundles two tools for checking a mail relay setup:
//!
//! - a certificate probe that connects to an SMTP server (upgrading with
//!   `STARTTLS` on the submission port), reads the TLS certificate and tells
//!   whether the host name in use matches it
//! - a test email sender, usable from the command line or over a small HTTP
//!   API
//!
//! # Example
//!
//! ```no_run
//! use smtp_diag::common::Console;
//! use smtp_diag::config::MailConfig;
//! use smtp_diag::probe::{ProbeOptions, ProbeTarget, Prober};
//!
//! let config = MailConfig::default();
//! let prober = Prober::new(ProbeOptions::from_config(&config));
//!
//! let target = ProbeTarget::new("smtp.example.com", 587);
//! if let Some(outcome) = prober.run(&target, &mut Console::stdout()) {
//!     println!("hostname matches: {}", outcome.verdict.matched);
//! }
//! ```

// Public modules
pub mod api;
pub mod commands;
pub mod common;
pub mod config;
pub mod mail;
pub mod probe;

// Re-export commonly used structures and functions for convenience
pub use common::{DiagError, Result};
pub use config::MailConfig;
pub use probe::{ProbeOutcome, ProbeTarget, Prober};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
