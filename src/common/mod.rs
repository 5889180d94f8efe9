//! Common module
//!
//! This module contains shared errors, logging setup and the output sink
//! used by the diagnostic commands.

pub mod error;
pub mod log;
pub mod output;

// Re-export commonly used types and functions
pub use error::{DiagError, Result};
pub use log::init_logger;
pub use output::{Console, Output, Style, Transcript};
