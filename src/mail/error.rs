//! Mail delivery errors

use thiserror::Error;

/// Failure while composing or delivering a message
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MailError {
    /// Sender or recipient is not a valid mailbox
    #[error("Invalid email address '{address}': {reason}")]
    Address { address: String, reason: String },

    /// Message could not be assembled
    #[error("Invalid message: {0}")]
    Build(String),

    /// Backend refused or failed to deliver
    #[error("{0}")]
    Transport(String),
}

impl From<lettre::error::Error> for MailError {
    fn from(err: lettre::error::Error) -> Self {
        MailError::Build(err.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for MailError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        MailError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = MailError::Address {
            address: "not-an-address".to_string(),
            reason: "Missing domain or user".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid email address 'not-an-address': Missing domain or user");
        assert_eq!(MailError::Transport("relay refused".to_string()).to_string(), "relay refused");
    }
}
