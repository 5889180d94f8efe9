//! Test email sender
//!
//! Composes plain-text and HTML messages and hands them to the configured
//! delivery backend. Failures are reported once, without retries.

pub mod error;
pub mod message;
pub mod transport;

use log::{debug, info};

pub use self::error::MailError;
pub use self::message::{compose_html, compose_plain, parse_mailbox};
pub use self::transport::{
    ConsoleMailer, MailTransport, SharedTransport, SmtpMailer, transport_from_config,
};

#[cfg(test)]
pub use self::transport::MockMailTransport;

/// Send a plain-text message
pub fn send_plain_text_mail(
    transport: &dyn MailTransport,
    subject: &str,
    body: &str,
    from: &str,
    to: &str,
) -> Result<(), MailError> {
    debug!("Composing plain-text message for {}", to);
    let message = compose_plain(subject, body, from, to)?;
    transport.send(&message)?;
    info!("Sent plain-text message '{}' to {}", subject, to);
    Ok(())
}

/// Send an HTML message
pub fn send_html_mail(
    transport: &dyn MailTransport,
    subject: &str,
    html_body: &str,
    from: &str,
    to: &str,
) -> Result<(), MailError> {
    debug!("Composing HTML message for {}", to);
    let message = compose_html(subject, html_body, from, to)?;
    transport.send(&message)?;
    info!("Sent HTML message '{}' to {}", subject, to);
    Ok(())
}
