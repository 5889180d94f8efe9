//! Command implementations shared by the binary
//!
//! Each command writes its human-readable report to an [`Output`] sink and
//! returns whether it succeeded.

use crate::common::Output;
use crate::config::MailConfig;
use crate::mail::{self, MailTransport};
use crate::probe::{ProbeOptions, ProbeOutcome, ProbeTarget, Prober};

/// Subject used by `send-test` when none is given
pub const SEND_TEST_SUBJECT: &str = "Test Email from smtp-diag";

/// Body used by `send-test` when none is given
pub const SEND_TEST_MESSAGE: &str = "This is a test email sent by the smtp-diag command-line tool.";

/// Inspect the certificate of `host:port`, falling back to the configured relay
pub fn check_cert(
    config: &MailConfig,
    host: Option<&str>,
    port: Option<u16>,
    out: &mut dyn Output,
) -> Option<ProbeOutcome> {
    let target = ProbeTarget::new(host.unwrap_or(config.host()), port.unwrap_or(config.port()));
    Prober::new(ProbeOptions::from_config(config)).run(&target, out)
}

/// Send one plain-text test message through `transport`
pub fn send_test(
    config: &MailConfig,
    transport: &dyn MailTransport,
    to_email: &str,
    subject: &str,
    message: &str,
    out: &mut dyn Output,
) -> bool {
    out.warning(&format!("Sending test email to: {}", to_email));
    out.plain(&format!("Subject: {}", subject));
    out.plain(&format!("Backend: {}", config.backend()));

    match mail::send_plain_text_mail(transport, subject, message, config.default_from_email(), to_email) {
        Ok(()) => {
            out.success(&format!("Successfully sent test email to {}", to_email));
            true
        }
        Err(e) => {
            log::error!("Test email to {} failed: {}", to_email, e);
            out.error(&format!("Failed to send email: {}", e));
            false
        }
    }
}
