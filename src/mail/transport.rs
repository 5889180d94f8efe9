//! Delivery backends

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use log::{debug, info};

use crate::config::{MailBackend, MailConfig};
use super::error::MailError;

/// Something that delivers a composed message
#[cfg_attr(test, mockall::automock)]
pub trait MailTransport: Send + Sync {
    fn send(&self, message: &Message) -> Result<(), MailError>;
}

/// Shared transport handle
pub type SharedTransport = Arc<dyn MailTransport>;

/// Delivery through an SMTP relay
pub struct SmtpMailer {
    transport: SmtpTransport,
    relay: String,
}

impl SmtpMailer {
    /// Build the relay connection settings
    ///
    /// `use_ssl` selects implicit TLS, `use_tls` selects STARTTLS, and
    /// neither selects a plaintext session. Credentials are only sent when
    /// both user and password are set.
    pub fn from_config(config: &MailConfig) -> Result<Self, MailError> {
        let host = config.host();

        let builder = if config.use_ssl() {
            SmtpTransport::relay(host)?
        } else if config.use_tls() {
            SmtpTransport::starttls_relay(host)?
        } else {
            SmtpTransport::builder_dangerous(host)
        };

        let mut builder = builder
            .port(config.port())
            .timeout(Some(config.timeout()));

        if config.has_credentials() {
            builder = builder.credentials(Credentials::new(
                config.host_user().to_string(),
                config.host_password().to_string(),
            ));
        }

        debug!(
            "SMTP relay {}:{} (STARTTLS: {}, implicit TLS: {}, authenticated: {})",
            host,
            config.port(),
            config.use_tls(),
            config.use_ssl(),
            config.has_credentials()
        );

        Ok(Self {
            transport: builder.build(),
            relay: format!("{}:{}", host, config.port()),
        })
    }
}

impl MailTransport for SmtpMailer {
    fn send(&self, message: &Message) -> Result<(), MailError> {
        let response = self.transport.send(message)?;
        info!("Relay {} accepted message: {}", self.relay, response.code());
        Ok(())
    }
}

/// Writes messages to a stream instead of delivering them
pub struct ConsoleMailer<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> ConsoleMailer<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl ConsoleMailer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> MailTransport for ConsoleMailer<W> {
    fn send(&self, message: &Message) -> Result<(), MailError> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| MailError::Transport("console output is unavailable".to_string()))?;

        let rule = "-".repeat(79);
        let write = |out: &mut W| -> io::Result<()> {
            writeln!(out, "{}", rule)?;
            out.write_all(&message.formatted())?;
            writeln!(out)?;
            writeln!(out, "{}", rule)?;
            out.flush()
        };

        write(&mut *out).map_err(|e| MailError::Transport(e.to_string()))
    }
}

/// Transport for the configured backend
pub fn transport_from_config(config: &MailConfig) -> Result<SharedTransport, MailError> {
    let transport: SharedTransport = match config.backend() {
        MailBackend::Smtp => Arc::new(SmtpMailer::from_config(config)?),
        MailBackend::Console => Arc::new(ConsoleMailer::stdout()),
    };
    Ok(transport)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::message::compose_plain;

    #[test]
    fn test_console_writes_formatted_message() {
        let mailer = ConsoleMailer::new(Vec::new());
        let message = compose_plain("Test Email", "hello there", "webmaster@localhost", "ops@example.com").unwrap();

        mailer.send(&message).unwrap();

        let written = String::from_utf8(mailer.into_inner()).unwrap();
        assert!(written.starts_with(&"-".repeat(79)));
        assert!(written.contains("Subject: Test Email"));
        assert!(written.contains("hello there"));
        assert!(written.trim_end().ends_with(&"-".repeat(79)));
    }

    #[test]
    fn test_smtp_mailer_for_each_security_mode() {
        for (use_tls, use_ssl) in [(false, false), (true, false), (false, true)] {
            let mut config = MailConfig::default();
            config.values.host = Some("smtp.example.com".to_string());
            config.values.port = Some(2525);
            config.values.use_tls = Some(use_tls);
            config.values.use_ssl = Some(use_ssl);

            let mailer = SmtpMailer::from_config(&config).unwrap();
            assert_eq!(mailer.relay, "smtp.example.com:2525");
        }
    }

    #[test]
    fn test_unreachable_relay_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut config = MailConfig::default();
        config.values.host = Some("127.0.0.1".to_string());
        config.values.port = Some(port);

        let mailer = SmtpMailer::from_config(&config).unwrap();
        let message = compose_plain("Test Email", "hello", "webmaster@localhost", "ops@example.com").unwrap();

        assert!(matches!(mailer.send(&message), Err(MailError::Transport(_))));
    }
}
