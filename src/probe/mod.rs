//! SMTP certificate probe
//!
//! Connects to a mail server, upgrades to TLS (directly, or through
//! `STARTTLS` on the submission port), reads the peer certificate and
//! reports whether the host name used to connect appears in it.
//!
//! A TLS failure under strict verification is retried exactly once on a
//! fresh connection with verification disabled, so the certificate of a
//! misconfigured server can still be inspected.

pub mod cert;
pub mod error;
pub mod report;
pub mod smtp;
pub mod target;
pub mod tls;
pub mod verdict;

use std::time::Duration;

use log::{debug, error, info, warn};
use openssl::ssl::SslStream;

use crate::common::{Output, Transcript};
use crate::config::{CertificateParser, MailConfig};

pub use self::cert::{CertificateFields, CertificateInfo, RawCertificateFields, StructuredCertificate, ValidityBound};
pub use self::error::ProbeError;
pub use self::smtp::SmtpHandshake;
pub use self::target::{HandshakeMode, ProbeTarget, SUBMISSION_PORT};
pub use self::tls::{Dialer, TcpDialer, Verification};
pub use self::verdict::Verdict;

/// Probe settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOptions {
    /// Connect, read and write timeout
    pub timeout: Duration,
    pub parser: CertificateParser,
}

impl ProbeOptions {
    pub fn from_config(config: &MailConfig) -> Self {
        Self {
            timeout: config.timeout(),
            parser: config.cert_parser(),
        }
    }
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            timeout: crate::config::defaults::timeout(),
            parser: CertificateParser::default(),
        }
    }
}

/// Result of a completed probe
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub certificate: CertificateInfo,
    pub verdict: Verdict,
    /// False when the certificate was read after the unverified retry
    pub verified: bool,
    /// Plaintext dialogue of the connection the certificate was read from
    pub handshake: Option<SmtpHandshake>,
}

/// Certificate probe over a pluggable transport
pub struct Prober<D: Dialer = TcpDialer> {
    dialer: D,
    options: ProbeOptions,
}

impl Prober<TcpDialer> {
    pub fn new(options: ProbeOptions) -> Self {
        Self::with_dialer(TcpDialer, options)
    }
}

impl<D: Dialer> Prober<D> {
    pub fn with_dialer(dialer: D, options: ProbeOptions) -> Self {
        Self { dialer, options }
    }

    pub fn options(&self) -> &ProbeOptions {
        &self.options
    }

    /// Probe `target`, writing progress and the report to `out`
    ///
    /// Errors are returned classified; nothing about the failure is written
    /// to `out` except the TLS error that triggers the unverified retry.
    pub fn probe(&self, target: &ProbeTarget, out: &mut dyn Output) -> Result<ProbeOutcome, ProbeError> {
        let (mut stream, handshake, verified) = match self.connect(target, Verification::Strict, out) {
            Ok((stream, handshake)) => (stream, handshake, true),
            Err(err) if err.is_tls_failure() => {
                let detail = match &err {
                    ProbeError::TlsHandshake(detail) => detail.clone(),
                    other => other.to_string(),
                };
                warn!("Strict TLS handshake with {} failed, retrying without verification", target);
                out.error(&format!("\nSSL Error: {}\n", detail));

                // The retry repeats the dialogue silently
                let mut quiet = Transcript::new();
                let (stream, handshake) = self.connect(target, Verification::Disabled, &mut quiet)?;
                out.warning("Certificate retrieved without verification\n");
                (stream, handshake, false)
            }
            Err(err) => return Err(err),
        };

        let result = self.inspect(target, &stream, out);

        if let Err(e) = stream.shutdown() {
            debug!("TLS shutdown with {} failed: {}", target, e);
        }

        let (certificate, verdict) = result?;
        info!(
            "Certificate check for {} finished: {}",
            target,
            if verdict.matched { "hostname matches" } else { "hostname mismatch" }
        );

        Ok(ProbeOutcome {
            certificate,
            verdict,
            verified,
            handshake,
        })
    }

    /// Run a probe as a command: header, report, and any failure on `out`
    pub fn run(&self, target: &ProbeTarget, out: &mut dyn Output) -> Option<ProbeOutcome> {
        out.warning(&format!("\n=== Checking SSL Certificate for {} ===\n", target));

        match self.probe(target, out) {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                error!("Certificate check for {} failed: {}", target, err);
                out.error(&format!("\n{}", err));
                None
            }
        }
    }

    fn connect(
        &self,
        target: &ProbeTarget,
        verification: Verification,
        out: &mut dyn Output,
    ) -> Result<(SslStream<D::Stream>, Option<SmtpHandshake>), ProbeError> {
        let mut stream = self.dialer.dial(target, self.options.timeout)?;

        let handshake = match target.mode() {
            HandshakeMode::Starttls => {
                out.plain(&format!("Port {} detected - attempting STARTTLS...", target.port()));
                let handshake = smtp::negotiate_starttls(&mut stream)
                    .map_err(|e| ProbeError::from_io(e, target))?;
                out.plain(&format!("Server greeting: {}", handshake.greeting));
                out.plain(&format!("EHLO response: {}", handshake.ehlo));
                out.plain(&format!("STARTTLS response: {}\n", handshake.starttls));
                Some(handshake)
            }
            HandshakeMode::Implicit => None,
        };

        let stream = tls::handshake(stream, target, verification)?;
        Ok((stream, handshake))
    }

    fn inspect(
        &self,
        target: &ProbeTarget,
        stream: &SslStream<D::Stream>,
        out: &mut dyn Output,
    ) -> Result<(CertificateInfo, Verdict), ProbeError> {
        let peer = stream.ssl().peer_certificate().ok_or_else(|| ProbeError::Other {
            kind: "MissingCertificate".to_string(),
            message: format!("{} presented no certificate", target),
        })?;

        let certificate = cert::extract(self.options.parser, &peer)?;
        report::render_certificate(&certificate, out);

        let verdict = Verdict::evaluate(target.host(), &certificate);
        report::render_verdict(target.host(), &verdict, out);

        Ok((certificate, verdict))
    }
}
