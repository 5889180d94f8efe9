//! TCP dialing and TLS client handshake for the certificate probe

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::{debug, info};
use openssl::ssl::{HandshakeError, SslConnector, SslMethod, SslStream, SslVerifyMode};
use openssl::x509::X509VerifyResult;

use super::error::ProbeError;
use super::target::ProbeTarget;

/// Certificate verification applied during the handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// System trust store plus hostname check
    Strict,
    /// No chain or hostname checks; used to read untrusted certificates
    Disabled,
}

/// Opens the transport a probe runs over
pub trait Dialer {
    type Stream: Read + Write;

    /// Connect to `target`; reads and writes on the stream time out after `timeout`
    fn dial(&self, target: &ProbeTarget, timeout: Duration) -> Result<Self::Stream, ProbeError>;
}

/// Plain TCP dialer trying every resolved address in order
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpDialer;

impl Dialer for TcpDialer {
    type Stream = TcpStream;

    fn dial(&self, target: &ProbeTarget, timeout: Duration) -> Result<TcpStream, ProbeError> {
        let addrs = (target.host(), target.port())
            .to_socket_addrs()
            .map_err(|e| ProbeError::Dns(e.to_string()))?;

        let mut last_error: Option<io::Error> = None;

        for addr in addrs {
            debug!("Connecting to {} ({})", target, addr);
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    stream
                        .set_read_timeout(Some(timeout))
                        .and_then(|_| stream.set_write_timeout(Some(timeout)))
                        .map_err(|e| ProbeError::from_io(e, target))?;
                    debug!("Connected to {}", addr);
                    return Ok(stream);
                }
                Err(e) => {
                    debug!("Connection to {} failed: {}", addr, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(ProbeError::from_io(e, target)),
            None => Err(ProbeError::Dns(format!("no addresses found for {}", target.host()))),
        }
    }
}

/// Run the TLS client handshake on an established stream
///
/// `host` is used for SNI and, under [`Verification::Strict`], for the
/// hostname check. Timeouts are reported as [`ProbeError::Timeout`], never as
/// TLS failures, so they do not trigger the unverified retry.
pub fn handshake<S: Read + Write>(
    stream: S,
    target: &ProbeTarget,
    verification: Verification,
) -> Result<SslStream<S>, ProbeError> {
    let mut builder = SslConnector::builder(SslMethod::tls_client())?;
    if verification == Verification::Disabled {
        builder.set_verify(SslVerifyMode::NONE);
    }
    let connector = builder.build();

    let config = connector
        .configure()?
        .verify_hostname(verification == Verification::Strict);

    match config.connect(target.host(), stream) {
        Ok(stream) => {
            info!("TLS handshake with {} completed ({:?})", target, verification);
            Ok(stream)
        }
        Err(HandshakeError::SetupFailure(e)) => Err(e.into()),
        Err(HandshakeError::WouldBlock(_)) => Err(timeout(target)),
        Err(HandshakeError::Failure(mid)) => {
            let verify_result = mid.ssl().verify_result();
            let error = mid.into_error();

            match error.into_io_error() {
                Ok(io_error) if is_timeout(&io_error) => Err(timeout(target)),
                Ok(io_error) => Err(ProbeError::from_io(io_error, target)),
                Err(ssl_error) => {
                    let mut detail = ssl_error.to_string();
                    if verify_result != X509VerifyResult::OK {
                        detail = format!("{} ({})", detail, verify_result.error_string());
                    }
                    debug!("TLS handshake with {} failed: {}", target, detail);
                    Err(ProbeError::TlsHandshake(detail))
                }
            }
        }
    }
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}

fn timeout(target: &ProbeTarget) -> ProbeError {
    ProbeError::Timeout {
        host: target.host().to_string(),
        port: target.port(),
    }
}
