//! Probe target
//!
//! A host and port, plus the handshake mode the port implies.

use std::fmt;

/// Mail submission port; servers there expect a STARTTLS upgrade
pub const SUBMISSION_PORT: u16 = 587;

/// How TLS is reached on the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeMode {
    /// Plaintext SMTP dialogue, then `STARTTLS`
    Starttls,
    /// TLS from the first byte
    Implicit,
}

impl HandshakeMode {
    /// Mode used by convention on the given port
    pub fn for_port(port: u16) -> Self {
        if port == SUBMISSION_PORT {
            HandshakeMode::Starttls
        } else {
            HandshakeMode::Implicit
        }
    }
}

/// Host and port to probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    host: String,
    port: u16,
    mode: HandshakeMode,
}

impl ProbeTarget {
    /// Create a target whose handshake mode follows the port convention
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            mode: HandshakeMode::for_port(port),
        }
    }

    /// Override the handshake mode
    pub fn with_mode(mut self, mode: HandshakeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn mode(&self) -> HandshakeMode {
        self.mode
    }
}

impl fmt::Display for ProbeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
