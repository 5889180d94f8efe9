//! Plaintext SMTP dialogue preceding a STARTTLS upgrade
//!
//! Only the three steps needed to reach the TLS handshake are performed:
//! read the greeting, send `EHLO`, send `STARTTLS`. Reply codes are shown to
//! the operator but not validated; a server refusing STARTTLS simply makes
//! the following TLS handshake fail.

use std::io::{self, Read, Write};
use log::debug;

/// `EHLO` command sent before the upgrade
pub const EHLO_COMMAND: &[u8] = b"EHLO localhost\r\n";

/// `STARTTLS` command
pub const STARTTLS_COMMAND: &[u8] = b"STARTTLS\r\n";

const READ_CHUNK: usize = 4096;

/// Server replies collected during the dialogue, for display only
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmtpHandshake {
    pub greeting: String,
    pub ehlo: String,
    pub starttls: String,
}

/// Run the plaintext part of a STARTTLS upgrade on `stream`
///
/// Sends exactly one `EHLO` and one `STARTTLS`. On return the stream is
/// positioned for the TLS client hello.
pub fn negotiate_starttls<S: Read + Write>(stream: &mut S) -> io::Result<SmtpHandshake> {
    let greeting = read_chunk(stream, "greeting")?;
    debug!("SMTP greeting: {}", display(&greeting));

    send(stream, EHLO_COMMAND)?;
    let ehlo = read_ehlo_reply(stream)?;
    debug!("EHLO reply: {}", display(&ehlo));

    send(stream, STARTTLS_COMMAND)?;
    let starttls = read_chunk(stream, "STARTTLS reply")?;
    debug!("STARTTLS reply: {}", display(&starttls));

    Ok(SmtpHandshake {
        greeting: display(&greeting),
        ehlo: display(&ehlo),
        starttls: display(&starttls),
    })
}

/// Whether an accumulated `EHLO` reply is complete
///
/// Multi-line replies prefix every line but the last with `250-`; the last
/// line uses `250 `. The reply is complete once a `250 ` line is present,
/// or once it ends with a newline and its final line is not a `250-`
/// continuation (which also covers error replies such as `502`).
pub fn ehlo_reply_complete(reply: &[u8]) -> bool {
    if reply.split(|&b| b == b'\n').any(|line| line.starts_with(b"250 ")) {
        return true;
    }

    match reply.strip_suffix(b"\n") {
        Some(body) => {
            let last_line = body.rsplit(|&b| b == b'\n').next().unwrap_or(body);
            !last_line.starts_with(b"250-")
        }
        None => false,
    }
}

fn read_ehlo_reply<S: Read>(stream: &mut S) -> io::Result<Vec<u8>> {
    let mut reply = Vec::new();

    loop {
        let chunk = read_chunk(stream, "EHLO reply")?;
        reply.extend_from_slice(&chunk);

        if ehlo_reply_complete(&reply) {
            return Ok(reply);
        }
    }
}

/// Single read of up to 4096 bytes; end of stream is an error
fn read_chunk<S: Read>(stream: &mut S, stage: &str) -> io::Result<Vec<u8>> {
    let mut buf = [0u8; READ_CHUNK];
    let n = stream.read(&mut buf)?;

    if n == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("connection closed while waiting for the {}", stage),
        ));
    }

    Ok(buf[..n].to_vec())
}

fn send<S: Write>(stream: &mut S, command: &[u8]) -> io::Result<()> {
    debug!("Sending {}", display(command));
    stream.write_all(command)?;
    stream.flush()
}

fn display(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}
