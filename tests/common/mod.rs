//! Shared helpers for integration tests: a runtime-generated certificate
//! and an in-process TLS server that can speak the STARTTLS preamble.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, MsbOption};
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::ssl::{SslAcceptor, SslMethod};
use openssl::x509::extension::SubjectAlternativeName;
use openssl::x509::{X509NameBuilder, X509};

/// Self-signed P-256 certificate and its key
pub fn self_signed(common_name: &str, dns_names: &[&str]) -> (X509, PKey<Private>) {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    let key = PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_nid(Nid::COMMONNAME, common_name).unwrap();
    let name = name.build();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    let mut serial = BigNum::new().unwrap();
    serial.rand(64, MsbOption::MAYBE_ZERO, false).unwrap();
    builder.set_serial_number(&serial.to_asn1_integer().unwrap()).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();
    builder.set_not_before(&Asn1Time::days_from_now(0).unwrap()).unwrap();
    builder.set_not_after(&Asn1Time::days_from_now(30).unwrap()).unwrap();

    if !dns_names.is_empty() {
        let mut san = SubjectAlternativeName::new();
        for dns in dns_names {
            san.dns(dns);
        }
        let ext = san.build(&builder.x509v3_context(None, None)).unwrap();
        builder.append_extension(ext).unwrap();
    }

    builder.sign(&key, MessageDigest::sha256()).unwrap();
    (builder.build(), key)
}

/// Behaviour of the test server on each accepted connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerMode {
    /// TLS from the first byte
    ImplicitTls,
    /// SMTP greeting, EHLO and STARTTLS replies, then TLS
    Starttls,
    /// Accept and never send anything
    Silent,
}

/// In-process server on 127.0.0.1 counting accepted connections
pub struct TestServer {
    pub port: u16,
    connections: Arc<AtomicUsize>,
}

impl TestServer {
    /// Serve `max_connections` connections in a background thread
    pub fn start(cert: X509, key: PKey<Private>, mode: ServerMode, max_connections: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let connections = Arc::new(AtomicUsize::new(0));

        let mut acceptor = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls()).unwrap();
        acceptor.set_certificate(&cert).unwrap();
        acceptor.set_private_key(&key).unwrap();
        acceptor.check_private_key().unwrap();
        let acceptor = acceptor.build();

        let counter = connections.clone();
        thread::spawn(move || {
            for _ in 0..max_connections {
                let (mut socket, _) = match listener.accept() {
                    Ok(accepted) => accepted,
                    Err(_) => return,
                };
                counter.fetch_add(1, Ordering::SeqCst);
                socket.set_read_timeout(Some(Duration::from_secs(5))).unwrap();

                match mode {
                    ServerMode::Silent => {
                        thread::sleep(Duration::from_secs(3));
                        continue;
                    }
                    ServerMode::Starttls => {
                        if starttls_preamble(&mut socket).is_err() {
                            continue;
                        }
                    }
                    ServerMode::ImplicitTls => {}
                }

                // Clients that reject the certificate abort the handshake
                if let Ok(mut tls) = acceptor.accept(socket) {
                    let mut buf = [0u8; 1024];
                    while let Ok(n) = tls.read(&mut buf) {
                        if n == 0 {
                            break;
                        }
                    }
                }
            }
        });

        Self { port, connections }
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

fn starttls_preamble(socket: &mut TcpStream) -> std::io::Result<()> {
    let mut buf = [0u8; 1024];

    socket.write_all(b"220 test.example.com ESMTP\r\n")?;
    read_line(socket, &mut buf)?;
    socket.write_all(b"250-test.example.com\r\n")?;
    socket.write_all(b"250 STARTTLS\r\n")?;
    read_line(socket, &mut buf)?;
    socket.write_all(b"220 2.0.0 Ready to start TLS\r\n")
}

fn read_line(socket: &mut TcpStream, buf: &mut [u8]) -> std::io::Result<()> {
    let mut received = Vec::new();
    while !received.ends_with(b"\n") {
        let n = socket.read(buf)?;
        if n == 0 {
            return Err(std::io::ErrorKind::UnexpectedEof.into());
        }
        received.extend_from_slice(&buf[..n]);
    }
    Ok(())
}

/// A port nothing listens on
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}
