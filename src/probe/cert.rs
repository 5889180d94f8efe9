//! Peer certificate field extraction
//!
//! Two parsers read the same fields from the peer certificate:
//! [`StructuredCertificate`] decodes the DER encoding and yields typed
//! timestamps, [`RawCertificateFields`] keeps the name/value pairs and the
//! textual validity bounds the TLS library reports. Only DNS-type subject
//! alternative names are considered by either.

use std::fmt;

use chrono::{DateTime, Utc};
use log::debug;
use openssl::asn1::{Asn1Time, Asn1TimeRef};
use openssl::nid::Nid;
use openssl::x509::{X509NameEntryRef, X509NameRef, X509Ref, X509};

use crate::config::CertificateParser;
use super::error::ProbeError;

/// One end of the validity period
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidityBound {
    Utc(DateTime<Utc>),
    /// Text as reported by the TLS library
    Text(String),
}

impl fmt::Display for ValidityBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidityBound::Utc(time) => write!(f, "{}", time.format("%Y-%m-%d %H:%M:%S%:z")),
            ValidityBound::Text(text) => write!(f, "{}", text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validity {
    pub not_before: ValidityBound,
    pub not_after: ValidityBound,
}

/// Fields read from a peer certificate
pub trait CertificateFields {
    /// Common name of the subject
    fn common_name(&self) -> Option<&str>;

    /// Common name of the issuer
    fn issuer(&self) -> Option<&str>;

    fn validity(&self) -> Validity;

    /// DNS-type subject alternative names in certificate order
    fn san_list(&self) -> Vec<String>;
}

/// Certificate decoded from its DER form
#[derive(Debug, Clone)]
pub struct StructuredCertificate {
    common_name: Option<String>,
    issuer: Option<String>,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    dns_names: Vec<String>,
}

impl StructuredCertificate {
    pub fn from_der(der: &[u8]) -> Result<Self, ProbeError> {
        let cert = X509::from_der(der)?;

        let dns_names = cert
            .subject_alt_names()
            .map(|names| {
                names
                    .iter()
                    .filter_map(|name| name.dnsname().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            common_name: first_common_name(cert.subject_name()),
            issuer: first_common_name(cert.issuer_name()),
            not_before: asn1_to_utc(cert.not_before())?,
            not_after: asn1_to_utc(cert.not_after())?,
            dns_names,
        })
    }
}

impl CertificateFields for StructuredCertificate {
    fn common_name(&self) -> Option<&str> {
        self.common_name.as_deref()
    }

    fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    fn validity(&self) -> Validity {
        Validity {
            not_before: ValidityBound::Utc(self.not_before),
            not_after: ValidityBound::Utc(self.not_after),
        }
    }

    fn san_list(&self) -> Vec<String> {
        self.dns_names.clone()
    }
}

/// Certificate as name/value pairs
#[derive(Debug, Clone, Default)]
pub struct RawCertificateFields {
    /// Subject attributes keyed by long name, e.g. `commonName`
    pub subject: Vec<(String, String)>,
    pub issuer: Vec<(String, String)>,
    pub not_before: String,
    pub not_after: String,
    /// `(type, value)` pairs such as `("DNS", "mail.example.com")`
    pub subject_alt_name: Vec<(String, String)>,
}

impl RawCertificateFields {
    pub fn from_peer(cert: &X509Ref) -> Result<Self, ProbeError> {
        let subject_alt_name = cert
            .subject_alt_names()
            .map(|names| {
                names
                    .iter()
                    .filter_map(|name| {
                        if let Some(dns) = name.dnsname() {
                            Some(("DNS".to_string(), dns.to_string()))
                        } else if let Some(email) = name.email() {
                            Some(("email".to_string(), email.to_string()))
                        } else if let Some(uri) = name.uri() {
                            Some(("URI".to_string(), uri.to_string()))
                        } else {
                            name.ipaddress()
                                .map(|ip| ("IP Address".to_string(), format_ip(ip)))
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            subject: name_pairs(cert.subject_name()),
            issuer: name_pairs(cert.issuer_name()),
            not_before: cert.not_before().to_string(),
            not_after: cert.not_after().to_string(),
            subject_alt_name,
        })
    }

    fn lookup<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
        pairs
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

impl CertificateFields for RawCertificateFields {
    fn common_name(&self) -> Option<&str> {
        Self::lookup(&self.subject, "commonName")
    }

    fn issuer(&self) -> Option<&str> {
        Self::lookup(&self.issuer, "commonName")
    }

    fn validity(&self) -> Validity {
        Validity {
            not_before: ValidityBound::Text(self.not_before.clone()),
            not_after: ValidityBound::Text(self.not_after.clone()),
        }
    }

    fn san_list(&self) -> Vec<String> {
        self.subject_alt_name
            .iter()
            .filter(|(kind, _)| kind == "DNS")
            .map(|(_, value)| value.clone())
            .collect()
    }
}

/// Parser-independent certificate summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateInfo {
    pub common_name: Option<String>,
    pub issuer: Option<String>,
    pub not_before: ValidityBound,
    pub not_after: ValidityBound,
    pub subject_alt_names: Vec<String>,
}

impl CertificateInfo {
    pub fn from_fields(fields: &dyn CertificateFields) -> Self {
        let validity = fields.validity();
        Self {
            common_name: fields.common_name().map(str::to_string),
            issuer: fields.issuer().map(str::to_string),
            not_before: validity.not_before,
            not_after: validity.not_after,
            subject_alt_names: fields.san_list(),
        }
    }
}

/// Read the peer certificate with the selected parser
pub fn extract(parser: CertificateParser, cert: &X509Ref) -> Result<CertificateInfo, ProbeError> {
    let info = match parser {
        CertificateParser::Structured => {
            let der = cert.to_der()?;
            CertificateInfo::from_fields(&StructuredCertificate::from_der(&der)?)
        }
        CertificateParser::Raw => CertificateInfo::from_fields(&RawCertificateFields::from_peer(cert)?),
    };
    Ok(info)
}

/// Text of a name entry, `None` when it cannot be converted to UTF-8
fn entry_text(entry: &X509NameEntryRef) -> Option<String> {
    match entry.data().as_utf8() {
        Ok(text) => Some(text.to_string()),
        Err(e) => {
            debug!("Skipping undecodable {} name entry: {}", entry.object(), e);
            None
        }
    }
}

fn first_common_name(name: &X509NameRef) -> Option<String> {
    name.entries_by_nid(Nid::COMMONNAME).next().and_then(entry_text)
}

fn name_pairs(name: &X509NameRef) -> Vec<(String, String)> {
    name.entries()
        .filter_map(|entry| {
            let nid = entry.object().nid();
            let key = nid.long_name().map(str::to_string).unwrap_or_else(|_| entry.object().to_string());
            entry_text(entry).map(|value| (key, value))
        })
        .collect()
}

fn asn1_to_utc(time: &Asn1TimeRef) -> Result<DateTime<Utc>, ProbeError> {
    let epoch = Asn1Time::from_unix(0)?;
    let diff = epoch.diff(time)?;
    let seconds = i64::from(diff.days) * 86_400 + i64::from(diff.secs);

    DateTime::from_timestamp(seconds, 0).ok_or_else(|| ProbeError::Other {
        kind: "CertificateError".to_string(),
        message: format!("validity bound out of range: {}", time),
    })
}

fn format_ip(bytes: &[u8]) -> String {
    match bytes.len() {
        4 => {
            let octets: [u8; 4] = [bytes[0], bytes[1], bytes[2], bytes[3]];
            std::net::Ipv4Addr::from(octets).to_string()
        }
        16 => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(bytes);
            std::net::Ipv6Addr::from(octets).to_string()
        }
        _ => bytes.iter().map(|b| format!("{:02X}", b)).collect::<Vec<_>>().join(":"),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use openssl::asn1::Asn1Time;
    use openssl::bn::{BigNum, MsbOption};
    use openssl::ec::{EcGroup, EcKey};
    use openssl::hash::MessageDigest;
    use openssl::pkey::PKey;
    use openssl::x509::extension::SubjectAlternativeName;
    use openssl::asn1::Asn1Type;
    use openssl::x509::{X509Name, X509NameBuilder};
    use crate::probe::Verdict;

    /// Self-signed certificate with the given subject CN and SAN entries
    ///
    /// SAN entries prefixed `email:` or `IP:` are added with that type, the
    /// rest as DNS names.
    pub(crate) fn self_signed(common_name: Option<&str>, sans: &[&str]) -> X509 {
        let mut name = X509NameBuilder::new().unwrap();
        name.append_entry_by_text("O", "smtp-diag tests").unwrap();
        if let Some(cn) = common_name {
            name.append_entry_by_nid(Nid::COMMONNAME, cn).unwrap();
        }
        self_signed_with_name(name.build(), sans)
    }

    fn self_signed_with_name(name: X509Name, sans: &[&str]) -> X509 {
        let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
        let key = PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap();

        let mut builder = X509::builder().unwrap();
        builder.set_version(2).unwrap();
        let mut serial = BigNum::new().unwrap();
        serial.rand(64, MsbOption::MAYBE_ZERO, false).unwrap();
        builder.set_serial_number(&serial.to_asn1_integer().unwrap()).unwrap();
        builder.set_subject_name(&name).unwrap();
        builder.set_issuer_name(&name).unwrap();
        builder.set_pubkey(&key).unwrap();
        builder.set_not_before(&Asn1Time::from_unix(1_700_000_000).unwrap()).unwrap();
        builder.set_not_after(&Asn1Time::from_unix(1_900_000_000).unwrap()).unwrap();

        if !sans.is_empty() {
            let mut san = SubjectAlternativeName::new();
            for entry in sans {
                if let Some(email) = entry.strip_prefix("email:") {
                    san.email(email);
                } else if let Some(ip) = entry.strip_prefix("IP:") {
                    san.ip(ip);
                } else {
                    san.dns(entry);
                }
            }
            let ext = san.build(&builder.x509v3_context(None, None)).unwrap();
            builder.append_extension(ext).unwrap();
        }

        builder.sign(&key, MessageDigest::sha256()).unwrap();
        builder.build()
    }

    #[test]
    fn test_structured_reads_fields() {
        let cert = self_signed(Some("mail.example.com"), &["mail.example.com", "smtp.example.com"]);
        let info = extract(CertificateParser::Structured, &cert).unwrap();

        assert_eq!(info.common_name.as_deref(), Some("mail.example.com"));
        assert_eq!(info.issuer.as_deref(), Some("mail.example.com"));
        assert_eq!(info.subject_alt_names, vec!["mail.example.com", "smtp.example.com"]);
        assert_eq!(
            info.not_before,
            ValidityBound::Utc(DateTime::from_timestamp(1_700_000_000, 0).unwrap())
        );
        assert_eq!(info.not_before.to_string(), "2023-11-14 22:13:20+00:00");
    }

    #[test]
    fn test_raw_reads_fields() {
        let cert = self_signed(Some("mail.example.com"), &["mail.example.com"]);
        let raw = RawCertificateFields::from_peer(&cert).unwrap();

        assert!(raw.subject.contains(&("organizationName".to_string(), "smtp-diag tests".to_string())));
        assert_eq!(raw.common_name(), Some("mail.example.com"));
        assert_eq!(raw.not_before, "Nov 14 22:13:20 2023 GMT");

        let info = extract(CertificateParser::Raw, &cert).unwrap();
        assert_eq!(info.not_before, ValidityBound::Text("Nov 14 22:13:20 2023 GMT".to_string()));
        assert_eq!(info.subject_alt_names, vec!["mail.example.com"]);
    }

    #[test]
    fn test_non_dns_sans_ignored_by_both_parsers() {
        let cert = self_signed(
            Some("mail.example.com"),
            &["email:postmaster@example.com", "IP:192.0.2.7", "mx.example.com"],
        );

        let raw = RawCertificateFields::from_peer(&cert).unwrap();
        assert!(raw.subject_alt_name.contains(&("IP Address".to_string(), "192.0.2.7".to_string())));
        assert!(raw.subject_alt_name.contains(&("email".to_string(), "postmaster@example.com".to_string())));

        for parser in [CertificateParser::Structured, CertificateParser::Raw] {
            let info = extract(parser, &cert).unwrap();
            assert_eq!(info.subject_alt_names, vec!["mx.example.com"], "{}", parser);
        }
    }

    #[test]
    fn test_missing_common_name() {
        let cert = self_signed(None, &[]);
        let info = extract(CertificateParser::Structured, &cert).unwrap();

        assert_eq!(info.common_name, None);
        assert_eq!(info.issuer, None);
        assert!(info.subject_alt_names.is_empty());
    }

    #[test]
    fn test_undecodable_common_name_reads_as_missing() {
        // A BIT STRING value has no text form
        let mut name = X509NameBuilder::new().unwrap();
        name.append_entry_by_text("O", "smtp-diag tests").unwrap();
        name.append_entry_by_nid_with_type(Nid::COMMONNAME, "mx", Asn1Type::BIT_STRING).unwrap();
        let cert = self_signed_with_name(name.build(), &["mx.example.com"]);

        let raw = RawCertificateFields::from_peer(&cert).unwrap();
        assert_eq!(raw.subject, vec![("organizationName".to_string(), "smtp-diag tests".to_string())]);

        for parser in [CertificateParser::Structured, CertificateParser::Raw] {
            let info = extract(parser, &cert).unwrap();
            assert_eq!(info.common_name, None, "{}", parser);
            assert_eq!(info.issuer, None, "{}", parser);
            assert_eq!(info.subject_alt_names, vec!["mx.example.com"], "{}", parser);
            assert!(Verdict::evaluate("mx.example.com", &info).matched, "{}", parser);
        }
    }
}
