//! Hostname verdict

use super::cert::CertificateInfo;

/// Whether the probed host name appears in the certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub matched: bool,
    /// Names the certificate is valid for, in certificate order
    pub candidates: Vec<String>,
}

impl Verdict {
    /// Compare `host` against the certificate names
    ///
    /// Candidates are the DNS SANs, or the subject CN when there are none.
    /// Matching is exact string equality: no wildcard expansion, no case
    /// folding.
    pub fn evaluate(host: &str, info: &CertificateInfo) -> Self {
        let candidates = if !info.subject_alt_names.is_empty() {
            info.subject_alt_names.clone()
        } else {
            info.common_name.iter().cloned().collect()
        };

        let matched = candidates.iter().any(|name| name == host);

        Self { matched, candidates }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::cert::ValidityBound;

    fn info(common_name: Option<&str>, sans: &[&str]) -> CertificateInfo {
        CertificateInfo {
            common_name: common_name.map(str::to_string),
            issuer: None,
            not_before: ValidityBound::Text("N/A".to_string()),
            not_after: ValidityBound::Text("N/A".to_string()),
            subject_alt_names: sans.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_sans_take_precedence_over_cn() {
        let verdict = Verdict::evaluate("mail.example.com", &info(Some("mail.example.com"), &["smtp.example.com"]));
        assert!(!verdict.matched);
        assert_eq!(verdict.candidates, vec!["smtp.example.com"]);
    }

    #[test]
    fn test_cn_used_without_sans() {
        let verdict = Verdict::evaluate("mail.example.com", &info(Some("mail.example.com"), &[]));
        assert!(verdict.matched);
        assert_eq!(verdict.candidates, vec!["mail.example.com"]);
    }

    #[test]
    fn test_no_names_never_matches() {
        let verdict = Verdict::evaluate("mail.example.com", &info(None, &[]));
        assert!(!verdict.matched);
        assert!(verdict.candidates.is_empty());
    }

    #[test]
    fn test_exact_match_only() {
        let cert = info(None, &["*.example.com", "Mail.Example.com"]);
        assert!(!Verdict::evaluate("mail.example.com", &cert).matched);
        assert!(Verdict::evaluate("*.example.com", &cert).matched);
    }
}
