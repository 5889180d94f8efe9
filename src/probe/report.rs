//! Human-readable probe report

use crate::common::Output;
use super::cert::CertificateInfo;
use super::verdict::Verdict;

const NOT_AVAILABLE: &str = "N/A";

/// Write the certificate details section
pub fn render_certificate(info: &CertificateInfo, out: &mut dyn Output) {
    out.success("Certificate Details:");
    out.plain(&"-".repeat(50));

    out.plain(&format!(
        "Common Name (CN): {}",
        info.common_name.as_deref().unwrap_or(NOT_AVAILABLE)
    ));
    out.plain(&format!("Issuer: {}", info.issuer.as_deref().unwrap_or(NOT_AVAILABLE)));
    out.plain(&format!("Not Before: {}", info.not_before));
    out.plain(&format!("Not After: {}", info.not_after));

    out.plain("\nSubject Alternative Names (SANs):");
    if info.subject_alt_names.is_empty() {
        out.plain("  (none)");
    }
    for name in &info.subject_alt_names {
        out.plain(&format!("  - {}", name));
    }
}

/// Write the recommendation section for `host`
pub fn render_verdict(host: &str, verdict: &Verdict, out: &mut dyn Output) {
    out.plain(&format!("\n{}", "=".repeat(50)));
    out.warning("\nRecommendation:");

    if verdict.matched {
        out.success(&format!("\nThe hostname {} matches the certificate!", host));
        return;
    }

    out.error(&format!(
        "\nThe hostname you are using ({}) does NOT match the certificate!",
        host
    ));
    out.success("\nTry using one of these hostnames instead:");
    for candidate in &verdict.candidates {
        out.plain(&format!("  EMAIL_HOST={}", candidate));
    }
}
