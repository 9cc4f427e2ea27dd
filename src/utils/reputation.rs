//! Static reputation lookups: enterprise domains, trusted TLD suffixes and spam-trap patterns.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Large providers assumed deliverable without live probing.
static ENTERPRISE_DOMAINS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "microsoft.com",
        "apple.com",
        "google.com",
        "amazon.com",
        "ibm.com",
        "oracle.com",
        "salesforce.com",
        "intel.com",
        "cisco.com",
        "adobe.com",
        "meta.com",
        "facebook.com",
        "netflix.com",
        "sap.com",
        "dell.com",
        "hp.com",
        "nvidia.com",
        "accenture.com",
        "deloitte.com",
        "pwc.com",
        "ey.com",
        "kpmg.com",
        "jpmorgan.com",
        "goldmansachs.com",
        "morganstanley.com",
        "siemens.com",
        "samsung.com",
        "sony.com",
    ]
    .into_iter()
    .collect()
});

/// Educational, government and military suffixes, including country-coded variants.
const TRUSTED_TLD_SUFFIXES: &[&str] = &[
    ".edu", ".gov", ".mil", ".ac.uk", ".gov.uk", ".mod.uk", ".nhs.uk", ".edu.au", ".gov.au",
    ".edu.cn", ".gov.cn", ".ac.jp", ".go.jp", ".gc.ca", ".edu.in", ".gov.in", ".ac.in",
    ".edu.sg",
];

// Matched against the local part only; domains never trip these.
static SPAM_TRAP_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // Role accounts nobody reads.
        r"^(?:abuse|postmaster|spam|noreply|no-reply|donotreply|do-not-reply|trap|honeypot)$",
        // Long machine-generated local parts.
        r"^[a-z0-9]{20,}$",
        r"spam",
        r"trap",
        r"honeypot",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("spam-trap pattern is valid"))
    .collect()
});

/// True for known enterprise domains and trusted institutional suffixes. Case-insensitive.
pub fn is_corporate_domain(domain: &str) -> bool {
    let domain = domain.trim().to_ascii_lowercase();
    if ENTERPRISE_DOMAINS.contains(domain.as_str()) {
        return true;
    }
    TRUSTED_TLD_SUFFIXES
        .iter()
        .any(|suffix| domain.ends_with(suffix))
}

/// True if the local part of the address matches any known spam-trap shape.
pub fn is_spam_trap(email: &str) -> bool {
    let email = email.trim().to_ascii_lowercase();
    let local = match email.rsplit_once('@') {
        Some((local, _)) => local,
        None => email.as_str(),
    };
    let matched = SPAM_TRAP_PATTERNS.iter().find(|re| re.is_match(local));
    if let Some(re) = matched {
        tracing::debug!(target: "pipeline", "{} matched spam-trap pattern {}", email, re.as_str());
        return true;
    }
    false
}
