//! Structural checks for addresses and their domains. Pure and synchronous.

use once_cell::sync::Lazy;
use regex::Regex;

const MAX_EMAIL_LEN: usize = 254;
const MAX_LOCAL_LEN: usize = 64;
const MAX_DOMAIN_LEN: usize = 253;

// ASCII-only dot-atom local part, dotted domain ending in an alphabetic or punycode TLD.
// Bracketed literals like `user@[10.0.0.1]` cannot match.
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+(?:[A-Za-z]{2,63}|xn--[A-Za-z0-9-]{1,59})$",
    )
    .expect("email regex is valid")
});

static FQDN_LABEL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?$").expect("label regex is valid")
});

static TLD_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[A-Za-z]{2,63}|xn--[A-Za-z0-9-]{1,59})$").expect("tld regex is valid")
});

/// Returns true if the whole address matches the structural grammar.
pub fn is_valid_email_format(email: &str) -> bool {
    if email.len() > MAX_EMAIL_LEN {
        return false;
    }
    match email.rsplit_once('@') {
        Some((local, _)) if local.len() <= MAX_LOCAL_LEN => EMAIL_REGEX.is_match(email),
        _ => false,
    }
}

/// Returns the part after the last `@`, if any.
pub fn domain_of(email: &str) -> Option<&str> {
    email.rsplit_once('@').map(|(_, domain)| domain)
}

/// Validates a fully-qualified domain name.
///
/// Requires at least two labels and an alphabetic (or punycode) TLD.
/// Underscores, empty labels and a trailing dot are rejected.
pub fn is_valid_fqdn(domain: &str) -> bool {
    if domain.is_empty() || domain.len() > MAX_DOMAIN_LEN || domain.ends_with('.') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let (tld, rest) = match labels.split_last() {
        Some(split) => split,
        None => return false,
    };
    TLD_REGEX.is_match(tld) && rest.iter().all(|label| FQDN_LABEL_REGEX.is_match(label))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email_formats() {
        assert!(is_valid_email_format("john.doe@example.com"));
        assert!(is_valid_email_format("a+tag@sub.example.co.uk"));
        assert!(is_valid_email_format("o'malley@starfleet.org"));
        assert!(is_valid_email_format("x@xn--p1ai.xn--p1ai"));
    }

    #[test]
    fn test_invalid_email_formats() {
        assert!(!is_valid_email_format("not-an-email"));
        assert!(!is_valid_email_format("user@localhost"));
        assert!(!is_valid_email_format("user@[192.168.0.1]"));
        assert!(!is_valid_email_format("pelé@example.com"));
        assert!(!is_valid_email_format(".user@example.com"));
        assert!(!is_valid_email_format("user..name@example.com"));
        assert!(!is_valid_email_format("user@example.c"));
        assert!(!is_valid_email_format("@example.com"));
        assert!(!is_valid_email_format("user@"));
        let long_local = format!("{}@example.com", "a".repeat(65));
        assert!(!is_valid_email_format(&long_local));
    }

    #[test]
    fn test_fqdn() {
        assert!(is_valid_fqdn("example.com"));
        assert!(is_valid_fqdn("mail.example.co.uk"));
        assert!(!is_valid_fqdn("example"));
        assert!(!is_valid_fqdn("example.com."));
        assert!(!is_valid_fqdn("ex_ample.com"));
        assert!(!is_valid_fqdn("example..com"));
        assert!(!is_valid_fqdn("-example.com"));
        assert!(!is_valid_fqdn("example.123"));
        assert!(!is_valid_fqdn(""));
    }

    #[test]
    fn test_domain_of() {
        assert_eq!(domain_of("a@b.com"), Some("b.com"));
        assert_eq!(domain_of("nope"), None);
    }
}
