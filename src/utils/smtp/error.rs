//! Error handling utilities for SMTP verification operations.

use super::result::SmtpVerificationResult;
use lettre::transport::smtp::Error as SmtpError;

const UNKNOWN_USER_PHRASES: [&str; 9] = [
    "does not exist",
    "no such user",
    "user unknown",
    "recipient not found",
    "invalid mailbox",
    "mailbox unavailable",
    "address rejected",
    "invalid recipient",
    "nosuchuser",
];

/// Interprets a lettre SMTP error into a structured `SmtpVerificationResult`.
pub(crate) fn handle_smtp_error(error: &SmtpError, server: &str) -> SmtpVerificationResult {
    classify_error_message(&error.to_string(), server)
}

/// Classifies the text of an SMTP error.
pub(crate) fn classify_error_message(message: &str, server: &str) -> SmtpVerificationResult {
    let err_string = message.to_lowercase();

    if err_string.contains("starttls")
        || (err_string.contains("530")
            && err_string.contains("5.7.0")
            && !err_string.contains("authentication required"))
    {
        tracing::warn!(target: "smtp_task", "SMTP error suggests STARTTLS is required by {}: {}", server, message);
        return SmtpVerificationResult::inconclusive_retry(format!(
            "SMTP requires TLS encryption: {}",
            message
        ));
    }

    if err_string.contains("550") && UNKNOWN_USER_PHRASES.iter().any(|p| err_string.contains(p)) {
        tracing::info!(target: "smtp_task", "SMTP error indicates user likely unknown on {}: {}", server, message);
        return SmtpVerificationResult::conclusive(
            false,
            format!("SMTP Rejected (User Likely Unknown): {}", message),
        );
    }

    if err_string.contains("timed out")
        || err_string.contains("connection refused")
        || err_string.contains("network is unreachable")
    {
        tracing::error!(target: "smtp_task",
            "SMTP connection failed for {}: {}. Port 25 may be blocked.", server, message);
        return SmtpVerificationResult::inconclusive_no_retry(format!(
            "Connection Failed ({}) - Port 25 Blocked?",
            message
        ));
    }

    if err_string.contains('4')
        && (err_string.contains("temporary")
            || err_string.contains("transient")
            || err_string.contains("greylisted"))
    {
        tracing::warn!(target: "smtp_task", "SMTP transient error from {}: {}", server, message);
        return SmtpVerificationResult::inconclusive_retry(format!(
            "SMTP Transient Error (4xx): {}",
            message
        ));
    }

    if err_string.contains("connection reset") || err_string.contains("tls") {
        tracing::warn!(target: "smtp_task", "SMTP connection problem with {}: {}", server, message);
        return SmtpVerificationResult::inconclusive_retry(format!(
            "Connection problem with {} ({})",
            server, message
        ));
    }

    tracing::error!(target: "smtp_task", "Unhandled SMTP Error for {}: {}", server, message);
    SmtpVerificationResult::inconclusive_retry(format!("Unhandled SMTP Error: {}", message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_user_is_conclusive_negative() {
        let result = classify_error_message("permanent error (550): 5.1.1 User unknown", "mx.test");
        assert_eq!(result.exists, Some(false));
        assert!(!result.should_retry);
    }

    #[test]
    fn test_greylisting_is_retryable() {
        let result = classify_error_message(
            "transient error (451): 4.7.1 Greylisted, please try again",
            "mx.test",
        );
        assert_eq!(result.exists, None);
        assert!(result.should_retry);
    }

    #[test]
    fn test_blocked_port_is_not_retryable() {
        let result = classify_error_message("connection error: Connection refused", "mx.test");
        assert_eq!(result.exists, None);
        assert!(!result.should_retry);
    }

    #[test]
    fn test_starttls_requirement_detected() {
        let result = classify_error_message("530 5.7.0 Must issue a STARTTLS command first", "mx.test");
        assert!(result.should_retry);
        assert!(result.message.contains("TLS"));
    }
}
