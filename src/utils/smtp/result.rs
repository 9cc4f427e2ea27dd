//! Defines the result type for SMTP verification operations.

/// Represents the outcome of an SMTP handshake against one mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpVerificationResult {
    /// True = Exists, False = Does Not Exist, None = Inconclusive/Error
    pub exists: Option<bool>,
    /// Detailed message about the outcome.
    pub message: String,
    /// Suggests if retrying might yield a different result (e.g., for temporary errors).
    pub should_retry: bool,
}

impl SmtpVerificationResult {
    /// Creates a conclusive result (mailbox definitely exists or not).
    pub fn conclusive(exists: bool, message: String) -> Self {
        Self {
            exists: Some(exists),
            message,
            should_retry: false,
        }
    }

    /// Creates an inconclusive result where retrying might help.
    pub fn inconclusive_retry(message: String) -> Self {
        Self {
            exists: None,
            message,
            should_retry: true,
        }
    }

    /// Creates an inconclusive result where retrying is unlikely to help.
    pub fn inconclusive_no_retry(message: String) -> Self {
        Self {
            exists: None,
            message,
            should_retry: false,
        }
    }
}
