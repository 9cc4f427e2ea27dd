//! Defines the custom error types for the email-triage application.

use std::io;
use thiserror::Error;

/// The primary error type for the email triage process.
#[derive(Error, Debug)]
pub enum AppError {
    /// Error occurring during configuration loading or validation.
    #[error("Configuration Error: {0}")]
    Config(String),

    /// Error initializing necessary components (e.g., resolvers, probes).
    #[error("Initialization Error: {0}")]
    Initialization(String),

    /// Error related to file input/output operations.
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),

    /// Error during JSON serialization or deserialization.
    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    /// The uploaded file contained no usable addresses after parsing.
    #[error("No email addresses found in input: {0}")]
    EmptyInput(String),

    /// The uploaded file has the wrong type or is too large.
    #[error("Unsupported File: {0}")]
    UnsupportedFile(String),

    /// A batch run finished without producing any results.
    #[error("Validation produced no results for {0} input addresses")]
    NoResults(usize),

    /// Error during DNS resolution.
    #[error("DNS Resolution Error: {0}")]
    Dns(#[from] trust_dns_resolver::error::ResolveError),

    /// Specific DNS error indicating no relevant records were found.
    #[error("No DNS Records Found (MX): {0}")]
    NoDnsRecords(String),

    /// DNS operation timed out.
    #[error("DNS Timeout for domain: {0}")]
    DnsTimeout(String),

    /// Error during SMTP communication setup or command execution.
    #[error("SMTP Error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// Error specifically during the STARTTLS handshake.
    #[error("SMTP STARTTLS Error: {0}")]
    SmtpTls(String),

    /// SMTP verification was inconclusive (e.g., greylisting, timeout, catch-all).
    #[error("SMTP Inconclusive: {0}")]
    SmtpInconclusive(String),

    /// SMTP verification cannot be carried out from here (e.g., outbound port 25 blocked).
    /// Repeating the attempt will not change the outcome.
    #[error("SMTP Unavailable: {0}")]
    SmtpUnavailable(String),

    /// Error related to concurrency or task execution.
    #[error("Task Execution Error: {0}")]
    Task(String),

    /// An underlying error that doesn't fit other categories, using anyhow.
    #[error("Generic Error: {0}")]
    Generic(#[from] anyhow::Error),
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Task(err.to_string())
    }
}

impl AppError {
    /// Whether another attempt of the same probe could produce a different answer.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, AppError::SmtpUnavailable(_) | AppError::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(AppError::SmtpInconclusive("greylisted".into()).is_retryable());
        assert!(AppError::DnsTimeout("example.org".into()).is_retryable());
        assert!(!AppError::SmtpUnavailable("port 25 blocked".into()).is_retryable());
        assert!(!AppError::Config("bad sender".into()).is_retryable());
    }
}
