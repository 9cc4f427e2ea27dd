//! # Email Triage Core Library
//!
//! This crate classifies lists of email addresses into three dispositions:
//! safe to contact, retry later and do not contact. Each address runs through a
//! staged pipeline (syntax, domain, reputation, MX lookup, SMTP handshake) with
//! bounded retries, and a batch orchestrator drives the pipeline across the
//! whole list with capped concurrency and incremental progress reporting.
//!
//! It is designed to be used either directly as a library or via the
//! `email-triage` command-line tool (which uses this library).

mod core;
mod utils;
pub mod verification;

pub use crate::core::batch::{validate_batch, ProgressCallback};
pub use crate::core::config::{
    Config, ConfigBuilder, ConfigFile, ProbeMode, RetryStrategy, ValidationOptions,
};
pub use crate::core::error::{AppError, Result};
pub use crate::core::models::{
    Confidence, ProgressSnapshot, StageOutcome, ValidationDetails, ValidationResult,
    ValidationStatus,
};
pub use crate::core::pipeline::Validator;
pub use crate::core::retry::RetryController;
pub use crate::utils::input::{
    check_input_file, parse_addresses, read_addresses_file, MAX_ADDRESSES,
};
pub use crate::utils::reputation::{is_corporate_domain, is_spam_trap};
pub use crate::utils::syntax::{is_valid_email_format, is_valid_fqdn};

use crate::utils::smtp::test_smtp_connectivity;

/// Builds the validator with the probes selected by `config.probe_mode`.
/// In network mode this also constructs the shared DNS resolver.
pub async fn initialize_validator(config: &Config) -> Result<Validator> {
    Validator::from_config(config).await
}

/// Performs an early check for outbound SMTP connectivity (port 25).
pub async fn check_smtp_connectivity(config: &Config) -> Result<()> {
    test_smtp_connectivity(config.smtp_timeout).await
}
