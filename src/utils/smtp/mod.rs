//! SMTP handshake probing.

mod client;
mod error;
mod result;

pub use client::{test_smtp_connectivity, SmtpVerifier};
pub(crate) use result::SmtpVerificationResult;
