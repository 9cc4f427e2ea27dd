//! Real network probes: DNS MX lookups and SMTP RCPT handshakes.

use super::{MxProbe, SmtpProbe};
use crate::core::error::{AppError, Result};
use crate::utils::dns::resolve_mail_server;
use crate::utils::smtp::{SmtpVerificationResult, SmtpVerifier};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use trust_dns_resolver::TokioAsyncResolver;

pub struct DnsMxProbe {
    resolver: Arc<TokioAsyncResolver>,
    timeout: Duration,
}

impl DnsMxProbe {
    pub fn new(resolver: Arc<TokioAsyncResolver>, timeout: Duration) -> Self {
        Self { resolver, timeout }
    }
}

#[async_trait]
impl MxProbe for DnsMxProbe {
    async fn has_mx_records(&self, domain: &str) -> Result<bool> {
        match resolve_mail_server(&self.resolver, domain, self.timeout).await {
            Ok(_) => Ok(true),
            Err(AppError::NoDnsRecords(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

pub struct SmtpHandshakeProbe {
    resolver: Arc<TokioAsyncResolver>,
    dns_timeout: Duration,
    verifier: SmtpVerifier,
    /// Wall-clock budget of one attempt; the handshake never runs past it.
    attempt_budget: Option<Duration>,
}

impl SmtpHandshakeProbe {
    pub fn new(
        resolver: Arc<TokioAsyncResolver>,
        dns_timeout: Duration,
        sender_email: &str,
        smtp_timeout: Duration,
        attempt_budget: Option<Duration>,
    ) -> Self {
        Self {
            resolver,
            dns_timeout,
            verifier: SmtpVerifier::new(sender_email, smtp_timeout),
            attempt_budget,
        }
    }
}

#[async_trait]
impl SmtpProbe for SmtpHandshakeProbe {
    async fn mailbox_reachable(&self, email: &str, domain: &str) -> Result<bool> {
        let deadline = self.attempt_budget.map(|budget| Instant::now() + budget);

        let server = match resolve_mail_server(&self.resolver, domain, self.dns_timeout).await {
            Ok(server) => server,
            Err(AppError::NoDnsRecords(_)) => return Ok(false),
            Err(e) => return Err(e),
        };

        let result = self
            .verifier
            .verify_email(email, &server.exchange, deadline)
            .await?;
        tracing::debug!(target: "smtp_task", "SMTP probe for <{}> via {}: {:?} (retryable: {}) {}",
            email, server.exchange, result.exists, result.should_retry, result.message);

        handshake_answer(result)
    }
}

/// Maps a handshake result onto the probe contract.
///
/// Inconclusive results become errors: retryable ones as `SmtpInconclusive`,
/// the rest as `SmtpUnavailable` so the retry loop stops early.
fn handshake_answer(result: SmtpVerificationResult) -> Result<bool> {
    match result.exists {
        Some(exists) => Ok(exists),
        None if result.should_retry => Err(AppError::SmtpInconclusive(result.message)),
        None => Err(AppError::SmtpUnavailable(result.message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_answer_mapping() {
        let accepted = SmtpVerificationResult::conclusive(true, "250 OK".into());
        assert!(handshake_answer(accepted).unwrap());

        let rejected = SmtpVerificationResult::conclusive(false, "550 no such user".into());
        assert!(!handshake_answer(rejected).unwrap());

        let greylisted = SmtpVerificationResult::inconclusive_retry("451 greylisted".into());
        let err = handshake_answer(greylisted).unwrap_err();
        assert!(matches!(err, AppError::SmtpInconclusive(_)));
        assert!(err.is_retryable());

        let blocked = SmtpVerificationResult::inconclusive_no_retry("Port 25 Blocked?".into());
        let err = handshake_answer(blocked).unwrap_err();
        assert!(matches!(err, AppError::SmtpUnavailable(_)));
        assert!(!err.is_retryable());
    }
}
