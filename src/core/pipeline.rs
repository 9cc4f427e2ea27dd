//! The per-address validation pipeline.
//!
//! Stages run in order (format, domain, reputation, MX, SMTP) and the first
//! terminal verdict short-circuits everything after it.

use crate::core::config::{Config, ValidationOptions};
use crate::core::error::Result;
use crate::core::models::{
    Confidence, StageOutcome, ValidationDetails, ValidationResult, ValidationStatus,
};
use crate::core::retry::RetryController;
use crate::utils::{reputation, syntax};
use crate::verification::{probes_for, MxProbe, SmtpProbe};

use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Accumulates details for one address until a verdict is reached.
struct Trace {
    email: String,
    details: ValidationDetails,
    started: Instant,
}

impl Trace {
    fn new(email: &str) -> Self {
        Self {
            email: email.to_string(),
            details: ValidationDetails::default(),
            started: Instant::now(),
        }
    }

    fn step(&mut self, label: impl Into<String>) {
        self.details.verification_steps.push(label.into());
    }

    fn finish(
        self,
        status: ValidationStatus,
        confidence: Confidence,
        reason: Option<&str>,
        retry_after: Option<Duration>,
    ) -> ValidationResult {
        tracing::debug!(target: "pipeline", "[{}] Verdict: {} ({:?}) {}",
            self.email, status, confidence, reason.unwrap_or(""));
        ValidationResult {
            email: self.email,
            status,
            confidence,
            reason: reason.map(str::to_string),
            retry_after_ms: retry_after.map(|d| d.as_millis() as u64),
            timestamp: Utc::now(),
            processing_time_ms: self.started.elapsed().as_millis() as u64,
            details: self.details,
        }
    }

    fn do_not_contact(self, confidence: Confidence, reason: &str) -> ValidationResult {
        self.finish(ValidationStatus::DoNotContact, confidence, Some(reason), None)
    }

    fn interrupted(mut self, reason: &str) -> ValidationResult {
        self.step(reason);
        self.finish(ValidationStatus::RetryLater, Confidence::Low, Some(reason), None)
    }

    fn cancelled(self) -> ValidationResult {
        self.interrupted("Validation cancelled")
    }
}

/// Classifies single addresses using the injected MX and SMTP probes.
#[derive(Clone)]
pub struct Validator {
    mx_probe: Arc<dyn MxProbe>,
    smtp_probe: Arc<dyn SmtpProbe>,
}

impl Validator {
    pub fn new(mx_probe: Arc<dyn MxProbe>, smtp_probe: Arc<dyn SmtpProbe>) -> Self {
        Self {
            mx_probe,
            smtp_probe,
        }
    }

    /// Creates a validator backed by the probes selected in `config`.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let (mx_probe, smtp_probe) = probes_for(config).await?;
        tracing::info!(target: "pipeline", "Validator initialized with {} probes.", config.probe_mode);
        Ok(Self::new(mx_probe, smtp_probe))
    }

    /// Runs every stage for one address and returns its terminal record.
    ///
    /// Never fails: stage failures become verdicts on the returned result.
    pub async fn validate_address(
        &self,
        options: &ValidationOptions,
        email: &str,
        cancel: &CancellationToken,
    ) -> ValidationResult {
        let mut trace = Trace::new(email);
        if cancel.is_cancelled() {
            return trace.cancelled();
        }

        // Format
        if !syntax::is_valid_email_format(email) {
            trace.step("Email format check failed");
            return trace.do_not_contact(Confidence::Low, "Invalid email format");
        }
        trace.details.format = true;
        trace.step("Email format verified");

        // Domain. The address grammar already enforces these label rules, so this
        // only rejects input that reaches here without passing the format check.
        let domain = syntax::domain_of(email).unwrap_or_default();
        if !syntax::is_valid_fqdn(domain) {
            trace.step("Domain format check failed");
            return trace.do_not_contact(Confidence::Low, "Invalid domain format");
        }
        trace.details.domain = true;
        trace.step("Domain format verified");

        // Reputation
        let is_corporate = reputation::is_corporate_domain(domain);
        trace.details.corporate = is_corporate;
        if is_corporate {
            trace.step("Enterprise domain recognised");
        }
        if reputation::is_spam_trap(email) {
            trace.details.spam_trap = true;
            // Enterprise domains keep their override even in strict mode.
            if options.strict_mode && !is_corporate {
                trace.step("Spam trap pattern detected");
                return trace.do_not_contact(Confidence::High, "Potential spam trap detected");
            }
            trace.step("Spam trap pattern flagged");
        }

        let retry = RetryController::new(options, cancel.clone());

        // MX
        let mx_attempts = if is_corporate {
            trace.details.mx_records = true;
            trace.step("MX records assumed (enterprise domain)");
            0
        } else {
            let mx_probe = self.mx_probe.as_ref();
            let label = format!("[MX {}]", domain);
            let outcome = retry
                .run(&label, move |_| mx_probe.has_mx_records(domain))
                .await;
            trace.details.retry_count = outcome.attempts();
            match outcome {
                StageOutcome::Success { attempts } => {
                    trace.details.mx_records = true;
                    trace.step("MX records found");
                    attempts
                }
                StageOutcome::Failed { .. } if cancel.is_cancelled() => {
                    return trace.cancelled();
                }
                StageOutcome::Failed { .. } => {
                    trace.step("MX lookup failed");
                    return trace.do_not_contact(Confidence::High, "No MX records found");
                }
            }
        };

        // SMTP
        let smtp_attempts = if !options.validate_smtp {
            trace.step("SMTP verification skipped");
            0
        } else if is_corporate {
            trace.details.smtp = true;
            trace.step("SMTP assumed (enterprise domain)");
            0
        } else {
            let smtp_probe = self.smtp_probe.as_ref();
            let label = format!("[SMTP {}]", email);
            let outcome = retry
                .run(&label, move |_| smtp_probe.mailbox_reachable(email, domain))
                .await;
            trace.details.retry_count = trace.details.retry_count.max(outcome.attempts());
            match outcome {
                StageOutcome::Success { attempts } => {
                    trace.details.smtp = true;
                    trace.step("SMTP verification passed");
                    attempts
                }
                StageOutcome::Failed {
                    retries_exhausted: false,
                    ..
                } => {
                    trace.step("SMTP verification deferred");
                    return trace.finish(
                        ValidationStatus::RetryLater,
                        Confidence::Medium,
                        Some("Temporary SMTP failure"),
                        Some(options.retry_strategy.backoff_delay),
                    );
                }
                StageOutcome::Failed {
                    retries_exhausted: true,
                    ..
                } => {
                    trace.step("SMTP verification failed");
                    return trace.do_not_contact(Confidence::High, "SMTP verification failed");
                }
            }
        };

        trace.details.retry_count = mx_attempts.max(smtp_attempts);
        trace.finish(ValidationStatus::Valid, Confidence::High, None, None)
    }
}

/// Result recorded for an address whose pipeline never started.
pub(crate) fn cancelled_result(email: &str) -> ValidationResult {
    Trace::new(email).cancelled()
}

/// Result recorded for an address whose pipeline task died before producing a verdict.
pub(crate) fn aborted_result(email: &str) -> ValidationResult {
    Trace::new(email).interrupted("Validation task aborted")
}
