//! Provides the SmtpVerifier client for checking mailbox reachability via an SMTP handshake.

use super::error::handle_smtp_error;
use super::result::SmtpVerificationResult;
use crate::core::error::{AppError, Result};

use lettre::transport::smtp::client::{SmtpConnection, TlsParameters};
use lettre::transport::smtp::commands::{Ehlo, Mail, Rcpt};
use lettre::transport::smtp::extension::ClientId;
use lettre::transport::smtp::response::{Code, Severity};
use lettre::Address;
use std::net::ToSocketAddrs;
use std::str::FromStr;
use std::time::{Duration, Instant};

const SMTP_PORT: u16 = 25;

/// Runs EHLO / MAIL FROM / RCPT TO against a mail server without sending any message.
#[derive(Debug, Clone)]
pub struct SmtpVerifier {
    sender_email: String,
    timeout: Duration,
}

impl SmtpVerifier {
    pub fn new(sender_email: impl Into<String>, timeout: Duration) -> Self {
        Self {
            sender_email: sender_email.into(),
            timeout,
        }
    }

    /// Performs the RCPT TO check for a single address.
    ///
    /// The lettre connection is blocking, so the handshake runs on the blocking pool.
    /// Every blocking operation is capped by what is left before `deadline`, so the
    /// worker thread is released by then even if the caller stopped waiting.
    /// Falls back to a STARTTLS connection once if the server demands encryption
    /// and time remains.
    pub async fn verify_email(
        &self,
        email: &str,
        mail_server: &str,
        deadline: Option<Instant>,
    ) -> Result<SmtpVerificationResult> {
        let recipient = match Address::from_str(email) {
            Ok(addr) => addr,
            Err(e) => {
                tracing::error!(target: "smtp_task", "Invalid recipient email format '{}': {}", email, e);
                return Ok(SmtpVerificationResult::conclusive(
                    false,
                    format!("Invalid email format: {}", e),
                ));
            }
        };
        let sender = Address::from_str(&self.sender_email)
            .map_err(|e| AppError::Config(format!("Invalid sender email in config: {}", e)))?;

        if bounded_timeout(self.timeout, deadline).is_none() {
            return Ok(deadline_reached(mail_server));
        }

        let first = self
            .spawn_handshake(mail_server, &sender, &recipient, false, deadline)
            .await?;

        let msg = first.message.to_lowercase();
        if first.exists.is_none() && (msg.contains("starttls") || msg.contains("tls encryption")) {
            if bounded_timeout(self.timeout, deadline).is_none() {
                tracing::debug!(target: "smtp_task",
                    "Skipping STARTTLS retry for {}: attempt deadline reached.", mail_server);
                return Ok(first);
            }
            tracing::info!(target: "smtp_task",
                "Server {} appears to require STARTTLS, retrying connection with TLS enabled", mail_server);
            return self
                .spawn_handshake(mail_server, &sender, &recipient, true, deadline)
                .await;
        }
        Ok(first)
    }

    async fn spawn_handshake(
        &self,
        mail_server: &str,
        sender: &Address,
        recipient: &Address,
        use_tls: bool,
        deadline: Option<Instant>,
    ) -> Result<SmtpVerificationResult> {
        let server = mail_server.to_string();
        let sender = sender.clone();
        let recipient = recipient.clone();
        let timeout = self.timeout;
        tokio::task::spawn_blocking(move || {
            run_handshake(&server, &sender, &recipient, timeout, use_tls, deadline)
        })
        .await?
    }
}

fn run_handshake(
    mail_server: &str,
    sender: &Address,
    recipient: &Address,
    timeout: Duration,
    use_tls: bool,
    deadline: Option<Instant>,
) -> Result<SmtpVerificationResult> {
    let socket_addr = match (mail_server, SMTP_PORT).to_socket_addrs()?.next() {
        Some(addr) => addr,
        None => {
            return Ok(SmtpVerificationResult::inconclusive_no_retry(format!(
                "Could not resolve mail server address: {}",
                mail_server
            )));
        }
    };

    let tls_parameters = if use_tls {
        Some(TlsParameters::new(mail_server.to_string()).map_err(|e| {
            AppError::SmtpTls(format!("Failed to create TLS parameters for {}: {}", mail_server, e))
        })?)
    } else {
        None
    };

    let helo_name = ClientId::Domain("localhost".to_string());
    tracing::debug!(target: "smtp_task", "Connecting to {} at {} (TLS: {})", mail_server, socket_addr, use_tls);

    let connect_timeout = match bounded_timeout(timeout, deadline) {
        Some(t) => t,
        None => return Ok(deadline_reached(mail_server)),
    };

    let mut conn = match SmtpConnection::connect(
        socket_addr,
        Some(connect_timeout),
        &helo_name,
        tls_parameters.as_ref(),
        None,
    ) {
        Ok(conn) => conn,
        Err(e) => {
            tracing::warn!(target: "smtp_task", "SMTP connection failed for {} (TLS={}): {}", mail_server, use_tls, e);
            return Ok(handle_smtp_error(&e, mail_server));
        }
    };

    if !cap_next_command(&mut conn, timeout, deadline)? {
        conn.quit().ok();
        return Ok(deadline_reached(mail_server));
    }
    if let Err(e) = conn.command(Ehlo::new(helo_name.clone())) {
        tracing::warn!(target: "smtp_task", "Error sending EHLO command to {}: {}", mail_server, e);
        conn.quit().ok();
        return Ok(handle_smtp_error(&e, mail_server));
    }

    if !cap_next_command(&mut conn, timeout, deadline)? {
        conn.quit().ok();
        return Ok(deadline_reached(mail_server));
    }
    match conn.command(Mail::new(Some(sender.clone()), vec![])) {
        Ok(response) if response.is_positive() => {}
        Ok(response) => {
            let message = response.message().collect::<Vec<&str>>().join(" ");
            tracing::error!(target: "smtp_task", "MAIL FROM rejected by {}: {} {}", mail_server, response.code(), message);
            conn.quit().ok();
            return Ok(SmtpVerificationResult::inconclusive_no_retry(format!(
                "MAIL FROM rejected: {} {}",
                response.code(),
                message
            )));
        }
        Err(e) => {
            tracing::error!(target: "smtp_task", "Error during MAIL FROM on {}: {}", mail_server, e);
            conn.quit().ok();
            return Ok(handle_smtp_error(&e, mail_server));
        }
    }

    if !cap_next_command(&mut conn, timeout, deadline)? {
        conn.quit().ok();
        return Ok(deadline_reached(mail_server));
    }
    let result = match conn.command(Rcpt::new(recipient.clone(), vec![])) {
        Ok(response) => {
            let message = response.message().collect::<Vec<&str>>().join(" ");
            tracing::debug!(target: "smtp_task",
                "RCPT TO:<{}> response from {}: Code={}, Msg='{}'", recipient, mail_server, response.code(), message);
            evaluate_rcpt_response(response.code(), &message)
        }
        Err(e) => handle_smtp_error(&e, mail_server),
    };

    conn.quit().ok();
    Ok(result)
}

/// Per-operation timeout capped by what is left before `deadline`.
/// Returns `None` once the deadline has passed.
fn bounded_timeout(timeout: Duration, deadline: Option<Instant>) -> Option<Duration> {
    match deadline {
        None => Some(timeout),
        Some(deadline) => {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                None
            } else {
                Some(timeout.min(left))
            }
        }
    }
}

/// Re-arms the socket timeout before the next command. `false` if no time is left.
fn cap_next_command(
    conn: &mut SmtpConnection,
    timeout: Duration,
    deadline: Option<Instant>,
) -> Result<bool> {
    match bounded_timeout(timeout, deadline) {
        Some(t) => {
            conn.set_timeout(Some(t))?;
            Ok(true)
        }
        None => Ok(false),
    }
}

fn deadline_reached(mail_server: &str) -> SmtpVerificationResult {
    tracing::debug!(target: "smtp_task", "Attempt deadline reached during handshake with {}", mail_server);
    SmtpVerificationResult::inconclusive_retry(format!(
        "Attempt deadline reached before the handshake with {} completed",
        mail_server
    ))
}

/// Maps the RCPT TO reply onto an existence verdict.
pub(crate) fn evaluate_rcpt_response(code: Code, message: &str) -> SmtpVerificationResult {
    match code.severity {
        Severity::PositiveCompletion => {
            SmtpVerificationResult::conclusive(true, format!("SMTP Verification OK: {} {}", code, message))
        }
        Severity::PositiveIntermediate => SmtpVerificationResult::inconclusive_retry(format!(
            "SMTP Unexpected Intermediate Code: {} {}",
            code, message
        )),
        Severity::TransientNegativeCompletion => SmtpVerificationResult::inconclusive_retry(format!(
            "SMTP Temp Failure/Greylisted? (4xx): {} {}",
            code, message
        )),
        Severity::PermanentNegativeCompletion => SmtpVerificationResult::conclusive(
            false,
            format!("SMTP Rejected: {} {}", code, message),
        ),
    }
}

/// Tests basic outbound SMTP connectivity to a known reliable server.
/// Helps diagnose whether port 25 is blocked before running network probes.
pub async fn test_smtp_connectivity(timeout: Duration) -> Result<()> {
    let test_server = "gmail-smtp-in.l.google.com";
    tracing::info!("Testing outbound SMTP (port 25) connectivity to {}...", test_server);

    let outcome = tokio::time::timeout(
        timeout,
        tokio::task::spawn_blocking(move || -> Result<()> {
            let socket_addr = (test_server, SMTP_PORT)
                .to_socket_addrs()?
                .next()
                .ok_or_else(|| AppError::Config(format!("Could not resolve {}", test_server)))?;
            let helo_name = ClientId::Domain("localhost".to_string());
            let mut conn = SmtpConnection::connect(socket_addr, Some(timeout), &helo_name, None, None)?;
            conn.quit().ok();
            Ok(())
        }),
    )
    .await;

    match outcome {
        Ok(joined) => joined?,
        Err(_) => Err(AppError::SmtpInconclusive(
            "SMTP connection timed out - port 25 is likely blocked.".to_string(),
        )),
    }
}
