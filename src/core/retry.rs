//! Bounded retry with fixed backoff, shared by the MX and SMTP stages.

use crate::core::config::{RetryStrategy, ValidationOptions};
use crate::core::error::Result;
use crate::core::models::StageOutcome;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Runs a boolean probe until it succeeds or the attempt budget is spent.
///
/// A returned `false`, a retryable error and an elapsed per-attempt deadline all
/// count as one failed attempt. A non-retryable error ends the loop at once with
/// a failure that is not marked exhausted.
#[derive(Debug, Clone)]
pub struct RetryController {
    strategy: RetryStrategy,
    budget: u32,
    cancel: CancellationToken,
}

impl RetryController {
    pub fn new(options: &ValidationOptions, cancel: CancellationToken) -> Self {
        Self {
            strategy: options.retry_strategy,
            budget: options.attempt_budget(),
            cancel,
        }
    }

    /// Invokes `probe` (given the 1-based attempt number) with backoff between attempts.
    pub async fn run<F, Fut>(&self, label: &str, mut probe: F) -> StageOutcome
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        let mut attempts: u32 = 0;

        loop {
            if self.cancel.is_cancelled() {
                tracing::debug!(target: "retry", "{} Cancelled before attempt {}.", label, attempts + 1);
                return StageOutcome::Failed {
                    attempts,
                    retries_exhausted: false,
                };
            }

            attempts += 1;
            tracing::trace!(target: "retry", "{} Attempt {}/{}", label, attempts, self.budget);

            match self.attempt(probe(attempts)).await {
                Ok(true) => return StageOutcome::Success { attempts },
                Ok(false) => {
                    tracing::debug!(target: "retry", "{} Attempt {} failed.", label, attempts);
                }
                Err(e) if !e.is_retryable() => {
                    tracing::warn!(target: "retry",
                        "{} Attempt {} failed permanently, not retrying: {}", label, attempts, e);
                    return StageOutcome::Failed {
                        attempts,
                        retries_exhausted: false,
                    };
                }
                Err(e) => {
                    tracing::warn!(target: "retry", "{} Attempt {} raised an error: {}", label, attempts, e);
                }
            }

            if attempts >= self.budget {
                let retries_exhausted = attempts >= self.strategy.max_attempts;
                tracing::debug!(target: "retry",
                    "{} Giving up after {} attempt(s) (exhausted: {}).", label, attempts, retries_exhausted);
                return StageOutcome::Failed {
                    attempts,
                    retries_exhausted,
                };
            }

            if !self.backoff().await {
                tracing::debug!(target: "retry", "{} Cancelled during backoff after attempt {}.", label, attempts);
                return StageOutcome::Failed {
                    attempts,
                    retries_exhausted: false,
                };
            }
        }
    }

    async fn attempt<Fut>(&self, fut: Fut) -> Result<bool>
    where
        Fut: Future<Output = Result<bool>>,
    {
        if self.strategy.timeout.is_zero() {
            return fut.await;
        }
        match tokio::time::timeout(self.strategy.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::debug!(target: "retry", "Attempt exceeded deadline of {:?}.", self.strategy.timeout);
                Ok(false)
            }
        }
    }

    /// Sleeps for the backoff delay. Returns `false` if cancelled meanwhile.
    async fn backoff(&self) -> bool {
        let delay: Duration = self.strategy.backoff_delay;
        if delay.is_zero() {
            return !self.cancel.is_cancelled();
        }
        tokio::select! {
            _ = tokio::time::sleep(delay) => true,
            _ = self.cancel.cancelled() => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::AppError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn options(max_attempts: u32, backoff_ms: u64) -> ValidationOptions {
        let mut options = ValidationOptions::default();
        options.retry_strategy.max_attempts = max_attempts;
        options.retry_strategy.backoff_delay = Duration::from_millis(backoff_ms);
        options
    }

    #[tokio::test(start_paused = true)]
    async fn test_fails_k_times_then_succeeds() {
        let controller = RetryController::new(&options(4, 2000), CancellationToken::new());
        let start = tokio::time::Instant::now();

        let outcome = controller
            .run("[test]", |attempt| async move { Ok(attempt == 3) })
            .await;

        assert_eq!(outcome, StageOutcome::Success { attempts: 3 });
        // Two failures, two backoff sleeps.
        assert_eq!(start.elapsed(), Duration::from_millis(4000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_success_never_sleeps() {
        let controller = RetryController::new(&options(3, 2000), CancellationToken::new());
        let start = tokio::time::Instant::now();
        let outcome = controller.run("[test]", |_| async { Ok(true) }).await;
        assert_eq!(outcome, StageOutcome::Success { attempts: 1 });
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_reports_max_attempts() {
        let controller = RetryController::new(&options(3, 100), CancellationToken::new());
        let start = tokio::time::Instant::now();
        let outcome = controller.run("[test]", |_| async { Ok(false) }).await;
        assert_eq!(
            outcome,
            StageOutcome::Failed {
                attempts: 3,
                retries_exhausted: true
            }
        );
        // No sleep after the final attempt.
        assert_eq!(start.elapsed(), Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_count_as_failed_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let controller = RetryController::new(&options(3, 10), CancellationToken::new());
        let counter = calls.clone();
        let outcome = controller
            .run("[test]", move |attempt| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 3 {
                        Err(AppError::Task("probe blew up".to_string()))
                    } else {
                        Ok(true)
                    }
                }
            })
            .await;
        assert_eq!(outcome, StageOutcome::Success { attempts: 3 });
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_stops_without_backoff() {
        let controller = RetryController::new(&options(3, 2000), CancellationToken::new());
        let start = tokio::time::Instant::now();
        let outcome = controller
            .run("[test]", |_| async {
                Err(AppError::SmtpUnavailable("port 25 blocked".to_string()))
            })
            .await;
        assert_eq!(
            outcome,
            StageOutcome::Failed {
                attempts: 1,
                retries_exhausted: false
            }
        );
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_disabled_is_not_exhausted() {
        let mut opts = options(3, 2000);
        opts.enable_retries = false;
        let controller = RetryController::new(&opts, CancellationToken::new());
        let outcome = controller.run("[test]", |_| async { Ok(false) }).await;
        assert_eq!(
            outcome,
            StageOutcome::Failed {
                attempts: 1,
                retries_exhausted: false
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_budget_is_exhausted() {
        let controller = RetryController::new(&options(1, 2000), CancellationToken::new());
        let outcome = controller.run("[test]", |_| async { Ok(false) }).await;
        assert_eq!(
            outcome,
            StageOutcome::Failed {
                attempts: 1,
                retries_exhausted: true
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_deadline_counts_as_failure() {
        let mut opts = options(2, 0);
        opts.retry_strategy.timeout = Duration::from_millis(50);
        let controller = RetryController::new(&opts, CancellationToken::new());
        let outcome = controller
            .run("[test]", |_| async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(true)
            })
            .await;
        assert_eq!(
            outcome,
            StageOutcome::Failed {
                attempts: 2,
                retries_exhausted: true
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff() {
        let cancel = CancellationToken::new();
        let controller = RetryController::new(&options(5, 10_000), cancel.clone());
        let handle = tokio::spawn(async move {
            controller.run("[test]", |_| async { Ok(false) }).await
        });
        tokio::time::sleep(Duration::from_millis(500)).await;
        cancel.cancel();
        let outcome = handle.await.unwrap();
        assert_eq!(
            outcome,
            StageOutcome::Failed {
                attempts: 1,
                retries_exhausted: false
            }
        );
    }
}
