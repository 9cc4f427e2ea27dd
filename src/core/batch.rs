//! The batch orchestrator: drives the per-address pipeline across a whole list.

use crate::core::config::Config;
use crate::core::error::{AppError, Result};
use crate::core::models::ValidationResult;
use crate::core::pipeline::{aborted_result, cancelled_result, Validator};

use futures::stream::{FuturesUnordered, StreamExt};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Invoked with the number of addresses processed so far, once per completed address.
pub type ProgressCallback = Arc<dyn Fn(usize) + Send + Sync>;

/// Results and the processed counter, shared by every in-flight address task.
struct SharedProgress {
    results: Mutex<Vec<ValidationResult>>,
    processed: AtomicUsize,
    callback: Option<ProgressCallback>,
}

impl SharedProgress {
    /// The callback runs while the results lock is held so the counts it sees
    /// strictly increase. It must not call back into the batch.
    fn record(&self, result: ValidationResult) {
        let mut results = self.results.lock();
        results.push(result);
        let done = self.processed.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(callback) = &self.callback {
            callback(done);
        }
    }
}

/// Validates every address and returns the results in completion order.
///
/// The list is dispatched in groups of `config.batch_size`, but all groups feed
/// one pool whose in-flight count never exceeds `config.max_concurrency`.
/// Per-address failures never abort the run; each address yields exactly one result.
///
/// # Errors
/// * `AppError::NoResults` if the result collection is empty afterwards.
pub async fn validate_batch(
    config: Arc<Config>,
    validator: Arc<Validator>,
    addresses: Vec<String>,
    progress: Option<ProgressCallback>,
    cancel: CancellationToken,
) -> Result<Vec<ValidationResult>> {
    let total = addresses.len();
    let batch_size = config.batch_size.max(1);
    let max_concurrency = config.max_concurrency.max(1);
    let options = config.options;

    tracing::info!(target: "batch",
        "Validating {} addresses in {} group(s) of up to {} (max {} in flight).",
        total, total.div_ceil(batch_size), batch_size, max_concurrency
    );

    let shared = Arc::new(SharedProgress {
        results: Mutex::new(Vec::with_capacity(total)),
        processed: AtomicUsize::new(0),
        callback: progress,
    });
    let mut tasks = FuturesUnordered::new();

    for (group_index, group) in addresses.chunks(batch_size).enumerate() {
        tracing::debug!(target: "batch", "Dispatching group {} ({} addresses).", group_index + 1, group.len());

        for email in group {
            while tasks.len() >= max_concurrency {
                if let Some((email, joined)) = tasks.next().await {
                    handle_join(&shared, email, joined);
                } else {
                    tracing::warn!(target: "batch", "Task queue unexpectedly empty while limiting concurrency.");
                    break;
                }
            }

            let email = email.clone();
            let validator = Arc::clone(&validator);
            let shared_clone = Arc::clone(&shared);
            let cancel = cancel.clone();
            let task_email = email.clone();

            let handle = tokio::spawn(async move {
                let result = if cancel.is_cancelled() {
                    cancelled_result(&task_email)
                } else {
                    validator.validate_address(&options, &task_email, &cancel).await
                };
                shared_clone.record(result);
            });
            tasks.push(async move { (email, handle.await) });
        }
    }

    while let Some((email, joined)) = tasks.next().await {
        handle_join(&shared, email, joined);
    }

    let results = match Arc::try_unwrap(shared) {
        Ok(shared) => shared.results.into_inner(),
        Err(shared) => shared.results.lock().clone(),
    };

    if results.is_empty() {
        tracing::error!(target: "batch", "No results collected for {} input addresses.", total);
        return Err(AppError::NoResults(total));
    }

    tracing::info!(target: "batch", "Batch finished: {} results.", results.len());
    Ok(results)
}

fn handle_join(
    shared: &SharedProgress,
    email: String,
    joined: std::result::Result<(), tokio::task::JoinError>,
) {
    if let Err(e) = joined {
        tracing::error!(target: "batch", "Validation task for <{}> failed to join: {}", email, e);
        shared.record(aborted_result(&email));
    }
}
