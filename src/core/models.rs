//! Data structures shared between the pipeline, the batch orchestrator and callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Final disposition of one address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// Safe to contact.
    Valid,
    /// A transient failure; try again after `retry_after`.
    RetryLater,
    /// Do not contact.
    DoNotContact,
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationStatus::Valid => write!(f, "valid"),
            ValidationStatus::RetryLater => write!(f, "retry_later"),
            ValidationStatus::DoNotContact => write!(f, "do_not_contact"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Tri-state outcome of one probe stage as reported by the retry controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Success {
        attempts: u32,
    },
    Failed {
        attempts: u32,
        /// `true` only when the full `max_attempts` budget was spent.
        retries_exhausted: bool,
    },
}

impl StageOutcome {
    pub fn attempts(&self) -> u32 {
        match *self {
            StageOutcome::Success { attempts } | StageOutcome::Failed { attempts, .. } => attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StageOutcome::Success { .. })
    }
}

/// Per-check breakdown attached to every result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationDetails {
    pub format: bool,
    pub domain: bool,
    pub mx_records: bool,
    pub smtp: bool,
    pub corporate: bool,
    pub spam_trap: bool,
    pub retry_count: u32,
    pub verification_steps: Vec<String>,
}

/// The terminal record for one address. Built once, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub email: String,
    pub status: ValidationStatus,
    pub confidence: Confidence,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reason: Option<String>,
    /// Milliseconds to wait before retrying a `RetryLater` address.
    #[serde(rename = "retryAfter", skip_serializing_if = "Option::is_none", default)]
    pub retry_after_ms: Option<u64>,
    pub timestamp: DateTime<Utc>,
    pub processing_time_ms: u64,
    pub details: ValidationDetails,
}

impl ValidationResult {
    pub fn retry_after(&self) -> Option<Duration> {
        self.retry_after_ms.map(Duration::from_millis)
    }
}

/// Aggregate counters handed to progress observers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub processed: usize,
    pub total: usize,
    pub valid_count: usize,
    pub retry_count: usize,
    pub invalid_count: usize,
    /// Mean per-address processing time in milliseconds.
    pub avg_processing_time: f64,
}

impl ProgressSnapshot {
    /// Derives the snapshot from the results accumulated so far.
    pub fn from_results(results: &[ValidationResult], total: usize) -> Self {
        let mut snapshot = ProgressSnapshot {
            processed: results.len(),
            total,
            valid_count: 0,
            retry_count: 0,
            invalid_count: 0,
            avg_processing_time: 0.0,
        };
        let mut total_ms: u64 = 0;
        for result in results {
            match result.status {
                ValidationStatus::Valid => snapshot.valid_count += 1,
                ValidationStatus::RetryLater => snapshot.retry_count += 1,
                ValidationStatus::DoNotContact => snapshot.invalid_count += 1,
            }
            total_ms += result.processing_time_ms;
        }
        if !results.is_empty() {
            snapshot.avg_processing_time = total_ms as f64 / results.len() as f64;
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(status: ValidationStatus, ms: u64) -> ValidationResult {
        ValidationResult {
            email: "a@example.com".to_string(),
            status,
            confidence: Confidence::High,
            reason: None,
            retry_after_ms: None,
            timestamp: Utc::now(),
            processing_time_ms: ms,
            details: ValidationDetails::default(),
        }
    }

    #[test]
    fn test_snapshot_counts_and_average() {
        let results = vec![
            result(ValidationStatus::Valid, 10),
            result(ValidationStatus::RetryLater, 20),
            result(ValidationStatus::DoNotContact, 30),
            result(ValidationStatus::Valid, 40),
        ];
        let snapshot = ProgressSnapshot::from_results(&results, 10);
        assert_eq!(snapshot.processed, 4);
        assert_eq!(snapshot.total, 10);
        assert_eq!(snapshot.valid_count, 2);
        assert_eq!(snapshot.retry_count, 1);
        assert_eq!(snapshot.invalid_count, 1);
        assert!((snapshot.avg_processing_time - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_snapshot_empty() {
        let snapshot = ProgressSnapshot::from_results(&[], 3);
        assert_eq!(snapshot.processed, 0);
        assert_eq!(snapshot.avg_processing_time, 0.0);
    }

    #[test]
    fn test_result_serializes_with_stable_field_names() {
        let mut r = result(ValidationStatus::RetryLater, 5);
        r.reason = Some("Temporary SMTP failure".to_string());
        r.retry_after_ms = Some(2000);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["status"], "retry_later");
        assert_eq!(json["confidence"], "high");
        assert_eq!(json["retryAfter"], 2000);
        assert_eq!(json["processingTimeMs"], 5);
        assert!(json["details"]["verificationSteps"].is_array());
        assert!(json["details"].get("mxRecords").is_some());
    }

    #[test]
    fn test_stage_outcome_accessors() {
        let ok = StageOutcome::Success { attempts: 2 };
        let failed = StageOutcome::Failed {
            attempts: 3,
            retries_exhausted: true,
        };
        assert!(ok.is_success());
        assert_eq!(ok.attempts(), 2);
        assert!(!failed.is_success());
        assert_eq!(failed.attempts(), 3);
    }
}
