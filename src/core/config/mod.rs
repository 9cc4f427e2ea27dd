//! Defines the core runtime `Config` struct, the per-run `ValidationOptions`,
//! their defaults, and related utilities.
//! Submodules handle loading, building, and validation.

pub(crate) mod builder;
pub(crate) mod file;
pub(crate) mod loading;
pub(crate) mod validation;

pub use builder::ConfigBuilder;
pub use file::ConfigFile;

use crate::core::error::Result;
use serde::Deserialize;
use std::time::Duration;

/// Bounded-retry settings shared by the MX and SMTP probe stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryStrategy {
    /// Total attempts allowed per probe, including the first. Always > 0.
    pub max_attempts: u32,
    /// Fixed delay slept between two consecutive attempts.
    pub backoff_delay: Duration,
    /// Deadline applied to each individual attempt. `Duration::ZERO` disables it.
    pub timeout: Duration,
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_delay: Duration::from_millis(2000),
            timeout: Duration::from_millis(30_000),
        }
    }
}

/// Options supplied once per batch run. Never mutated while the run is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    pub enable_retries: bool,
    pub retry_strategy: RetryStrategy,
    pub validate_smtp: bool,
    /// Treat spam-trap pattern matches as a terminal verdict.
    pub strict_mode: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            enable_retries: true,
            retry_strategy: RetryStrategy::default(),
            validate_smtp: true,
            strict_mode: false,
        }
    }
}

impl ValidationOptions {
    /// Number of attempts the retry controller may actually spend on one probe.
    pub fn attempt_budget(&self) -> u32 {
        if self.enable_retries {
            self.retry_strategy.max_attempts.max(1)
        } else {
            1
        }
    }
}

/// Which probe implementations back the MX and SMTP stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeMode {
    /// Randomised stand-ins, no network traffic.
    Simulated,
    /// Real DNS MX lookups and SMTP RCPT handshakes.
    Network,
}

impl std::fmt::Display for ProbeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeMode::Simulated => write!(f, "simulated"),
            ProbeMode::Network => write!(f, "network"),
        }
    }
}

/// Runtime configuration settings used by the email-triage core logic.
#[derive(Clone)]
pub struct Config {
    pub options: ValidationOptions,

    pub batch_size: usize,
    pub max_addresses: usize,
    pub max_file_size: u64,
    pub max_concurrency: usize,

    pub probe_mode: ProbeMode,
    pub mx_success_rate: f64,
    pub smtp_success_rate: f64,

    pub dns_timeout: Duration,
    pub dns_servers: Vec<String>,

    pub smtp_timeout: Duration,
    pub smtp_sender_email: String,

    pub loaded_config_path: Option<String>,
}

impl Config {
    fn build_default() -> Self {
        let dns_servers = vec![
            "8.8.8.8".to_string(),
            "8.8.4.4".to_string(),
            "1.1.1.1".to_string(),
            "1.0.0.1".to_string(),
        ];

        Config {
            options: ValidationOptions::default(),
            batch_size: 2000,
            max_addresses: crate::utils::input::MAX_ADDRESSES,
            max_file_size: 10 * 1024 * 1024,
            max_concurrency: 256,
            probe_mode: ProbeMode::Simulated,
            mx_success_rate: 0.90,
            smtp_success_rate: 0.95,
            dns_timeout: Duration::from_secs(5),
            dns_servers,
            smtp_timeout: Duration::from_secs(10),
            smtp_sender_email: "verify-probe@example.com".to_string(),
            loaded_config_path: None,
        }
    }

    /// Convenience entry point equivalent to `ConfigBuilder::new().build()`.
    pub fn load_default() -> Result<Self> {
        ConfigBuilder::new().build()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::build_default()
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("options", &self.options)
            .field("batch_size", &self.batch_size)
            .field("max_addresses", &self.max_addresses)
            .field("max_file_size", &self.max_file_size)
            .field("max_concurrency", &self.max_concurrency)
            .field("probe_mode", &self.probe_mode)
            .field("mx_success_rate", &self.mx_success_rate)
            .field("smtp_success_rate", &self.smtp_success_rate)
            .field("dns_timeout", &self.dns_timeout)
            .field("dns_servers_count", &self.dns_servers.len())
            .field("smtp_timeout", &self.smtp_timeout)
            .field("smtp_sender_email", &self.smtp_sender_email)
            .field("loaded_config_path", &self.loaded_config_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_match_documented_defaults() {
        let options = ValidationOptions::default();
        assert!(options.enable_retries);
        assert!(options.validate_smtp);
        assert!(!options.strict_mode);
        assert_eq!(options.retry_strategy.max_attempts, 3);
        assert_eq!(options.retry_strategy.backoff_delay, Duration::from_millis(2000));
        assert_eq!(options.retry_strategy.timeout, Duration::from_millis(30_000));
    }

    #[test]
    fn test_attempt_budget_respects_enable_retries() {
        let mut options = ValidationOptions::default();
        assert_eq!(options.attempt_budget(), 3);
        options.enable_retries = false;
        assert_eq!(options.attempt_budget(), 1);
    }
}
