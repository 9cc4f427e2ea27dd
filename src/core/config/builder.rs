//! Provides the `ConfigBuilder` for fluent configuration construction.

use super::loading::{apply_file_config, load_config_file};
use super::validation::validate_config;
use super::{Config, ConfigFile, ProbeMode, Result};
use crate::AppError;
use std::path::Path;
use std::time::Duration;

/// Builder pattern for creating `Config` instances fluently.
///
/// This is the primary way users should create a `Config` object.
/// It handles loading from files, applying overrides, and validation.
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
    config_file_path: Option<String>,
    overrides: ConfigFile,
}

impl ConfigBuilder {
    /// Creates a new builder with default configuration values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Specify an optional configuration file path to load.
    pub fn config_file(mut self, path: impl Into<String>) -> Self {
        self.config_file_path = Some(path.into());
        self
    }

    pub fn enable_retries(mut self, enable: bool) -> Self {
        self.overrides.retry.enable_retries = Some(enable);
        self
    }
    pub fn max_attempts(mut self, value: u32) -> Self {
        self.overrides.retry.max_attempts = Some(value);
        self
    }
    pub fn backoff_delay(mut self, delay: Duration) -> Self {
        self.overrides.retry.backoff_delay = Some(delay.as_millis() as u64);
        self
    }
    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.overrides.retry.timeout = Some(timeout.as_millis() as u64);
        self
    }
    pub fn validate_smtp(mut self, enable: bool) -> Self {
        self.overrides.validation.validate_smtp = Some(enable);
        self
    }
    pub fn strict_mode(mut self, enable: bool) -> Self {
        self.overrides.validation.strict_mode = Some(enable);
        self
    }
    pub fn batch_size(mut self, value: usize) -> Self {
        self.overrides.batch.batch_size = Some(value);
        self
    }
    pub fn max_addresses(mut self, value: usize) -> Self {
        self.overrides.batch.max_addresses = Some(value);
        self
    }
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.overrides.batch.max_file_size = Some(bytes);
        self
    }
    pub fn max_concurrency(mut self, value: usize) -> Self {
        self.overrides.batch.max_concurrency = Some(value);
        self
    }
    pub fn probe_mode(mut self, mode: ProbeMode) -> Self {
        self.overrides.probes.mode = Some(mode);
        self
    }
    pub fn mx_success_rate(mut self, rate: f64) -> Self {
        self.overrides.probes.mx_success_rate = Some(rate);
        self
    }
    pub fn smtp_success_rate(mut self, rate: f64) -> Self {
        self.overrides.probes.smtp_success_rate = Some(rate);
        self
    }
    pub fn dns_timeout(mut self, duration: Duration) -> Self {
        self.overrides.dns.dns_timeout = Some(duration.as_secs());
        self
    }
    pub fn dns_servers(mut self, servers: Vec<String>) -> Self {
        self.overrides.dns.dns_servers = Some(servers);
        self
    }
    pub fn smtp_timeout(mut self, duration: Duration) -> Self {
        self.overrides.smtp.smtp_timeout = Some(duration.as_secs());
        self
    }
    pub fn smtp_sender_email(mut self, value: impl Into<String>) -> Self {
        self.overrides.smtp.smtp_sender_email = Some(value.into());
        self
    }

    /// Builds the final `Config` object, applying defaults, file settings, overrides, and validation.
    pub fn build(mut self) -> Result<Config> {
        let mut loaded_path: Option<String> = None;

        if let Some(ref path) = self.config_file_path {
            match load_config_file(path) {
                Ok(file_config) => {
                    apply_file_config(&mut self.config, &file_config);
                    loaded_path = Some(path.clone());
                    tracing::info!("Loaded base configuration from specified file: {}", path);
                }
                Err(e) => {
                    tracing::error!("Failed to load specified config file '{}': {}", path, e);
                    return Err(AppError::Config(format!(
                        "Failed to load specified configuration file '{}': {}",
                        path, e
                    )));
                }
            }
        } else {
            tracing::debug!("No config file specified, checking default locations.");
            for path_str in ["./email-triage.toml", "./config.toml"] {
                if Path::new(path_str).exists() {
                    match load_config_file(path_str) {
                        Ok(file_config) => {
                            apply_file_config(&mut self.config, &file_config);
                            loaded_path = Some(path_str.to_string());
                            tracing::info!(
                                "Loaded base configuration from default location: {}",
                                path_str
                            );
                            break;
                        }
                        Err(e) => {
                            tracing::warn!(
                                "Failed to load or parse default config '{}': {}",
                                path_str,
                                e
                            );
                        }
                    }
                }
            }
            if loaded_path.is_none() {
                tracing::debug!("No configuration file found. Using default values and overrides.");
            }
        }

        apply_file_config(&mut self.config, &self.overrides);
        self.config.loaded_config_path = loaded_path;
        validate_config(&mut self.config)?;

        tracing::debug!("Final configuration built successfully.");
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_win_over_defaults() {
        let config = ConfigBuilder::new()
            .max_attempts(5)
            .backoff_delay(Duration::from_millis(10))
            .enable_retries(false)
            .strict_mode(true)
            .batch_size(10)
            .probe_mode(ProbeMode::Network)
            .build()
            .unwrap();

        assert_eq!(config.options.retry_strategy.max_attempts, 5);
        assert_eq!(
            config.options.retry_strategy.backoff_delay,
            Duration::from_millis(10)
        );
        assert!(!config.options.enable_retries);
        assert!(config.options.strict_mode);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.probe_mode, ProbeMode::Network);
    }

    #[test]
    fn test_overrides_are_validated() {
        assert!(ConfigBuilder::new().max_attempts(0).build().is_err());
        assert!(ConfigBuilder::new().mx_success_rate(-0.1).build().is_err());
    }

    #[test]
    fn test_missing_explicit_config_file_fails() {
        let result = ConfigBuilder::new()
            .config_file("/no/such/email-triage.toml")
            .build();
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
