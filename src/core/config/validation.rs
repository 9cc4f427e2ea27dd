//! Contains validation logic for the final Config struct.

use super::{Config, Result};
use crate::core::error::AppError;

/// Validates the configuration settings after loading and potential overrides.
/// Mutates the config to clamp values where that is harmless.
pub(crate) fn validate_config(config: &mut Config) -> Result<()> {
    if config.options.retry_strategy.max_attempts == 0 {
        return Err(AppError::Config(
            "max_attempts must be at least 1.".to_string(),
        ));
    }
    if !config.options.enable_retries && config.options.retry_strategy.max_attempts > 1 {
        tracing::debug!(
            "Retries disabled; max_attempts ({}) only affects transient-failure classification.",
            config.options.retry_strategy.max_attempts
        );
    }
    for (name, rate) in [
        ("mx_success_rate", config.mx_success_rate),
        ("smtp_success_rate", config.smtp_success_rate),
    ] {
        if !(0.0..=1.0).contains(&rate) {
            return Err(AppError::Config(format!(
                "{} must be within [0.0, 1.0], got {}",
                name, rate
            )));
        }
    }
    if config.batch_size == 0 {
        tracing::warn!("Batch size was set to 0. Setting to 1.");
        config.batch_size = 1;
    }
    if config.max_concurrency == 0 {
        tracing::warn!("Max concurrency was set to 0. Setting to 1.");
        config.max_concurrency = 1;
    }
    if config.max_addresses == 0 {
        return Err(AppError::Config(
            "max_addresses must be at least 1.".to_string(),
        ));
    }
    if config.dns_servers.is_empty() {
        tracing::warn!("DNS servers list is empty. Resolver might use system defaults or fail.");
    }
    if !config.smtp_sender_email.contains('@') || !config.smtp_sender_email.contains('.') {
        return Err(AppError::Config(format!(
            "Invalid SMTP sender email format: {}",
            config.smtp_sender_email
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let mut config = Config::default();
        assert!(validate_config(&mut config).is_ok());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = Config::default();
        config.options.retry_strategy.max_attempts = 0;
        assert!(matches!(
            validate_config(&mut config),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_out_of_range_rate_rejected() {
        let mut config = Config::default();
        config.smtp_success_rate = 1.5;
        assert!(validate_config(&mut config).is_err());
    }

    #[test]
    fn test_zero_sizes_are_clamped() {
        let mut config = Config::default();
        config.batch_size = 0;
        config.max_concurrency = 0;
        validate_config(&mut config).unwrap();
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.max_concurrency, 1);
    }

    #[test]
    fn test_bad_sender_rejected() {
        let mut config = Config::default();
        config.smtp_sender_email = "nobody".to_string();
        assert!(validate_config(&mut config).is_err());
    }
}
