//! Handles loading configuration from files and applying it to the Config struct.

use super::{Config, ConfigFile};
use anyhow::Context;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Loads configuration settings from a TOML file.
/// Returns the parsed `ConfigFile` content.
pub(crate) fn load_config_file(file_path: &str) -> anyhow::Result<ConfigFile> {
    let path = Path::new(file_path);
    if !path.exists() || !path.is_file() {
        return Err(anyhow::anyhow!(
            "File not found or is not a file: {}",
            file_path
        ));
    }
    tracing::debug!("Attempting to read config file: {}", file_path);
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", file_path))?;

    let config_file_content: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML configuration from {}", file_path))?;

    tracing::debug!("Successfully parsed configuration file: {}", file_path);
    Ok(config_file_content)
}

/// Applies settings from a parsed `ConfigFile` onto a mutable `Config` instance.
/// Used for both the file layer and the override layer of the builder.
pub(crate) fn apply_file_config(config: &mut Config, file_config: &ConfigFile) {
    // Validation
    if let Some(validate_smtp) = file_config.validation.validate_smtp {
        config.options.validate_smtp = validate_smtp;
    }
    if let Some(strict) = file_config.validation.strict_mode {
        config.options.strict_mode = strict;
    }

    // Retry
    if let Some(enable) = file_config.retry.enable_retries {
        config.options.enable_retries = enable;
    }
    if let Some(attempts) = file_config.retry.max_attempts {
        config.options.retry_strategy.max_attempts = attempts;
    }
    if let Some(backoff) = file_config.retry.backoff_delay {
        config.options.retry_strategy.backoff_delay = Duration::from_millis(backoff);
    }
    if let Some(timeout) = file_config.retry.timeout {
        config.options.retry_strategy.timeout = Duration::from_millis(timeout);
    }

    // Batch
    if let Some(size) = file_config.batch.batch_size {
        config.batch_size = size;
    }
    if let Some(max) = file_config.batch.max_addresses {
        config.max_addresses = max;
    }
    if let Some(max) = file_config.batch.max_file_size {
        config.max_file_size = max;
    }
    if let Some(concurrency) = file_config.batch.max_concurrency {
        config.max_concurrency = concurrency;
    }

    // Probes
    if let Some(mode) = file_config.probes.mode {
        config.probe_mode = mode;
    }
    if let Some(rate) = file_config.probes.mx_success_rate {
        config.mx_success_rate = rate;
    }
    if let Some(rate) = file_config.probes.smtp_success_rate {
        config.smtp_success_rate = rate;
    }

    // DNS
    if let Some(timeout) = file_config.dns.dns_timeout {
        config.dns_timeout = Duration::from_secs(timeout);
    }
    if let Some(ref servers) = file_config.dns.dns_servers {
        if !servers.is_empty() {
            config.dns_servers = servers.clone();
        }
    }

    // SMTP
    if let Some(timeout) = file_config.smtp.smtp_timeout {
        config.smtp_timeout = Duration::from_secs(timeout);
    }
    if let Some(ref sender) = file_config.smtp.smtp_sender_email {
        config.smtp_sender_email = sender.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_and_apply_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[validation]
strict_mode = true

[retry]
max_attempts = 5
backoff_delay = 250

[batch]
batch_size = 100

[probes]
mode = "network"
"#
        )
        .unwrap();

        let parsed = load_config_file(file.path().to_str().unwrap()).unwrap();
        let mut config = Config::default();
        apply_file_config(&mut config, &parsed);

        assert!(config.options.strict_mode);
        assert_eq!(config.options.retry_strategy.max_attempts, 5);
        assert_eq!(
            config.options.retry_strategy.backoff_delay,
            Duration::from_millis(250)
        );
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.probe_mode, super::super::ProbeMode::Network);
        // Untouched keys keep their defaults.
        assert!(config.options.validate_smtp);
        assert_eq!(config.max_addresses, 40_000);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[retry]\nmax_tries = 2").unwrap();
        assert!(load_config_file(file.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(load_config_file("/definitely/not/here.toml").is_err());
    }
}
