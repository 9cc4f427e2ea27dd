//! Defines the structure mirroring the TOML configuration file format.

use super::ProbeMode;
use serde::Deserialize;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub(crate) validation: ValidationSection,
    #[serde(default)]
    pub(crate) retry: RetrySection,
    #[serde(default)]
    pub(crate) batch: BatchSection,
    #[serde(default)]
    pub(crate) probes: ProbeSection,
    #[serde(default)]
    pub(crate) dns: DnsSection,
    #[serde(default)]
    pub(crate) smtp: SmtpSection,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct ValidationSection {
    pub(crate) validate_smtp: Option<bool>,
    pub(crate) strict_mode: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct RetrySection {
    pub(crate) enable_retries: Option<bool>,
    pub(crate) max_attempts: Option<u32>,
    /// Milliseconds.
    pub(crate) backoff_delay: Option<u64>,
    /// Milliseconds.
    pub(crate) timeout: Option<u64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct BatchSection {
    pub(crate) batch_size: Option<usize>,
    pub(crate) max_addresses: Option<usize>,
    pub(crate) max_file_size: Option<u64>,
    pub(crate) max_concurrency: Option<usize>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct ProbeSection {
    pub(crate) mode: Option<ProbeMode>,
    pub(crate) mx_success_rate: Option<f64>,
    pub(crate) smtp_success_rate: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct DnsSection {
    pub(crate) dns_timeout: Option<u64>,
    pub(crate) dns_servers: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct SmtpSection {
    pub(crate) smtp_timeout: Option<u64>,
    pub(crate) smtp_sender_email: Option<String>,
}
