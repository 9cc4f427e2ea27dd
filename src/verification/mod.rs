//! Probe seams for the MX and SMTP stages.
//!
//! The pipeline only sees the two traits below. `simulated` provides randomised
//! stand-ins; `network` performs real DNS and SMTP traffic.

pub mod network;
pub mod simulated;

use crate::core::config::{Config, ProbeMode};
use crate::core::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Answers whether a domain publishes mail-exchange records.
#[async_trait]
pub trait MxProbe: Send + Sync {
    async fn has_mx_records(&self, domain: &str) -> Result<bool>;
}

/// Answers whether a mailbox accepts mail.
#[async_trait]
pub trait SmtpProbe: Send + Sync {
    async fn mailbox_reachable(&self, email: &str, domain: &str) -> Result<bool>;
}

/// Builds the probe pair selected by `config.probe_mode`.
pub async fn probes_for(config: &Config) -> Result<(Arc<dyn MxProbe>, Arc<dyn SmtpProbe>)> {
    match config.probe_mode {
        ProbeMode::Simulated => Ok((
            Arc::new(simulated::SimulatedMxProbe::new(config.mx_success_rate)),
            Arc::new(simulated::SimulatedSmtpProbe::new(config.smtp_success_rate)),
        )),
        ProbeMode::Network => {
            let resolver = Arc::new(crate::utils::dns::create_resolver(config).await?);
            Ok((
                Arc::new(network::DnsMxProbe::new(resolver.clone(), config.dns_timeout)),
                Arc::new(network::SmtpHandshakeProbe::new(
                    resolver,
                    config.dns_timeout,
                    &config.smtp_sender_email,
                    config.smtp_timeout,
                    Some(config.options.retry_strategy.timeout).filter(|t| !t.is_zero()),
                )),
            ))
        }
    }
}
