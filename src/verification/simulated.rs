//! Randomised stand-ins for the network probes. No traffic leaves the process.

use super::{MxProbe, SmtpProbe};
use crate::core::error::Result;
use async_trait::async_trait;
use rand::Rng;

/// Consumer providers whose MX records are taken as given.
const KNOWN_MX_DOMAINS: [&str; 8] = [
    "gmail.com",
    "yahoo.com",
    "outlook.com",
    "hotmail.com",
    "live.com",
    "icloud.com",
    "aol.com",
    "protonmail.com",
];

#[derive(Debug, Clone)]
pub struct SimulatedMxProbe {
    success_rate: f64,
}

impl SimulatedMxProbe {
    pub fn new(success_rate: f64) -> Self {
        Self {
            success_rate: success_rate.clamp(0.0, 1.0),
        }
    }
}

#[async_trait]
impl MxProbe for SimulatedMxProbe {
    async fn has_mx_records(&self, domain: &str) -> Result<bool> {
        let domain = domain.to_ascii_lowercase();
        if KNOWN_MX_DOMAINS.contains(&domain.as_str()) {
            return Ok(true);
        }
        let pass = rand::thread_rng().gen_bool(self.success_rate);
        tracing::trace!(target: "probe", "Simulated MX lookup for {}: {}", domain, pass);
        Ok(pass)
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedSmtpProbe {
    success_rate: f64,
}

impl SimulatedSmtpProbe {
    pub fn new(success_rate: f64) -> Self {
        Self {
            success_rate: success_rate.clamp(0.0, 1.0),
        }
    }
}

#[async_trait]
impl SmtpProbe for SimulatedSmtpProbe {
    async fn mailbox_reachable(&self, email: &str, _domain: &str) -> Result<bool> {
        let pass = rand::thread_rng().gen_bool(self.success_rate);
        tracing::trace!(target: "probe", "Simulated SMTP handshake for {}: {}", email, pass);
        Ok(pass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_known_domains_always_pass() {
        let probe = SimulatedMxProbe::new(0.0);
        assert!(probe.has_mx_records("gmail.com").await.unwrap());
        assert!(probe.has_mx_records("GMAIL.COM").await.unwrap());
        assert!(!probe.has_mx_records("unknown-domain.io").await.unwrap());
    }

    #[tokio::test]
    async fn test_rates_at_bounds_are_deterministic() {
        let always = SimulatedSmtpProbe::new(1.0);
        let never = SimulatedSmtpProbe::new(0.0);
        for _ in 0..20 {
            assert!(always.mailbox_reachable("a@b.com", "b.com").await.unwrap());
            assert!(!never.mailbox_reachable("a@b.com", "b.com").await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_out_of_range_rate_is_clamped() {
        let probe = SimulatedMxProbe::new(7.0);
        assert!(probe.has_mx_records("example.org").await.unwrap());
    }
}
