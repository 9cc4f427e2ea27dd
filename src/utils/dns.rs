//! DNS resolver construction and MX lookups.

use crate::core::config::Config;
use crate::core::error::{AppError, Result};
use std::net::IpAddr;
use trust_dns_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use trust_dns_resolver::error::ResolveErrorKind;
use trust_dns_resolver::TokioAsyncResolver;

/// The preferred mail exchanger for a domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailServer {
    pub exchange: String,
    pub preference: u16,
}

/// Builds a resolver against the configured DNS servers, or the system
/// configuration when none of them parse.
pub async fn create_resolver(config: &Config) -> Result<TokioAsyncResolver> {
    let ips: Vec<IpAddr> = config
        .dns_servers
        .iter()
        .filter_map(|s| match s.trim().parse::<IpAddr>() {
            Ok(ip) => Some(ip),
            Err(e) => {
                tracing::warn!(target: "dns_task", "Ignoring invalid DNS server '{}': {}", s, e);
                None
            }
        })
        .collect();

    let mut opts = ResolverOpts::default();
    opts.timeout = config.dns_timeout;
    opts.attempts = 2;

    if ips.is_empty() {
        tracing::info!(target: "dns_task", "No usable DNS servers configured; using system resolver configuration.");
        let resolver = TokioAsyncResolver::tokio_from_system_conf().map_err(|e| {
            AppError::Initialization(format!("Failed to load system DNS configuration: {}", e))
        })?;
        return Ok(resolver);
    }

    tracing::debug!(target: "dns_task", "Creating resolver with {} name servers.", ips.len());
    let group = NameServerConfigGroup::from_ips_clear(&ips, 53, true);
    let resolver_config = ResolverConfig::from_parts(None, vec![], group);
    Ok(TokioAsyncResolver::tokio(resolver_config, opts))
}

/// Looks up MX records and returns the most preferred exchanger.
///
/// Returns `Err(AppError::NoDnsRecords)` for NXDOMAIN, an empty answer or a null MX.
pub async fn resolve_mail_server(
    resolver: &TokioAsyncResolver,
    domain: &str,
    timeout: std::time::Duration,
) -> Result<MailServer> {
    tracing::debug!(target: "dns_task", "Querying MX records for {}", domain);

    let lookup = match tokio::time::timeout(timeout, resolver.mx_lookup(domain)).await {
        Ok(Ok(lookup)) => lookup,
        Ok(Err(e)) => {
            if let ResolveErrorKind::NoRecordsFound { response_code, .. } = e.kind() {
                tracing::debug!(target: "dns_task", "No MX records for {} ({})", domain, response_code);
                return Err(AppError::NoDnsRecords(format!("{} ({})", domain, response_code)));
            }
            return Err(AppError::Dns(e));
        }
        Err(_) => return Err(AppError::DnsTimeout(domain.to_string())),
    };

    let best = lookup
        .iter()
        .map(|mx| MailServer {
            exchange: mx.exchange().to_utf8().trim_end_matches('.').to_string(),
            preference: mx.preference(),
        })
        .filter(|ms| !ms.exchange.is_empty())
        .min_by_key(|ms| ms.preference);

    match best {
        Some(ms) => {
            tracing::debug!(target: "dns_task", "Best MX for {}: {} (pref {})", domain, ms.exchange, ms.preference);
            Ok(ms)
        }
        None => Err(AppError::NoDnsRecords(format!("{} (null MX)", domain))),
    }
}
