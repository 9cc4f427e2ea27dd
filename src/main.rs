//! # Email Triage CLI
//!
//! Command-line interface for the Email Triage library (`email_triage_core`).
//! This binary parses arguments, sets up configuration, initializes the validator,
//! runs the batch over an uploaded address list, and writes the results as JSON.

use email_triage_core::{
    check_smtp_connectivity, initialize_validator, read_addresses_file, validate_batch, Config,
    ConfigBuilder, ProbeMode, ProgressCallback, ProgressSnapshot, ValidationResult,
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter, FmtSubscriber};

/// Which probe implementations back the MX and SMTP stages.
#[derive(Copy, Clone, Debug, ValueEnum)]
enum ProbeArg {
    /// Randomised stand-ins; no network traffic
    Simulated,
    /// Real DNS MX lookups and SMTP handshakes on port 25
    Network,
}

impl From<ProbeArg> for ProbeMode {
    fn from(arg: ProbeArg) -> Self {
        match arg {
            ProbeArg::Simulated => ProbeMode::Simulated,
            ProbeArg::Network => ProbeMode::Network,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Triages email lists into valid, retry-later and do-not-contact buckets.",
    long_about = "Email Triage checks each address for syntax, domain shape, reputation, MX records and SMTP reachability, with bounded retries, and reports a disposition per address."
)]
struct AppArgs {
    /// Path to the input file (.csv or .txt) with comma- or newline-separated addresses.
    #[arg(short, long, default_value = "emails.csv", env = "EMAIL_TRIAGE_INPUT")]
    input: String,

    /// Path to the output JSON file where results will be saved.
    #[arg(short, long, default_value = "results.json", env = "EMAIL_TRIAGE_OUTPUT")]
    output: String,

    /// Write results to standard output instead of a file.
    #[arg(long, default_value = "false", env = "EMAIL_TRIAGE_STDOUT")]
    stdout: bool,

    /// Path to a configuration file (TOML format). CLI args override file settings.
    #[arg(long, env = "EMAIL_TRIAGE_CONFIG")]
    config_file: Option<String>,

    /// Maximum number of address pipelines in flight at once.
    #[arg(short, long, env = "EMAIL_TRIAGE_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Number of addresses per dispatch group.
    #[arg(long, env = "EMAIL_TRIAGE_BATCH_SIZE")]
    batch_size: Option<usize>,

    /// Maximum attempts per probe stage.
    #[arg(long, env = "EMAIL_TRIAGE_MAX_ATTEMPTS")]
    max_attempts: Option<u32>,

    /// Delay between attempts in milliseconds.
    #[arg(long, env = "EMAIL_TRIAGE_BACKOFF_MS")]
    backoff_ms: Option<u64>,

    /// Per-attempt deadline in milliseconds (0 disables it).
    #[arg(long, env = "EMAIL_TRIAGE_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Make a single attempt per probe stage.
    #[arg(long, action = clap::ArgAction::SetTrue, env = "EMAIL_TRIAGE_NO_RETRIES")]
    no_retries: Option<bool>,

    /// Skip the SMTP stage entirely.
    #[arg(long, action = clap::ArgAction::SetTrue, env = "EMAIL_TRIAGE_SKIP_SMTP")]
    skip_smtp: Option<bool>,

    /// Treat spam-trap pattern matches as do-not-contact.
    #[arg(long, action = clap::ArgAction::SetTrue, env = "EMAIL_TRIAGE_STRICT")]
    strict: Option<bool>,

    /// Probe implementation to use for the MX and SMTP stages.
    #[arg(long, value_enum, env = "EMAIL_TRIAGE_PROBE")]
    probe: Option<ProbeArg>,

    /// Comma-separated list of DNS servers to use for lookups.
    #[arg(long, value_delimiter = ',', env = "EMAIL_TRIAGE_DNS_SERVERS")]
    dns_servers: Option<Vec<String>>,

    /// DNS resolution timeout in seconds.
    #[arg(long, env = "EMAIL_TRIAGE_DNS_TIMEOUT")]
    dns_timeout: Option<u64>,

    /// Sender email address for SMTP verification checks.
    #[arg(long, env = "EMAIL_TRIAGE_SMTP_SENDER")]
    smtp_sender: Option<String>,

    /// SMTP connection/command timeout in seconds.
    #[arg(long, env = "EMAIL_TRIAGE_SMTP_TIMEOUT")]
    smtp_timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_thread_names(true)
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Setting up tracing subscriber failed")?;

    tracing::info!(
        "Email Triage CLI v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let args = AppArgs::parse();
    tracing::debug!("Parsed CLI arguments: {:?}", args);

    let config = match build_config(&args) {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            return Err(anyhow::anyhow!("Failed to build configuration: {}", e));
        }
    };
    tracing::debug!("Effective configuration loaded: {:?}", *config);

    let validator = match initialize_validator(&config).await {
        Ok(v) => Arc::new(v),
        Err(e) => {
            tracing::error!("Initialization error: {}", e);
            return Err(anyhow::anyhow!("Failed to initialize validator: {}", e));
        }
    };

    if config.probe_mode == ProbeMode::Network && config.options.validate_smtp {
        match check_smtp_connectivity(&config).await {
            Ok(_) => tracing::info!(
                "SMTP connectivity test passed (outbound port 25 likely open)."
            ),
            Err(e) => {
                tracing::error!("SMTP connectivity test failed: {}", e);
                tracing::warn!("SMTP verification (port 25) may fail; affected addresses will come back as retry-later or do-not-contact.");
            }
        }
    }

    let start_time = Instant::now();
    if let Err(e) = process_file(config, validator, &args, start_time).await {
        tracing::error!("Execution failed: {}", e);
        return Err(e);
    }

    tracing::info!(
        "Processing finished successfully. Total duration: {:.2?}",
        start_time.elapsed()
    );
    Ok(())
}

fn build_config(args: &AppArgs) -> email_triage_core::Result<Config> {
    let mut config_builder = ConfigBuilder::new();

    if let Some(ref path) = args.config_file {
        config_builder = config_builder.config_file(path);
    }
    if let Some(c) = args.concurrency {
        config_builder = config_builder.max_concurrency(c);
    }
    if let Some(b) = args.batch_size {
        config_builder = config_builder.batch_size(b);
    }
    if let Some(n) = args.max_attempts {
        config_builder = config_builder.max_attempts(n);
    }
    if let Some(ms) = args.backoff_ms {
        config_builder = config_builder.backoff_delay(Duration::from_millis(ms));
    }
    if let Some(ms) = args.timeout_ms {
        config_builder = config_builder.attempt_timeout(Duration::from_millis(ms));
    }
    if args.no_retries == Some(true) {
        config_builder = config_builder.enable_retries(false);
    }
    if args.skip_smtp == Some(true) {
        config_builder = config_builder.validate_smtp(false);
    }
    if args.strict == Some(true) {
        config_builder = config_builder.strict_mode(true);
    }
    if let Some(probe) = args.probe {
        config_builder = config_builder.probe_mode(probe.into());
    }
    if let Some(ref servers) = args.dns_servers {
        if !servers.is_empty() {
            config_builder = config_builder.dns_servers(servers.clone());
        }
    }
    if let Some(t) = args.dns_timeout {
        config_builder = config_builder.dns_timeout(Duration::from_secs(t));
    }
    if let Some(ref s) = args.smtp_sender {
        config_builder = config_builder.smtp_sender_email(s);
    }
    if let Some(t) = args.smtp_timeout {
        config_builder = config_builder.smtp_timeout(Duration::from_secs(t));
    }

    config_builder.build()
}

async fn process_file(
    config: Arc<Config>,
    validator: Arc<email_triage_core::Validator>,
    args: &AppArgs,
    start_time: Instant,
) -> Result<()> {
    tracing::info!(
        "Input: '{}', Output: '{}' (Probes: {})",
        args.input,
        if args.stdout { "<stdout>" } else { args.output.as_str() },
        config.probe_mode
    );

    let input_path = Path::new(&args.input);
    if !input_path.exists() {
        return Err(anyhow::anyhow!("Input file not found: {}", args.input));
    }
    if !args.stdout {
        prepare_output_path(&args.output)?;
    }

    let addresses = read_addresses_file(input_path, config.max_file_size, config.max_addresses)
        .with_context(|| format!("Failed to load addresses from '{}'", args.input))?;
    let total = addresses.len();
    tracing::info!("Loaded {} addresses from input file.", total);

    tracing::info!(
        "Starting validation of {} addresses (Concurrency: {}, Batch size: {})...",
        total,
        config.max_concurrency,
        config.batch_size
    );
    let pb = ProgressBar::new(total as u64);
    pb.set_style(ProgressStyle::default_bar()
         .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) | ETA: {eta} | {msg}")
         .context("Failed to set progress bar template")?
         .progress_chars("=> "));
    pb.set_message("Validating addresses...");

    let bar = pb.clone();
    let progress: ProgressCallback = Arc::new(move |done| bar.set_position(done as u64));

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; cancelling remaining validations...");
            ctrl_c_token.cancel();
        }
    });

    let results = validate_batch(config.clone(), validator, addresses, Some(progress), cancel)
        .await
        .context("Batch validation failed")?;

    pb.set_position(results.len() as u64);
    pb.finish_with_message(format!("Validated {} addresses", results.len()));

    if args.stdout {
        write_results(&results, std::io::stdout().lock())?;
    } else {
        tracing::info!("Saving results to '{}'...", args.output);
        save_results(&results, &args.output)?;
        tracing::info!("Results saved successfully.");
    }

    log_summary(&results, total, start_time.elapsed());
    Ok(())
}

fn prepare_output_path(output: &str) -> Result<()> {
    let output_path = Path::new(output);
    if let Some(parent_dir) = output_path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            tracing::debug!("Creating output directory: {}", parent_dir.display());
            std::fs::create_dir_all(parent_dir).with_context(|| {
                format!(
                    "Failed to create output directory '{}'",
                    parent_dir.display()
                )
            })?;
        }
    }
    std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(output)
        .with_context(|| format!("Cannot write to output file '{}'. Check permissions.", output))?;
    tracing::debug!("Output path '{}' seems writable.", output);
    Ok(())
}

/// Saves the results to the specified JSON file.
fn save_results(results: &[ValidationResult], file_path: &str) -> Result<()> {
    tracing::debug!("Creating output file: {}", file_path);
    let file = File::create(file_path)
        .with_context(|| format!("Failed to create/truncate output file '{}'", file_path))?;
    write_results(results, BufWriter::new(file))
        .with_context(|| format!("Failed to write results to '{}'", file_path))
}

fn write_results<W: Write>(results: &[ValidationResult], mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, results)
        .context("Failed to serialize results to JSON")?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Logs a summary of the batch to the console using `tracing::info`.
fn log_summary(results: &[ValidationResult], original_total: usize, duration: Duration) {
    let snapshot = ProgressSnapshot::from_results(results, original_total);

    tracing::info!("-------------------- Validation Summary --------------------");
    tracing::info!("Addresses in Input File     : {}", snapshot.total);
    tracing::info!("Addresses Validated         : {}", snapshot.processed);
    tracing::info!("  - Valid                   : {}", snapshot.valid_count);
    tracing::info!("  - Retry Later             : {}", snapshot.retry_count);
    tracing::info!("  - Do Not Contact          : {}", snapshot.invalid_count);
    tracing::info!("Avg Time per Address        : {:.2} ms", snapshot.avg_processing_time);
    tracing::info!("Total Time Taken            : {:.2?}", duration);
    if duration.as_secs_f64() > 0.01 && snapshot.processed > 0 {
        let rate = (snapshot.processed as f64) / duration.as_secs_f64();
        tracing::info!("Processing Rate             : {:.2} addresses/sec", rate);
    }
    tracing::info!("------------------------------------------------------------");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_output_path_keeps_existing_results() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("results.json");
        std::fs::write(&output, "[]\n").unwrap();

        prepare_output_path(output.to_str().unwrap()).unwrap();

        assert_eq!(std::fs::read_to_string(&output).unwrap(), "[]\n");
    }

    #[test]
    fn test_prepare_output_path_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nested").join("results.json");

        prepare_output_path(output.to_str().unwrap()).unwrap();

        assert!(output.exists());
    }
}
