//! Ledger transaction verifier binary
//!
//! Usage: `ledger-verify <transaction.json>`
//!
//! Prints the verdict as JSON on stdout and exits with status 1 when the
//! transaction is rejected. `LEDGER_CONFIG` points at a TOML config file;
//! otherwise `LEDGER_*` environment variables are applied to the defaults.

use anyhow::Context;
use ledger_core::{Config, LedgerVerifier, Transaction, VerifierMetrics};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let config = match std::env::var("LEDGER_CONFIG") {
        Ok(path) => Config::from_file(&path).with_context(|| format!("loading {}", path))?,
        Err(_) => Config::from_env()?,
    };

    // Initialize tracing; logs go to stderr so stdout stays machine readable
    let filter = EnvFilter::try_new(&config.logging.filter)
        .with_context(|| format!("invalid log filter {:?}", config.logging.filter))?;
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.logging.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let path = std::env::args()
        .nth(1)
        .context("usage: ledger-verify <transaction.json>")?;

    tracing::info!(service = %config.service_name, version = %config.service_version, %path, "verifying transaction");

    let content = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;
    let tx: Transaction =
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path))?;

    let mut verifier = LedgerVerifier::new();
    if config.metrics.enabled {
        verifier = verifier.with_metrics(VerifierMetrics::new()?);
    }

    let verdict = verifier.verify(&tx);
    println!("{}", serde_json::to_string_pretty(&verdict)?);

    if config.metrics.dump_on_exit {
        if let Some(metrics) = verifier.metrics() {
            tracing::info!(metrics = %metrics.render()?, "verifier metrics");
        }
    }

    if !verdict.is_accepted() {
        std::process::exit(1);
    }
    Ok(())
}
