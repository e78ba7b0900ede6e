//! Cross-venue arbitrage matcher
//!
//! # Architecture
//! - **exchanges**: venue fetch adapters and quote normalization
//! - **core**: quotes, fee-adjusted order records, book assembly
//! - **matching**: fill reconciliation and the matching engine
//! - **ledger**: daily CSV history and profit rows
//! - **infrastructure**: config, logging, metrics

use anyhow::{bail, Context};
use cross_venue_arb::core::{FeeSchedule, Venue};
use cross_venue_arb::engine::{AppEngine, CycleOptions};
use cross_venue_arb::exchanges::{http_client, QuoteSource, VenueClient};
use cross_venue_arb::infrastructure::{logging, Config, MetricsCollector};
use std::sync::Arc;

/// Resolve each venue's fee rate: configured value first, then the venue's
/// published rate
async fn resolve_fees(config: &Config, clients: &[VenueClient]) -> anyhow::Result<FeeSchedule> {
    let mut fees = FeeSchedule::new();

    for (venue_config, client) in config.venues.iter().zip(clients) {
        let venue: Venue = client.venue().clone();

        let rate = match venue_config.fee_rate {
            Some(rate) => rate,
            None => match client.fetch_fee_rate().await {
                Some(result) => result
                    .with_context(|| format!("Failed to fetch fee rate for {}", venue))?,
                None => bail!(
                    "No fee_rate configured for {} and the venue does not publish one",
                    venue
                ),
            },
        };

        tracing::info!(venue = %venue, kind = client.kind().name(), fee_rate = %rate, "Fee rate resolved");
        fees.set_rate(venue, rate);
    }

    Ok(fees)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    // Keep guards alive for the lifetime of the process
    let _log_guards = logging::init_logging(&config.logging).context("Failed to initialize logging")?;

    tracing::info!(
        venues = config.venues.len(),
        ledger_dir = %config.arb.ledger_dir.display(),
        "Starting cross-venue arbitrage matcher"
    );

    let http = http_client(config.request_timeout());
    let clients: Vec<VenueClient> = config
        .venues
        .iter()
        .map(|v| VenueClient::from_config(v, http.clone()))
        .collect();

    let fees = resolve_fees(&config, &clients).await?;

    let options = CycleOptions {
        strategy: config.arb.matcher,
        dedupe: config.arb.dedupe,
    };

    let metrics = Arc::new(MetricsCollector::new());
    let mut engine = AppEngine::new(clients, fees, options, &config.arb.ledger_dir, metrics)
        .context("Failed to load today's ledger")?
        .with_poll_interval(config.poll_interval())
        .with_metrics_every(config.arb.metrics_every_cycles);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutdown requested");
    };

    engine.run(shutdown).await.context("Polling loop failed")?;

    Ok(())
}
