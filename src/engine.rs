//! Core Application Engine
//!
//! Drives the polling loop: fetch every venue, build the fee-adjusted book,
//! reconcile against today's fills, match, persist.
//!
//! `run_cycle` is the pure part of a cycle and never touches the network
//! or the disk. `AppEngine` wraps it with fetching, persistence, metrics
//! and day rollover.

use crate::core::{BookAssembler, FeeAdjuster, FeeSchedule, MatchedTradeLeg, SpreadReport, Venue};
use crate::exchanges::{fetch_all, Normalizer, QuoteSource, RawVenueBook};
use crate::infrastructure::metrics::MetricsCollector;
use crate::ledger::{HistoryReader, LedgerWriter};
use crate::matching::{DedupePolicy, FillReconciler, MatchReport, MatchStrategy, MatchingEngine};
use crate::Result;
use rust_decimal::Decimal;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use time::{Date, OffsetDateTime, PrimitiveDateTime};
use tracing::Instrument;

/// State carried from one cycle to the next
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    /// UTC day the history belongs to
    pub day: Date,
    /// Every leg matched today, loaded from disk plus this process's matches
    pub history: Vec<MatchedTradeLeg>,
    /// Profit accumulated since the process started
    pub total_profit: Decimal,
    /// Cycles that reached `run_cycle`
    pub cycles: u64,
    /// Levels dropped by normalization since start
    pub rejected_quotes: u64,
}

impl SessionState {
    pub fn new(day: Date, history: Vec<MatchedTradeLeg>) -> Self {
        Self {
            day,
            history,
            total_profit: Decimal::ZERO,
            cycles: 0,
            rejected_quotes: 0,
        }
    }

    /// Switch to a new day's history; totals keep accumulating
    pub fn roll_over(&mut self, day: Date, history: Vec<MatchedTradeLeg>) {
        self.day = day;
        self.history = history;
    }
}

/// Per-cycle algorithm selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleOptions {
    pub strategy: MatchStrategy,
    pub dedupe: DedupePolicy,
}

/// What a cycle produced
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Nothing crossed after fees. Carries the best bid/ask comparison when
    /// both sides were present.
    NoOpportunity(Option<SpreadReport>),
    /// The matcher ran; the report may still hold zero legs
    Matched(MatchReport),
}

impl CycleOutcome {
    pub fn legs(&self) -> &[MatchedTradeLeg] {
        match self {
            CycleOutcome::NoOpportunity(_) => &[],
            CycleOutcome::Matched(report) => &report.legs,
        }
    }
}

/// Run one cycle over already-fetched venue payloads.
///
/// On `Matched`, the legs are appended to `session.history` and the profit
/// is added to `session.total_profit`.
pub fn run_cycle(
    raw_books: &[RawVenueBook],
    fees: &FeeSchedule,
    session: &mut SessionState,
    options: CycleOptions,
    now: PrimitiveDateTime,
) -> Result<CycleOutcome> {
    session.cycles += 1;

    let mut per_venue = Vec::with_capacity(raw_books.len());
    for raw in raw_books {
        let normalized = Normalizer::normalize(raw);
        session.rejected_quotes += normalized.rejected.len() as u64;
        per_venue.push(normalized.quotes);
    }

    let merged = BookAssembler::merge(per_venue);
    let book = FeeAdjuster::apply(merged, fees)?;
    let spread = BookAssembler::spread(&book);

    let trimmed = BookAssembler::trim(book);
    if trimmed.is_empty() {
        return Ok(CycleOutcome::NoOpportunity(spread));
    }

    let mut book = FillReconciler::new(options.dedupe).reconcile(trimmed, &session.history);
    let report = MatchingEngine::new(options.strategy).run(&mut book, now);

    session.history.extend(report.legs.iter().cloned());
    session.total_profit += report.profit;

    Ok(CycleOutcome::Matched(report))
}

/// Current UTC time at whole-second precision
pub fn utc_now() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    let time = now.time().replace_nanosecond(0).unwrap_or(now.time());
    PrimitiveDateTime::new(now.date(), time)
}

/// Main engine owning the sources, the session and the ledgers
pub struct AppEngine<S: QuoteSource> {
    sources: Vec<S>,
    fees: FeeSchedule,
    venues: Vec<Venue>,
    options: CycleOptions,
    reader: HistoryReader,
    writer: LedgerWriter,
    session: SessionState,
    metrics: Arc<MetricsCollector>,
    poll_interval: Duration,
    metrics_every: u64,
}

impl<S: QuoteSource> AppEngine<S> {
    /// Create the engine and load today's history.
    ///
    /// # Errors
    /// Fails when the ledger directory cannot be created or today's
    /// matched-orders file has the wrong schema.
    pub fn new(
        sources: Vec<S>,
        fees: FeeSchedule,
        options: CycleOptions,
        ledger_dir: impl Into<std::path::PathBuf>,
        metrics: Arc<MetricsCollector>,
    ) -> Result<Self> {
        let ledger_dir = ledger_dir.into();
        let reader = HistoryReader::new(&ledger_dir);
        let writer = LedgerWriter::new(&ledger_dir)?;

        let today = utc_now().date();
        let history = reader.load(today)?;
        tracing::info!(day = %today, legs = history.len(), "Session started");

        let venues = sources.iter().map(|s| s.venue().clone()).collect();

        Ok(Self {
            sources,
            fees,
            venues,
            options,
            reader,
            writer,
            session: SessionState::new(today, history),
            metrics,
            poll_interval: Duration::from_secs(3),
            metrics_every: 0,
        })
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Log a metrics snapshot every `cycles` cycles (0 disables)
    pub fn with_metrics_every(mut self, cycles: u64) -> Self {
        self.metrics_every = cycles;
        self
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    /// Fetch every venue and process the result once
    pub async fn run_once(&mut self) -> Result<CycleOutcome> {
        self.metrics.record_cycle_started();

        let books = match fetch_all(&self.sources).await {
            Ok(books) => books,
            Err(e) => {
                self.metrics.record_cycle_aborted();
                return Err(e.into());
            }
        };

        self.process(&books, utc_now())
    }

    /// Poll until `shutdown` resolves.
    ///
    /// Fetch and fee failures abort the current cycle only. A ledger schema
    /// error on day rollover stops the loop.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        tracing::info!(
            venues = self.venues.len(),
            interval_ms = self.poll_interval.as_millis() as u64,
            strategy = ?self.options.strategy,
            "Starting polling loop"
        );

        loop {
            let span = tracing::info_span!("cycle", id = %uuid::Uuid::new_v4());
            self.metrics.record_cycle_started();

            let fetched = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    self.metrics.record_cycle_aborted();
                    break;
                }
                result = fetch_all(&self.sources).instrument(span.clone()) => result,
            };

            let result = match fetched {
                Ok(books) => {
                    let _enter = span.enter();
                    self.process(&books, utc_now())
                }
                Err(e) => {
                    self.metrics.record_cycle_aborted();
                    Err(e.into())
                }
            };

            if let Err(e) = result {
                if e.is_cycle_fatal() {
                    let _enter = span.enter();
                    crate::log_cycle!(tracing::Level::WARN, error = %e, "Cycle aborted");
                } else {
                    tracing::error!(error = %e, "Stopping polling loop");
                    self.log_metrics();
                    return Err(e);
                }
            }

            let completed = self.session.cycles;
            if self.metrics_every > 0 && completed > 0 && completed % self.metrics_every == 0 {
                self.log_metrics();
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        tracing::info!(
            cycles = self.session.cycles,
            total_profit = %self.session.total_profit,
            "Polling loop stopped"
        );
        self.log_metrics();
        Ok(())
    }

    /// Everything after the fetch: rollover, matching, persistence, logging
    fn process(&mut self, books: &[RawVenueBook], now: PrimitiveDateTime) -> Result<CycleOutcome> {
        if let Err(e) = self.ensure_day(now.date()) {
            self.metrics.record_cycle_aborted();
            return Err(e);
        }

        let rejected_before = self.session.rejected_quotes;
        let outcome = run_cycle(books, &self.fees, &mut self.session, self.options, now);
        self.metrics
            .record_rejected((self.session.rejected_quotes - rejected_before) as usize);

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                self.metrics.record_cycle_aborted();
                return Err(e);
            }
        };

        match &outcome {
            CycleOutcome::NoOpportunity(spread) => {
                self.metrics.record_cycle_completed(0, false);
                match spread {
                    Some(s) => crate::log_cycle!(
                        tracing::Level::INFO,
                        highest_bid = %s.highest_bid_net_price,
                        lowest_ask = %s.lowest_ask_net_price,
                        difference = %s.difference,
                        spread_percent = %s.spread_percent,
                        "No arbitrage opportunity"
                    ),
                    None => crate::log_cycle!(
                        tracing::Level::INFO,
                        "No arbitrage opportunity (one side of the book is empty)"
                    ),
                }
            }
            CycleOutcome::Matched(report) => {
                self.metrics.record_cycle_completed(report.legs.len(), true);
                self.persist(report, now);
                crate::log_cycle!(
                    tracing::Level::INFO,
                    matches = report.match_count(),
                    profit = %report.profit,
                    total_profit = %self.session.total_profit,
                    "Cycle matched"
                );
            }
        }

        Ok(outcome)
    }

    /// Reload history when the UTC day changed
    fn ensure_day(&mut self, day: Date) -> Result<()> {
        if day == self.session.day {
            return Ok(());
        }

        let history = self.reader.load(day)?;
        tracing::info!(from = %self.session.day, to = %day, legs = history.len(), "Day rollover");
        self.session.roll_over(day, history);
        Ok(())
    }

    /// Write legs and the profit row; failures are logged, never rolled back
    fn persist(&self, report: &MatchReport, now: PrimitiveDateTime) {
        if let Err(e) = self.writer.append_legs(now.date(), &report.legs) {
            self.metrics.record_persist_failure();
            crate::log_ledger!(tracing::Level::ERROR, error = %e, "Failed to append matched legs");
        }

        if let Err(e) =
            self.writer
                .append_profit_row(now, report.profit, &report.inventory, &self.venues)
        {
            self.metrics.record_persist_failure();
            crate::log_ledger!(tracing::Level::ERROR, error = %e, "Failed to append profit row");
        }
    }

    fn log_metrics(&self) {
        let s = self.metrics.snapshot();
        tracing::info!(
            cycles_started = s.cycles_started,
            cycles_completed = s.cycles_completed,
            cycles_aborted = s.cycles_aborted,
            no_opportunity = s.no_opportunity,
            legs_emitted = s.legs_emitted,
            quotes_rejected = s.quotes_rejected,
            persist_failures = s.persist_failures,
            uptime_secs = s.uptime_seconds,
            "Metrics"
        );
    }
}
