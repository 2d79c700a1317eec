//! Radar Runner - Main polling loop
//!
//! One cycle: fetch bars for every symbol (concurrently, each under a
//! timeout) → indicators → score → alert decision + log append (under the
//! state lock) → notifications (after the lock is released).

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::alerts::{Alert, AlertMachine, AlertStore};
use crate::config::RadarConfig;
use crate::error::RadarError;
use crate::indicators::{clean_bars, compute_indicators};
use crate::journal::{RunLog, RunSummary};
use crate::notifier::Notifier;
use crate::report::ReportWriter;
use crate::scoring::Scorer;
use crate::source::BarSource;
use crate::types::{LogEntry, RawBar, ScoreResult};

/// State that outlives a single cycle. Guarded by one lock so an alert
/// decision and its log entry are never observed half-applied.
#[derive(Debug, Default)]
pub struct RadarState {
    pub alerts: AlertStore,
    pub log: RunLog,
    pub scoreboard: Vec<ScoreResult>,
}

/// Outcome of one polling cycle
#[derive(Debug, Default)]
pub struct CycleReport {
    /// Score rows ranked by score, highest first
    pub results: Vec<ScoreResult>,
    pub alerts: Vec<Alert>,
    pub skipped: Vec<(String, RadarError)>,
    pub delivered: usize,
    pub failed_deliveries: usize,
}

/// Main radar runner that manages the polling loop
pub struct RadarRunner {
    config: RadarConfig,
    source: Arc<dyn BarSource>,
    notifier: Arc<dyn Notifier>,
    scorer: Scorer,
    machine: AlertMachine,
    state: Mutex<RadarState>,
    reports: ReportWriter,
}

impl RadarRunner {
    /// Create new radar runner. `config` is expected to be validated.
    pub fn new(
        config: RadarConfig,
        source: Arc<dyn BarSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            scorer: Scorer::new(config.scoring),
            machine: AlertMachine::new(config.alerts),
            reports: ReportWriter::new(&config.report_dir),
            state: Mutex::new(RadarState::default()),
            config,
            source,
            notifier,
        }
    }

    pub fn config(&self) -> &RadarConfig {
        &self.config
    }

    /// Run the polling loop until ctrl-c
    pub async fn run(&self) -> anyhow::Result<()> {
        info!(
            "Radar runner starting: {} symbols via {}, alerts via {}",
            self.config.symbols.len(),
            self.source.name(),
            self.notifier.name()
        );

        if let Err(e) = self.reports.init().await {
            warn!("Report directory unavailable: {}", e);
        }

        let mut poll_interval = interval(Duration::from_secs(self.config.poll_interval_secs));
        poll_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = poll_interval.tick() => {
                    let report = self.run_cycle().await;
                    log_score_table(&report.results);
                    if let Err(e) = self.reports.write_scoreboard(&report.results).await {
                        warn!("Failed to write scoreboard: {}", e);
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        self.shutdown().await;
        Ok(())
    }

    /// Run one polling cycle over the whole symbol list
    pub async fn run_cycle(&self) -> CycleReport {
        let mut report = CycleReport::default();

        let fetched = join_all(
            self.config
                .symbols
                .iter()
                .map(|symbol| self.fetch_with_timeout(symbol)),
        )
        .await;

        let mut scored = Vec::with_capacity(fetched.len());
        for (symbol, result) in self.config.symbols.iter().zip(fetched) {
            match result.and_then(|raw| self.score_symbol(symbol, &raw)) {
                Ok(row) => scored.push(row),
                Err(e) => {
                    warn!("Skipping {}: {}", symbol, e);
                    report.skipped.push((symbol.clone(), e));
                }
            }
        }

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));

        {
            let mut state = self.state.lock().await;
            let RadarState {
                alerts,
                log,
                scoreboard,
            } = &mut *state;

            for row in &scored {
                if let Some(alert) = self.machine.evaluate(alerts, log, row) {
                    report.alerts.push(alert);
                }
            }
            *scoreboard = scored.clone();
        }

        let (delivered, failed) = self.deliver(&report.alerts).await;
        report.delivered = delivered;
        report.failed_deliveries = failed;
        report.results = scored;

        info!(
            "Cycle complete: {} scored, {} skipped, {} alerts ({} delivered, {} failed)",
            report.results.len(),
            report.skipped.len(),
            report.alerts.len(),
            report.delivered,
            report.failed_deliveries
        );

        report
    }

    async fn fetch_with_timeout(&self, symbol: &str) -> Result<Vec<RawBar>, RadarError> {
        let secs = self.config.fetch_timeout_secs;
        let fetch = self
            .source
            .fetch_bars(symbol, self.config.timeframe, self.config.lookback_bars);

        match timeout(Duration::from_secs(secs), fetch).await {
            Ok(result) => result,
            Err(_) => Err(RadarError::Timeout {
                operation: "Bar fetch".to_string(),
                symbol: symbol.to_string(),
                secs,
            }),
        }
    }

    /// Clean, compute indicators and score one symbol
    fn score_symbol(&self, symbol: &str, raw: &[RawBar]) -> Result<ScoreResult, RadarError> {
        let series = clean_bars(symbol, raw)?;
        let indicators = compute_indicators(&series, &self.config.indicators)?;

        let last = series.last().ok_or_else(|| RadarError::EmptySeries {
            symbol: symbol.to_string(),
        })?;

        debug!(
            "{}: momentum {:.2}%, rvol {:.2}, rsi {:.1}, day {:.2}%",
            symbol,
            indicators.momentum_pct,
            indicators.relative_volume,
            indicators.rsi,
            indicators.daily_change_pct
        );

        Ok(self
            .scorer
            .evaluate(symbol, last.close, indicators, chrono::Utc::now()))
    }

    /// Send alerts; returns (delivered, failed)
    async fn deliver(&self, alerts: &[Alert]) -> (usize, usize) {
        let secs = self.config.notify_timeout_secs;

        let outcomes = join_all(alerts.iter().map(|alert| async move {
            match timeout(Duration::from_secs(secs), self.notifier.notify(alert)).await {
                Ok(Ok(())) => true,
                Ok(Err(e)) => {
                    warn!("Failed to notify {} alert for {}: {}", alert.reason, alert.symbol, e);
                    false
                }
                Err(_) => {
                    warn!("Notification for {} timed out after {}s", alert.symbol, secs);
                    false
                }
            }
        }))
        .await;

        let delivered = outcomes.iter().filter(|ok| **ok).count();
        (delivered, outcomes.len() - delivered)
    }

    /// Latest ranked score table
    pub async fn scoreboard(&self) -> Vec<ScoreResult> {
        self.state.lock().await.scoreboard.clone()
    }

    /// Full alert history
    pub async fn history(&self) -> Vec<LogEntry> {
        self.state.lock().await.log.entries().to_vec()
    }

    pub async fn summary(&self) -> RunSummary {
        self.state.lock().await.log.summary()
    }

    /// Operator action: drop the alert history
    pub async fn clear_history(&self) {
        self.state.lock().await.log.clear();
    }

    /// Operator action: return every symbol to UNARMED
    pub async fn reset_alerts(&self) {
        self.state.lock().await.alerts.reset();
    }

    /// Send the session summary through the notifier
    pub async fn send_closing_summary(&self) -> Result<(), RadarError> {
        let summary = {
            let state = self.state.lock().await;
            if state.log.is_empty() {
                return Err(RadarError::EmptyHistory);
            }
            state.log.summary()
        };

        self.notifier.send_text(&summary.to_message()).await?;
        info!("Closing summary sent ({} alerts)", summary.total_alerts);
        Ok(())
    }

    /// Closing summary plus history export, when enabled
    pub(crate) async fn shutdown(&self) {
        if !self.config.summary_on_shutdown {
            return;
        }

        match self.send_closing_summary().await {
            Ok(()) => {}
            Err(RadarError::EmptyHistory) => {
                info!("No alerts this session, nothing to summarise");
                return;
            }
            Err(e) => error!("Failed to send closing summary: {}", e),
        }

        if let Err(e) = self.reports.init().await {
            error!("Report directory unavailable: {}", e);
            return;
        }

        let today = chrono::Utc::now().date_naive();
        let state = self.state.lock().await;
        if let Err(e) = self.reports.write_history(&state.log, today).await {
            error!("Failed to write history report: {}", e);
        }
        if let Err(e) = self.reports.write_history_sheet(&state.log, today).await {
            error!("Failed to write history sheet: {}", e);
        }
    }
}

fn log_score_table(rows: &[ScoreResult]) {
    for (rank, row) in rows.iter().enumerate() {
        info!(
            "#{:<2} {:<6} {:>10.2} score {:>5.1} [{}]",
            rank + 1,
            row.symbol,
            row.price,
            row.score,
            row.status
        );
    }
}
