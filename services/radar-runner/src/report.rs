//! Report export - score table and alert history as JSON files

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::error::RadarError;
use crate::journal::{RunLog, RunSummary};
use crate::types::{LogEntry, ScoreResult};

/// Writes report files under a base directory
pub struct ReportWriter {
    state_dir: PathBuf,
    reports_dir: PathBuf,
}

/// Current score table (state/scoreboard.json)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreboardFile {
    pub generated_at: String,
    pub rows: Vec<ScoreResult>,
}

/// Alert history export (reports/Radar_Report_<date>.json)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryReport {
    pub date: String,
    pub summary: RunSummary,
    pub entries: Vec<LogEntry>,
}

impl ReportWriter {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        let base = base_dir.as_ref();
        Self {
            state_dir: base.join("state"),
            reports_dir: base.join("reports"),
        }
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        fs::create_dir_all(&self.state_dir).await?;
        fs::create_dir_all(&self.reports_dir).await?;
        Ok(())
    }

    pub async fn write_scoreboard(&self, rows: &[ScoreResult]) -> anyhow::Result<PathBuf> {
        let path = self.state_dir.join("scoreboard.json");
        let file = ScoreboardFile {
            generated_at: chrono::Utc::now().to_rfc3339(),
            rows: rows.to_vec(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        fs::write(&path, json).await?;
        debug!("Wrote state/scoreboard.json");
        Ok(path)
    }

    /// Export the run log for `date`. An empty log is refused.
    pub async fn write_history(&self, log: &RunLog, date: NaiveDate) -> anyhow::Result<PathBuf> {
        if log.is_empty() {
            return Err(RadarError::EmptyHistory.into());
        }

        let date = date.format("%Y-%m-%d").to_string();
        let path = self.reports_dir.join(format!("Radar_Report_{}.json", date));
        let report = HistoryReport {
            date,
            summary: log.summary(),
            entries: log.entries().to_vec(),
        };
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(&path, json).await?;
        info!("History report written to {}", path.display());
        Ok(path)
    }

    /// Export the run log as a spreadsheet-friendly CSV sheet for `date`
    pub async fn write_history_sheet(
        &self,
        log: &RunLog,
        date: NaiveDate,
    ) -> anyhow::Result<PathBuf> {
        if log.is_empty() {
            return Err(RadarError::EmptyHistory.into());
        }

        let path = self
            .reports_dir
            .join(format!("Radar_Report_{}.csv", date.format("%Y-%m-%d")));

        let mut sheet = String::from("time_utc,symbol,reason,price,score\n");
        for entry in log.entries() {
            sheet.push_str(&format!(
                "{},{},{},{:.2},{:.1}\n",
                entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                entry.symbol,
                entry.reason,
                entry.price_at_alert,
                entry.score_at_alert
            ));
        }

        fs::write(&path, sheet).await?;
        info!("History sheet written to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertMachine;
    use crate::alerts::AlertStore;
    use crate::config::AlertPolicy;
    use crate::types::{IndicatorSet, StatusLabel};
    use chrono::{TimeZone, Utc};

    fn row(symbol: &str, price: f64, score: f64) -> ScoreResult {
        ScoreResult {
            symbol: symbol.to_string(),
            price,
            score,
            status: StatusLabel::Breakout,
            indicators: IndicatorSet {
                momentum_pct: 4.0,
                relative_volume: 2.5,
                rsi: 62.0,
                daily_change_pct: 3.1,
            },
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_write_scoreboard() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path());
        writer.init().await.unwrap();

        let path = writer
            .write_scoreboard(&[row("AAPL", 190.0, 91.0), row("MSFT", 410.0, 70.0)])
            .await
            .unwrap();

        let parsed: ScoreboardFile =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].symbol, "AAPL");
    }

    #[tokio::test]
    async fn test_write_history_named_by_date() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path());
        writer.init().await.unwrap();

        let mut store = AlertStore::new();
        let mut log = RunLog::new();
        AlertMachine::new(AlertPolicy::default())
            .evaluate(&mut store, &mut log, &row("AAPL", 190.0, 91.0))
            .unwrap();

        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let path = writer.write_history(&log, date).await.unwrap();
        assert!(path.ends_with("reports/Radar_Report_2026-03-02.json"));

        let parsed: HistoryReport =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(parsed.summary.total_alerts, 1);
        assert_eq!(parsed.entries[0].symbol, "AAPL");
    }

    #[tokio::test]
    async fn test_write_history_sheet_rows() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path());
        writer.init().await.unwrap();

        let mut store = AlertStore::new();
        let mut log = RunLog::new();
        let machine = AlertMachine::new(AlertPolicy::default());
        let mut first = row("AAPL", 190.0, 91.0);
        first.timestamp = Utc.with_ymd_and_hms(2026, 3, 2, 15, 0, 0).unwrap();
        let mut second = row("AAPL", 200.5, 55.3);
        second.timestamp = Utc.with_ymd_and_hms(2026, 3, 2, 15, 45, 0).unwrap();
        machine.evaluate(&mut store, &mut log, &first).unwrap();
        machine.evaluate(&mut store, &mut log, &second).unwrap();

        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let path = writer.write_history_sheet(&log, date).await.unwrap();
        assert!(path.ends_with("reports/Radar_Report_2026-03-02.csv"));

        let sheet = std::fs::read_to_string(path).unwrap();
        let lines: Vec<_> = sheet.lines().collect();
        assert_eq!(
            lines,
            vec![
                "time_utc,symbol,reason,price,score",
                "2026-03-02 15:00:00,AAPL,breakout,190.00,91.0",
                "2026-03-02 15:45:00,AAPL,move,200.50,55.3",
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_history_refused() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path());
        writer.init().await.unwrap();

        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let err = writer.write_history(&RunLog::new(), date).await.unwrap_err();
        assert_eq!(err.downcast_ref::<RadarError>(), Some(&RadarError::EmptyHistory));

        let err = writer
            .write_history_sheet(&RunLog::new(), date)
            .await
            .unwrap_err();
        assert_eq!(err.downcast_ref::<RadarError>(), Some(&RadarError::EmptyHistory));
        assert!(std::fs::read_dir(dir.path().join("reports")).unwrap().next().is_none());
    }
}
