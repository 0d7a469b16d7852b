use chrono::{DateTime, Duration, Utc};

use crate::collector::CatalogEntry;
use crate::config::Config;
use crate::error::Result;
use crate::history::{HistoryStore, Sample};
use crate::trends::{TrendCalculator, TrendRow};
use crate::watchlist::WatchlistSelector;

/// Operational counters for one run, surfaced to the caller for logging.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub processed: usize,
    pub rejected: usize,
    pub full_window: usize,
    pub watchlisted: usize,
    pub trimmed: usize,
}

pub struct SnapshotOutcome {
    pub trends: Vec<TrendRow>,
    pub watchlist: Vec<TrendRow>,
    pub summary: RunSummary,
}

/// One ingest-trim-compute-select cycle over the durable history.
pub struct SnapshotRun {
    calculator: TrendCalculator,
    selector: WatchlistSelector,
    retention: Duration,
}

impl SnapshotRun {
    pub fn new(config: &Config) -> Self {
        Self {
            calculator: TrendCalculator::new(config.trends.window_days),
            selector: WatchlistSelector::new(&config.watchlist),
            retention: Duration::days(config.trends.retention_days),
        }
    }

    /// Malformed batch entries are rejected and counted; the run continues
    /// with the rest. Only storage failures abort.
    pub fn run(
        &self,
        store: &mut HistoryStore,
        batch: &[CatalogEntry],
        now: DateTime<Utc>,
    ) -> Result<SnapshotOutcome> {
        let mut summary = RunSummary::default();

        let mut samples = Vec::with_capacity(batch.len());
        for entry in batch {
            match Sample::new(now, &entry.app_id, &entry.title, entry.player_count) {
                Ok(sample) => samples.push(sample),
                Err(e) => {
                    summary.rejected += 1;
                    log::warn!("rejected sample: {}", e);
                }
            }
        }
        summary.processed = samples.len();

        store.append(&samples)?;
        summary.trimmed = store.trim(now - self.retention)?;

        let mut by_app = self.calculator.compute(store, &samples, now);

        // Back into batch order; compute keys by app id and drops duplicates,
        // so first occurrence wins here too.
        let mut trends = Vec::with_capacity(by_app.len());
        for sample in &samples {
            if let Some(row) = by_app.remove(&sample.app_id) {
                trends.push(row);
            }
        }

        summary.full_window = trends.iter().filter(|r| r.has_full_window()).count();
        let watchlist = self.selector.select(&trends);
        summary.watchlisted = watchlist.len();

        log::info!(
            "[summary] processed={} rejected={} full_window={} watchlisted={} trimmed={}",
            summary.processed,
            summary.rejected,
            summary.full_window,
            summary.watchlisted,
            summary.trimmed
        );

        Ok(SnapshotOutcome {
            trends,
            watchlist,
            summary,
        })
    }
}
