use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use super::TrendRow;
use crate::history::{HistoryStore, Sample};

/// Derives per-app window statistics from the history store.
pub struct TrendCalculator {
    window: Duration,
}

impl TrendCalculator {
    pub fn new(window_days: i64) -> Self {
        Self {
            window: Duration::days(window_days),
        }
    }

    /// One `TrendRow` per app in the current batch, keyed by app id. An
    /// empty batch yields an empty map. The batch is expected to be already
    /// appended to the store, so the window normally contains at least the
    /// run's own sample.
    pub fn compute(
        &self,
        store: &HistoryStore,
        batch: &[Sample],
        now: DateTime<Utc>,
    ) -> HashMap<String, TrendRow> {
        let since = now - self.window;
        let mut rows = HashMap::new();

        for sample in batch {
            if rows.contains_key(&sample.app_id) {
                continue;
            }

            let window = store.read_window(&sample.app_id, since);

            let row = if window.len() < 2 {
                // A single observation cannot establish a trend: defined
                // zero-signal state, not an error.
                let latest = window.last().unwrap_or(sample);
                TrendRow {
                    app_id: sample.app_id.clone(),
                    title: latest.title.clone(),
                    latest_players: latest.player_count,
                    oldest_players: None,
                    pct_change: 0.0,
                    samples_in_window: window.len(),
                }
            } else {
                let oldest = window.first().map(|s| s.player_count).unwrap_or(0);
                let newest = &window[window.len() - 1];
                let latest = newest.player_count;

                let pct_change = if oldest == 0 {
                    // Zero baseline has no meaningful ratio; emit no signal
                    // rather than an infinite one.
                    0.0
                } else {
                    (latest as f64 - oldest as f64) / oldest as f64 * 100.0
                };

                TrendRow {
                    app_id: sample.app_id.clone(),
                    title: newest.title.clone(),
                    latest_players: latest,
                    oldest_players: Some(oldest),
                    pct_change,
                    samples_in_window: window.len(),
                }
            };

            rows.insert(sample.app_id.clone(), row);
        }

        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample(app_id: &str, ts: DateTime<Utc>, count: i64) -> Sample {
        Sample::new(ts, app_id, "Some Game", count).unwrap()
    }

    fn store_with(dir: &tempfile::TempDir, samples: &[Sample]) -> HistoryStore {
        let mut store = HistoryStore::open(dir.path().join("history.jsonl")).unwrap();
        store.append(samples).unwrap();
        store
    }

    #[test]
    fn test_fifty_percent_growth_over_window() {
        // 100 at t0, 150 three days later, 3-day window.
        let dir = tempdir().unwrap();
        let now = Utc::now();
        let batch = vec![sample("10", now, 150)];
        let store = store_with(
            &dir,
            &[sample("10", now - Duration::days(3), 100), batch[0].clone()],
        );

        let rows = TrendCalculator::new(3).compute(&store, &batch, now);
        let row = &rows["10"];
        assert_eq!(row.oldest_players, Some(100));
        assert_eq!(row.latest_players, 150);
        assert!((row.pct_change - 50.0).abs() < 1e-9);
        assert!(row.has_full_window());
    }

    #[test]
    fn test_single_sample_is_zero_signal() {
        let dir = tempdir().unwrap();
        let now = Utc::now();
        let batch = vec![sample("20", now, 80)];
        let store = store_with(&dir, &batch);

        let rows = TrendCalculator::new(3).compute(&store, &batch, now);
        let row = &rows["20"];
        assert_eq!(row.oldest_players, None);
        assert_eq!(row.pct_change, 0.0);
        assert!(!row.has_full_window());
    }

    #[test]
    fn test_zero_baseline_yields_no_signal() {
        let dir = tempdir().unwrap();
        let now = Utc::now();
        let batch = vec![sample("30", now, 500)];
        let store = store_with(
            &dir,
            &[sample("30", now - Duration::days(1), 0), batch[0].clone()],
        );

        let rows = TrendCalculator::new(3).compute(&store, &batch, now);
        let row = &rows["30"];
        assert_eq!(row.oldest_players, Some(0));
        assert_eq!(row.pct_change, 0.0);
        assert!(row.has_full_window());
    }

    #[test]
    fn test_samples_outside_window_ignored() {
        let dir = tempdir().unwrap();
        let now = Utc::now();
        let batch = vec![sample("40", now, 200)];
        let store = store_with(
            &dir,
            &[sample("40", now - Duration::days(30), 9000), batch[0].clone()],
        );

        let rows = TrendCalculator::new(7).compute(&store, &batch, now);
        let row = &rows["40"];
        assert_eq!(row.samples_in_window, 1);
        assert_eq!(row.oldest_players, None);
        assert_eq!(row.pct_change, 0.0);
    }

    #[test]
    fn test_empty_batch_yields_empty_map() {
        let dir = tempdir().unwrap();
        let store = store_with(&dir, &[]);
        let rows = TrendCalculator::new(7).compute(&store, &[], Utc::now());
        assert!(rows.is_empty());
    }

    #[test]
    fn test_title_follows_latest_sample() {
        let dir = tempdir().unwrap();
        let now = Utc::now();
        let old = Sample::new(now - Duration::days(2), "50", "Working Title", 100).unwrap();
        let new = Sample::new(now, "50", "Final Title", 120).unwrap();
        let store = store_with(&dir, &[old, new.clone()]);

        let rows = TrendCalculator::new(7).compute(&store, &[new], now);
        assert_eq!(rows["50"].title, "Final Title");
    }

    #[test]
    fn test_decline_is_negative() {
        let dir = tempdir().unwrap();
        let now = Utc::now();
        let batch = vec![sample("60", now, 50)];
        let store = store_with(
            &dir,
            &[sample("60", now - Duration::days(2), 200), batch[0].clone()],
        );

        let rows = TrendCalculator::new(7).compute(&store, &batch, now);
        assert!((rows["60"].pct_change - (-75.0)).abs() < 1e-9);
    }
}
