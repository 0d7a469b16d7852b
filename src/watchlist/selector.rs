use std::cmp::Ordering;

use crate::config::WatchlistConfig;
use crate::trends::TrendRow;

/// Filters and ranks trend rows into the watchlist.
///
/// The rule set is intentionally asymmetric: with `require_full_window` off,
/// apps without enough history get the benefit of the doubt and are surfaced
/// alongside confirmed growers. This is a discovery tool, not a strict
/// growth filter.
pub struct WatchlistSelector {
    min_players: u64,
    min_pct: f64,
    require_full_window: bool,
}

impl WatchlistSelector {
    pub fn new(config: &WatchlistConfig) -> Self {
        Self {
            min_players: config.min_players,
            min_pct: config.min_pct,
            require_full_window: config.require_full_window,
        }
    }

    /// Selection is deterministic: the sort is stable, so rows that compare
    /// equal keep their input order.
    pub fn select(&self, trend_rows: &[TrendRow]) -> Vec<TrendRow> {
        let mut selected: Vec<TrendRow> = trend_rows
            .iter()
            .filter(|row| self.includes(row))
            .cloned()
            .collect();

        selected.sort_by(|a, b| {
            b.has_full_window()
                .cmp(&a.has_full_window())
                .then(
                    b.pct_change
                        .partial_cmp(&a.pct_change)
                        .unwrap_or(Ordering::Equal),
                )
                .then(b.latest_players.cmp(&a.latest_players))
        });
        selected
    }

    fn includes(&self, row: &TrendRow) -> bool {
        if row.latest_players < self.min_players {
            return false;
        }
        if self.require_full_window {
            row.has_full_window() && row.pct_change >= self.min_pct
        } else {
            !row.has_full_window() || row.pct_change >= self.min_pct
        }
    }
}
