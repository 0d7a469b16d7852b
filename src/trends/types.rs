use serde::Serialize;

/// Per-app window statistics for one snapshot run. Derived from the history
/// store each run, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct TrendRow {
    pub app_id: String,
    pub title: String,
    pub latest_players: u64,
    /// Oldest player count inside the window; `None` until the app has at
    /// least two samples in the window.
    pub oldest_players: Option<u64>,
    /// Percent change across the window, unrounded. 0.0 both for the
    /// zero-signal state (fewer than two samples) and for a zero baseline.
    pub pct_change: f64,
    pub samples_in_window: usize,
}

impl TrendRow {
    /// A real trend needs at least two observations inside the window.
    pub fn has_full_window(&self) -> bool {
        self.samples_in_window >= 2
    }
}
