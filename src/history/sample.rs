use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One timestamped player-count observation for a catalog item.
/// Immutable once created; only retention trimming removes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub app_id: String,
    pub title: String,
    pub player_count: u64,
}

impl Sample {
    /// Builds a sample from a raw collector row. The metric arrives as a
    /// signed value straight off the wire; negatives and empty ids are
    /// rejected here, at the ingestion boundary.
    pub fn new(
        timestamp: DateTime<Utc>,
        app_id: &str,
        title: &str,
        player_count: i64,
    ) -> Result<Self> {
        if app_id.trim().is_empty() {
            return Err(Error::Validation("sample is missing an app_id".to_string()));
        }
        if player_count < 0 {
            return Err(Error::Validation(format!(
                "negative player count {} for app {}",
                player_count, app_id
            )));
        }

        Ok(Self {
            timestamp,
            app_id: app_id.to_string(),
            title: title.to_string(),
            player_count: player_count as u64,
        })
    }
}
