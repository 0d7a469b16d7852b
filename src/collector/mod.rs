pub mod steam;

pub use steam::SteamClient;

use serde::{Deserialize, Serialize};

/// One raw catalog row handed to the core. Pre-validation: the player count
/// is still signed here, straight off the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogEntry {
    pub app_id: String,
    pub title: String,
    pub player_count: i64,
    pub release_date: String,
    pub publisher: String,
    pub price: String,
    pub is_free: bool,
    pub genres: String,
}
