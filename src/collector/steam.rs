use std::time::Duration;

use serde_json::Value;

use super::CatalogEntry;
use crate::config::{FetchConfig, ScanConfig};
use crate::error::{Error, Result};

const USER_AGENT: &str = "Escapist-SteamScout/2.0 (+editorial discovery)";
const STORE_FEATURED: &str = "https://store.steampowered.com/api/featuredcategories";
const STORE_APPDETAILS: &str = "https://store.steampowered.com/api/appdetails";
const API_CURRENT_PLAYERS: &str =
    "https://api.steampowered.com/ISteamUserStats/GetNumberOfCurrentPlayers/v1/";

/// Featured-category buckets mined for the candidate pool.
const POOL_BUCKETS: [&str; 5] = [
    "new_releases",
    "specials",
    "topnewreleases",
    "coming_soon",
    "topsellers",
];

/// Storefront + Web API client. Owns the retry policy; the core never sees
/// a network error that a retry could have absorbed.
pub struct SteamClient {
    http: reqwest::blocking::Client,
    region: String,
    api_key: Option<String>,
    max_attempts: u32,
    backoff: Duration,
}

impl SteamClient {
    pub fn new(scan: &ScanConfig, fetch: &FetchConfig, api_key: Option<String>) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(fetch.timeout_secs))
            .build()
            .map_err(|e| Error::Fetch(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            region: scan.region.clone(),
            api_key,
            max_attempts: fetch.max_attempts.max(1),
            backoff: Duration::from_millis(fetch.backoff_ms),
        })
    }

    /// Builds the current batch: featured pool, per-app metadata, CCU.
    /// Per-app failures are skipped and counted; only a dead featured feed
    /// fails the whole collection.
    pub fn collect(&self, limit: usize) -> Result<Vec<CatalogEntry>> {
        let pool = self.fetch_featured_pool(limit)?;
        log::info!("featured pool: {} apps (region={})", pool.len(), self.region);

        let mut entries = Vec::new();
        let mut dropped_type = 0usize;
        let mut dropped_coming = 0usize;
        let mut detail_fail = 0usize;

        for app_id in &pool {
            let details = match self.fetch_app_details(*app_id) {
                Ok(Some(value)) => value,
                Ok(None) => {
                    detail_fail += 1;
                    continue;
                }
                Err(e) => {
                    detail_fail += 1;
                    log::debug!("appdetails failed for {}: {}", app_id, e);
                    continue;
                }
            };

            let Some(mut entry) = decode_app_details(*app_id, &details) else {
                dropped_type += 1;
                continue;
            };
            if is_coming_soon(&details) {
                dropped_coming += 1;
                continue;
            }

            entry.player_count = match self.fetch_current_players(*app_id) {
                Ok(count) => count,
                Err(e) => {
                    log::debug!("player count failed for {}: {}", app_id, e);
                    0
                }
            };
            entries.push(entry);
        }

        log::info!(
            "[summary] pool={} kept={} dropped_type={} dropped_coming={} appdetail_fail={}",
            pool.len(),
            entries.len(),
            dropped_type,
            dropped_coming,
            detail_fail
        );
        Ok(entries)
    }

    fn fetch_featured_pool(&self, limit: usize) -> Result<Vec<u64>> {
        let value = self.get_json(
            STORE_FEATURED,
            &[("cc", self.region.as_str()), ("l", "en")],
        )?;
        let mut pool = decode_featured_pool(&value);
        pool.truncate(limit);
        Ok(pool)
    }

    fn fetch_app_details(&self, app_id: u64) -> Result<Option<Value>> {
        let id = app_id.to_string();
        let value = self.get_json(
            STORE_APPDETAILS,
            &[("appids", id.as_str()), ("cc", self.region.as_str()), ("l", "en")],
        )?;

        let entry = &value[id.as_str()];
        if entry["success"].as_bool() != Some(true) {
            return Ok(None);
        }
        Ok(Some(entry["data"].clone()))
    }

    fn fetch_current_players(&self, app_id: u64) -> Result<i64> {
        // Same behavior as upstream: without an API key the count is simply
        // reported as zero.
        let Some(key) = &self.api_key else {
            return Ok(0);
        };
        let id = app_id.to_string();
        let value = self.get_json(
            API_CURRENT_PLAYERS,
            &[("key", key.as_str()), ("appid", id.as_str())],
        )?;
        Ok(decode_player_count(&value))
    }

    fn get_json(&self, url: &str, params: &[(&str, &str)]) -> Result<Value> {
        let mut last_err = String::new();
        for attempt in 1..=self.max_attempts {
            match self.http.get(url).query(params).send() {
                Ok(response) if response.status().is_success() => {
                    return response
                        .json::<Value>()
                        .map_err(|e| Error::Parse(format!("bad JSON from {}: {}", url, e)));
                }
                Ok(response) => {
                    last_err = format!("HTTP {}", response.status());
                }
                Err(e) => {
                    last_err = e.to_string();
                }
            }
            if attempt < self.max_attempts {
                std::thread::sleep(self.backoff);
            }
        }
        Err(Error::Fetch(format!(
            "{} failed after {} attempts: {}",
            url, self.max_attempts, last_err
        )))
    }
}

/// App ids from every pool bucket, deduplicated, feed order preserved.
pub fn decode_featured_pool(value: &Value) -> Vec<u64> {
    let mut pool = Vec::new();
    for bucket in POOL_BUCKETS {
        let items = value[bucket]["items"].as_array();
        for item in items.into_iter().flatten() {
            if let Some(id) = item["id"].as_u64() {
                if !pool.contains(&id) {
                    pool.push(id);
                }
            }
        }
    }
    pool
}

/// Metadata row from an appdetails payload. `None` when the item is not a
/// game or DLC.
pub fn decode_app_details(app_id: u64, data: &Value) -> Option<CatalogEntry> {
    let kind = data["type"].as_str().unwrap_or("");
    if kind != "game" && kind != "dlc" {
        return None;
    }

    let title = data["name"].as_str().unwrap_or("").to_string();
    let is_free = data["is_free"].as_bool().unwrap_or(false);

    let price = if is_free {
        "Free".to_string()
    } else {
        data["price_overview"]["final_formatted"]
            .as_str()
            .unwrap_or("")
            .to_string()
    };

    let publisher = join_strings(&data["publishers"]);
    let genres = join_descriptions(&data["genres"]);
    // Raw feed string, deliberately unparsed.
    let release_date = data["release_date"]["date"].as_str().unwrap_or("").to_string();

    Some(CatalogEntry {
        app_id: app_id.to_string(),
        title,
        player_count: 0,
        release_date,
        publisher,
        price,
        is_free,
        genres,
    })
}

pub fn is_coming_soon(data: &Value) -> bool {
    data["release_date"]["coming_soon"].as_bool().unwrap_or(false)
}

pub fn decode_player_count(value: &Value) -> i64 {
    value["response"]["player_count"].as_i64().unwrap_or(0)
}

fn join_strings(value: &Value) -> String {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default()
}

fn join_descriptions(value: &Value) -> String {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v["description"].as_str())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_featured_pool_dedups_across_buckets() {
        let value = json!({
            "new_releases": {"items": [{"id": 10}, {"id": 20}]},
            "specials": {"items": [{"id": 20}, {"id": 30}]},
            "topsellers": {"items": [{"id": 10}]}
        });
        assert_eq!(decode_featured_pool(&value), vec![10, 20, 30]);
    }

    #[test]
    fn test_decode_featured_pool_tolerates_missing_buckets() {
        assert!(decode_featured_pool(&json!({})).is_empty());
    }

    #[test]
    fn test_decode_app_details_game() {
        let data = json!({
            "type": "game",
            "name": "Deep Rock",
            "is_free": false,
            "price_overview": {"final_formatted": "$29.99"},
            "publishers": ["Coffee Stain"],
            "genres": [{"description": "Action"}, {"description": "Co-op"}],
            "release_date": {"coming_soon": false, "date": "13 May, 2020"}
        });
        let entry = decode_app_details(548430, &data).unwrap();
        assert_eq!(entry.app_id, "548430");
        assert_eq!(entry.title, "Deep Rock");
        assert_eq!(entry.price, "$29.99");
        assert_eq!(entry.publisher, "Coffee Stain");
        assert_eq!(entry.genres, "Action, Co-op");
        assert_eq!(entry.release_date, "13 May, 2020");
        assert!(!is_coming_soon(&data));
    }

    #[test]
    fn test_decode_app_details_rejects_non_game() {
        let data = json!({"type": "music", "name": "OST"});
        assert!(decode_app_details(1, &data).is_none());
    }

    #[test]
    fn test_free_game_price_label() {
        let data = json!({"type": "game", "name": "F2P", "is_free": true});
        let entry = decode_app_details(2, &data).unwrap();
        assert!(entry.is_free);
        assert_eq!(entry.price, "Free");
    }

    #[test]
    fn test_decode_player_count() {
        let value = json!({"response": {"player_count": 4321, "result": 1}});
        assert_eq!(decode_player_count(&value), 4321);
        assert_eq!(decode_player_count(&json!({})), 0);
    }

    #[test]
    fn test_coming_soon_flag() {
        let data = json!({"release_date": {"coming_soon": true, "date": "2026"}});
        assert!(is_coming_soon(&data));
    }
}
