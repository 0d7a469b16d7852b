use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub scan: ScanConfig,
    pub trends: TrendConfig,
    pub watchlist: WatchlistConfig,
    pub storage: StorageConfig,
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_pool_limit")]
    pub pool_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendConfig {
    #[serde(default = "default_window_days")]
    pub window_days: i64,
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchlistConfig {
    #[serde(default = "default_min_players")]
    pub min_players: u64,
    #[serde(default = "default_min_pct")]
    pub min_pct: f64,
    #[serde(default = "default_require_full_window")]
    pub require_full_window: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_history_path")]
    pub history_path: PathBuf,
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_region() -> String { "US".to_string() }
fn default_pool_limit() -> usize { 200 }
fn default_window_days() -> i64 { 7 }
fn default_retention_days() -> i64 { 8 }
fn default_min_players() -> u64 { 100 }
fn default_min_pct() -> f64 { 25.0 }
fn default_require_full_window() -> bool { false }
fn default_history_path() -> PathBuf { PathBuf::from("steam_scout_history.jsonl") }
fn default_out_dir() -> PathBuf { PathBuf::from(".") }
fn default_max_attempts() -> u32 { 3 }
fn default_backoff_ms() -> u64 { 1000 }
fn default_timeout_secs() -> u64 { 20 }

impl Default for Config {
    fn default() -> Self {
        Self {
            scan: ScanConfig {
                region: default_region(),
                pool_limit: default_pool_limit(),
            },
            trends: TrendConfig {
                window_days: default_window_days(),
                retention_days: default_retention_days(),
            },
            watchlist: WatchlistConfig {
                min_players: default_min_players(),
                min_pct: default_min_pct(),
                require_full_window: default_require_full_window(),
            },
            storage: StorageConfig {
                history_path: default_history_path(),
                out_dir: default_out_dir(),
            },
            fetch: FetchConfig {
                max_attempts: default_max_attempts(),
                backoff_ms: default_backoff_ms(),
                timeout_secs: default_timeout_secs(),
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path()?)
    }

    pub fn load_from(path: PathBuf) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)
                .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, content)?;
        Ok(())
    }

    /// Retention shorter than the trend window would starve the window.
    pub fn validate(&self) -> Result<()> {
        if self.trends.window_days <= 0 {
            return Err(Error::Config("window_days must be positive".to_string()));
        }
        if self.trends.retention_days < self.trends.window_days {
            return Err(Error::Config(format!(
                "retention_days ({}) must be >= window_days ({})",
                self.trends.retention_days, self.trends.window_days
            )));
        }
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| Error::Config("HOME environment variable not set".to_string()))?;

        Ok(PathBuf::from(home).join(".config/steam-scout/config.toml"))
    }
}
