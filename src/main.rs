use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use clap::Parser;

use steam_scout::collector::{CatalogEntry, SteamClient};
use steam_scout::history::HistoryStore;
use steam_scout::{export, Config, Error, Result, SnapshotRun};

#[derive(Parser, Debug)]
#[command(name = "steam-scout")]
#[command(author, version, about = "Editorial radar for Steam with rolling player-count trends", long_about = None)]
struct Args {
    #[arg(long, help = "Steam store country code, e.g. US, GB, DE")]
    region: Option<String>,

    #[arg(long, help = "Max apps to consider from the featured pool")]
    limit: Option<usize>,

    #[arg(long, help = "Trend window in days")]
    window_days: Option<i64>,

    #[arg(long, help = "History retention in days")]
    retention_days: Option<i64>,

    #[arg(long, help = "Watchlist minimum current players")]
    watch_min_ccu: Option<u64>,

    #[arg(long, help = "Watchlist minimum window growth, percent")]
    watch_min_pct: Option<f64>,

    #[arg(long, help = "Only watchlist apps with a full trend window")]
    require_full_window: bool,

    #[arg(long, help = "Path to the history store file")]
    store: Option<PathBuf>,

    #[arg(long, help = "Directory for CSV/JSON output")]
    out_dir: Option<PathBuf>,

    #[arg(long, help = "Read the batch from a JSON file instead of the Steam API", value_name = "FILE")]
    input: Option<PathBuf>,

    #[arg(short, long, help = "Path to custom config file")]
    config: Option<PathBuf>,

    #[arg(short, long, help = "Verbose logging")]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    log::info!("Starting steam-scout v{}", env!("CARGO_PKG_VERSION"));

    let mut config = if let Some(config_path) = &args.config {
        log::info!("Loading config from: {}", config_path.display());
        Config::load_from(config_path.clone())?
    } else {
        Config::load().unwrap_or_default()
    };
    apply_overrides(&mut config, &args);
    config.validate()?;

    let batch = if let Some(input) = &args.input {
        log::info!("Reading batch from {}", input.display());
        load_batch(input)?
    } else {
        let api_key = std::env::var("STEAM_API_KEY").ok().filter(|k| !k.is_empty());
        if api_key.is_none() {
            log::warn!("STEAM_API_KEY not set; player counts will be reported as 0");
        }
        let client = SteamClient::new(&config.scan, &config.fetch, api_key)?;
        client.collect(config.scan.pool_limit)?
    };

    if batch.is_empty() {
        log::warn!("No catalog entries collected; nothing to do");
        return Ok(());
    }

    let mut store = HistoryStore::open(&config.storage.history_path)?;
    let now = Utc::now();

    let run = SnapshotRun::new(&config);
    let outcome = run.run(&mut store, &batch, now)?;

    fs::create_dir_all(&config.storage.out_dir)?;
    let out = &config.storage.out_dir;
    export::export_today_csv(&batch, &out.join("steam_scout_today.csv"))?;
    export::export_trends_csv(&outcome.trends, &out.join("steam_scout_trends.csv"))?;
    export::export_watchlist_csv(&outcome.watchlist, &out.join("steam_scout_watchlist.csv"))?;
    export::export_trends_json(&outcome.trends, &out.join("steam_scout_trends.json"))?;

    log::info!(
        "Wrote {} trend rows and {} watchlist rows to {}",
        outcome.trends.len(),
        outcome.watchlist.len(),
        out.display()
    );

    Ok(())
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(region) = &args.region {
        config.scan.region = region.clone();
    }
    if let Some(limit) = args.limit {
        config.scan.pool_limit = limit;
    }
    if let Some(days) = args.window_days {
        config.trends.window_days = days;
    }
    if let Some(days) = args.retention_days {
        config.trends.retention_days = days;
    }
    if let Some(min) = args.watch_min_ccu {
        config.watchlist.min_players = min;
    }
    if let Some(pct) = args.watch_min_pct {
        config.watchlist.min_pct = pct;
    }
    if args.require_full_window {
        config.watchlist.require_full_window = true;
    }
    if let Some(store) = &args.store {
        config.storage.history_path = store.clone();
    }
    if let Some(out_dir) = &args.out_dir {
        config.storage.out_dir = out_dir.clone();
    }
}

fn load_batch(path: &PathBuf) -> Result<Vec<CatalogEntry>> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| Error::Parse(format!("bad batch file {}: {}", path.display(), e)))
}
