pub mod collector;
pub mod config;
pub mod error;
pub mod export;
pub mod history;
pub mod snapshot;
pub mod trends;
pub mod watchlist;

pub use config::Config;
pub use error::{Error, Result};
pub use snapshot::SnapshotRun;
