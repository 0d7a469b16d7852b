pub mod selector;

pub use selector::WatchlistSelector;
