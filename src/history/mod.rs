pub mod sample;
pub mod store;

pub use sample::Sample;
pub use store::HistoryStore;
