//! Encrypted local history of scoring events.

mod history;

pub use history::{load_or_create_secret, HistoryPage, HistoryRecord, HistoryStore};
