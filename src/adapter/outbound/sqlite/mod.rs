//! SQLite persistence adapters.
//!
//! Market store and submission journal backed by one Diesel connection pool.

pub mod database;
pub mod journal;
pub mod store;

pub use journal::SqliteSubmissionJournal;
pub use store::SqliteMarketStore;
