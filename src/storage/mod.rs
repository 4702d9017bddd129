pub mod database;
pub mod state_store;

pub use database::{Database, SharedDatabase};
pub use state_store::{StateStore, now_timestamp, prompt_fingerprint};
