pub mod json_store;
pub mod schema;
pub mod scoreboard;

pub use json_store::{JsonStore, KeyValueStore, MemoryStore};
pub use schema::{Exercise, ScoreState};
pub use scoreboard::{STORAGE_NAME, ScoreBoard};
