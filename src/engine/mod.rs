pub mod scoring;
pub mod segment;

pub use scoring::{efficiency_score, match_score};
pub use segment::segment;
