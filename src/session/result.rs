use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a finished paced-reading session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReadingResult {
    pub source_id: String,
    pub score: u8,
    pub average_wpm: u32,
    pub skimming_count: u32,
    pub distraction_count: u32,
    pub total_words_read: usize,
    pub sentences: usize,
    pub elapsed_secs: f64,
    pub timestamp: DateTime<Utc>,
}

/// Score deductions applied while advancing. Neither one stops the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Penalty {
    /// Sentence left faster than the speed limit.
    Skim { wpm: Option<u32>, blocked: bool },
    /// Sentence held longer than the drift threshold.
    Drift { elapsed_ms: i64 },
}

impl Penalty {
    pub fn is_skim(&self) -> bool {
        matches!(self, Penalty::Skim { .. })
    }
}
