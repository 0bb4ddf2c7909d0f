use chrono::{DateTime, Utc};

use crate::clock::{SharedClock, elapsed_ms};
use crate::config::{ReaderConfig, SkimPolicy};
use crate::engine::scoring::words_per_minute;
use crate::engine::segment::{segment, word_count};
use crate::error::SessionError;
use crate::session::result::{Penalty, ReadingResult};

// Floor for the session length when averaging, so an instant finish
// doesn't divide by zero.
const MIN_ELAPSED_MINUTES: f64 = 1.0 / 60_000.0;

#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    Advanced { index: usize },
    /// Skim under the blocking policy: still on the same sentence.
    Blocked,
    Completed(ReadingResult),
    /// Session already complete; nothing changed.
    Finished,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Advance {
    pub penalties: Vec<Penalty>,
    pub step: Step,
}

impl Advance {
    fn finished() -> Self {
        Self {
            penalties: Vec::new(),
            step: Step::Finished,
        }
    }
}

/// Paced sentence-by-sentence reading with speed and attention checks.
pub struct ReadingSession {
    source_id: String,
    sentences: Vec<String>,
    active_index: usize,
    started_at: DateTime<Utc>,
    last_advance_at: DateTime<Utc>,
    total_words_read: usize,
    score: u8,
    skimming_count: u32,
    distraction_count: u32,
    current_wpm: u32,
    result: Option<ReadingResult>,
    config: ReaderConfig,
    clock: SharedClock,
}

impl ReadingSession {
    pub fn start(
        text: &str,
        source_id: impl Into<String>,
        config: ReaderConfig,
        clock: SharedClock,
    ) -> Result<Self, SessionError> {
        let len = text.chars().count();
        if len > config.max_char_limit {
            return Err(SessionError::TextTooLong {
                len,
                limit: config.max_char_limit,
            });
        }
        if text.trim().is_empty() {
            return Err(SessionError::EmptyText);
        }

        let sentences = segment(text);
        let now = clock.now();
        let source_id = source_id.into();
        log::debug!(
            "reading session {source_id} started with {} sentences",
            sentences.len()
        );

        Ok(Self {
            source_id,
            sentences,
            active_index: 0,
            started_at: now,
            last_advance_at: now,
            total_words_read: 0,
            score: 100,
            skimming_count: 0,
            distraction_count: 0,
            current_wpm: 0,
            result: None,
            config,
            clock,
        })
    }

    pub fn advance(&mut self) -> Advance {
        if self.result.is_some() {
            return Advance::finished();
        }
        let Some(sentence) = self.sentences.get(self.active_index) else {
            return Advance::finished();
        };

        let now = self.clock.now();
        let words = word_count(sentence);
        let elapsed = elapsed_ms(self.last_advance_at, now);
        // The first sentence gets a free pass: there's no prior timestamp
        // the reader actually chose.
        let checked = self.active_index > 0;
        let mut penalties = Vec::new();

        if checked && elapsed > self.config.drift_threshold_ms {
            self.score = self.score.saturating_sub(self.config.drift_penalty);
            self.distraction_count += 1;
            log::warn!(
                "drift on sentence {} after {elapsed}ms",
                self.active_index
            );
            penalties.push(Penalty::Drift {
                elapsed_ms: elapsed,
            });
        }

        let mut blocked = false;
        if checked && words >= self.config.min_words_for_speed_check {
            // No elapsed time at all reads as infinitely fast.
            let wpm = words_per_minute(words, elapsed);
            match wpm {
                Some(w) if w <= self.config.speed_limit_wpm => {
                    self.current_wpm = w;
                    self.total_words_read += words;
                }
                _ => {
                    blocked = self.config.skim_policy == SkimPolicy::Block;
                    self.score = self.score.saturating_sub(self.config.skim_penalty);
                    self.skimming_count += 1;
                    log::warn!(
                        "skimming on sentence {} ({wpm:?} wpm)",
                        self.active_index
                    );
                    penalties.push(Penalty::Skim { wpm, blocked });
                }
            }
        } else {
            self.total_words_read += words;
        }

        if blocked {
            return Advance {
                penalties,
                step: Step::Blocked,
            };
        }

        let step = if self.active_index + 1 >= self.sentences.len() {
            let result = self.finish(now);
            Step::Completed(result)
        } else {
            self.active_index += 1;
            self.last_advance_at = now;
            Step::Advanced {
                index: self.active_index,
            }
        };
        Advance { penalties, step }
    }

    /// Step back one sentence. Penalties and skipped words stay as they are;
    /// only the sentence timer restarts.
    pub fn retreat(&mut self) -> bool {
        if self.result.is_some() || self.active_index == 0 {
            return false;
        }
        self.active_index -= 1;
        self.last_advance_at = self.clock.now();
        true
    }

    fn finish(&mut self, now: DateTime<Utc>) -> ReadingResult {
        let elapsed = elapsed_ms(self.started_at, now);
        let minutes = (elapsed as f64 / 60_000.0).max(MIN_ELAPSED_MINUTES);
        let average_wpm = (self.total_words_read as f64 / minutes).round() as u32;

        let result = ReadingResult {
            source_id: self.source_id.clone(),
            score: self.score,
            average_wpm,
            skimming_count: self.skimming_count,
            distraction_count: self.distraction_count,
            total_words_read: self.total_words_read,
            sentences: self.sentences.len(),
            elapsed_secs: elapsed as f64 / 1000.0,
            timestamp: now,
        };
        log::info!(
            "reading session {} complete: score {} at {} wpm",
            self.source_id,
            result.score,
            result.average_wpm
        );
        self.result = Some(result.clone());
        result
    }

    pub fn is_complete(&self) -> bool {
        self.result.is_some()
    }

    pub fn result(&self) -> Option<&ReadingResult> {
        self.result.as_ref()
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn sentences(&self) -> &[String] {
        &self.sentences
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn active_sentence(&self) -> Option<&str> {
        self.sentences.get(self.active_index).map(String::as_str)
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn current_wpm(&self) -> u32 {
        self.current_wpm
    }

    pub fn total_words_read(&self) -> usize {
        self.total_words_read
    }

    pub fn skimming_count(&self) -> u32 {
        self.skimming_count
    }

    pub fn distraction_count(&self) -> u32 {
        self.distraction_count
    }

    /// Percent of sentences reached, counting the active one.
    pub fn progress(&self) -> f64 {
        if self.sentences.is_empty() {
            return 0.0;
        }
        (self.active_index + 1) as f64 / self.sentences.len() as f64 * 100.0
    }
}
