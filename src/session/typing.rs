use rand::Rng;
use rand::rngs::SmallRng;

use crate::clock::SharedClock;
use crate::config::TypingConfig;
use crate::content::PhrasePool;
use crate::engine::scoring::efficiency_score;
use crate::timer::Deadline;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeystrokeOutcome {
    Accepted,
    Completed { score: u8 },
    /// Not a prefix of the target, or a backspace. Input was cleared.
    Rejected,
    /// No target, or the phrase is already done.
    Ignored,
}

/// Strict-prefix typing drill. Input can only ever be a prefix of the
/// target; a wrong character wipes it, and backspace is never allowed.
pub struct TypingSession<R = SmallRng> {
    pool: PhrasePool,
    rng: R,
    clock: SharedClock,
    config: TypingConfig,
    target: String,
    input: String,
    total_keystrokes: u32,
    error_flash: Deadline,
    final_score: Option<u8>,
}

impl<R: Rng> TypingSession<R> {
    pub fn new(pool: PhrasePool, rng: R, clock: SharedClock, config: TypingConfig) -> Self {
        let mut session = Self {
            pool,
            rng,
            clock,
            config,
            target: String::new(),
            input: String::new(),
            total_keystrokes: 0,
            error_flash: Deadline::default(),
            final_score: None,
        };
        session.reroll();
        session
    }

    /// Pick a new target and start over. Returns false (and keeps the current
    /// target) when the pool is empty.
    pub fn reroll(&mut self) -> bool {
        let Some(phrase) = self.pool.pick(&mut self.rng) else {
            log::warn!("typing phrase pool is empty; keeping current target");
            return false;
        };
        self.target = phrase.to_string();
        self.retry();
        true
    }

    /// Same target, fresh attempt.
    pub fn retry(&mut self) {
        self.input.clear();
        self.total_keystrokes = 0;
        self.error_flash.cancel();
        self.final_score = None;
    }

    /// Feed the full new value of the input field.
    pub fn on_change(&mut self, new_value: &str) -> KeystrokeOutcome {
        if self.target.is_empty() || self.final_score.is_some() {
            return KeystrokeOutcome::Ignored;
        }
        self.total_keystrokes += 1;

        if !self.target.starts_with(new_value) {
            self.reject();
            return KeystrokeOutcome::Rejected;
        }

        self.input = new_value.to_string();
        if self.input == self.target {
            let score = efficiency_score(self.target.chars().count(), self.total_keystrokes);
            self.final_score = Some(score);
            log::info!(
                "typing complete: {} chars in {} keystrokes, score {score}",
                self.target.chars().count(),
                self.total_keystrokes
            );
            return KeystrokeOutcome::Completed { score };
        }
        KeystrokeOutcome::Accepted
    }

    pub fn type_char(&mut self, ch: char) -> KeystrokeOutcome {
        let mut next = self.input.clone();
        next.push(ch);
        self.on_change(&next)
    }

    /// Backspace never deletes; it costs a keystroke and wipes the input.
    pub fn on_backspace(&mut self) -> KeystrokeOutcome {
        if self.target.is_empty() || self.final_score.is_some() {
            return KeystrokeOutcome::Ignored;
        }
        self.total_keystrokes += 1;
        self.reject();
        KeystrokeOutcome::Rejected
    }

    fn reject(&mut self) {
        log::debug!("rejected keystroke #{}", self.total_keystrokes);
        self.input.clear();
        self.error_flash.arm(self.clock.now(), self.config.error_flash_ms);
    }

    /// Deliver due timers. Returns true when the error flash just ended.
    pub fn tick(&mut self) -> bool {
        self.error_flash.fire(self.clock.now())
    }

    pub fn is_error(&self) -> bool {
        self.error_flash.is_armed()
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn total_keystrokes(&self) -> u32 {
        self.total_keystrokes
    }

    pub fn final_score(&self) -> Option<u8> {
        self.final_score
    }

    pub fn is_complete(&self) -> bool {
        self.final_score.is_some()
    }

    /// Percent of the target typed so far, like the reader's progress.
    pub fn progress(&self) -> f64 {
        let total = self.target.chars().count();
        if total == 0 {
            return 0.0;
        }
        self.input.chars().count() as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{TimeZone, Utc};
    use rand::SeedableRng;
    use rand::rngs::mock::StepRng;

    fn clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap())
    }

    fn session(phrase: &str, clock: &ManualClock) -> TypingSession<StepRng> {
        TypingSession::new(
            PhrasePool::from(vec![phrase]),
            StepRng::new(0, 0),
            clock.shared(),
            TypingConfig::default(),
        )
    }

    fn type_all(s: &mut TypingSession<StepRng>, text: &str) -> KeystrokeOutcome {
        let mut last = KeystrokeOutcome::Ignored;
        for ch in text.chars() {
            last = s.type_char(ch);
        }
        last
    }

    #[test]
    fn test_perfect_run_scores_100() {
        let clock = clock();
        let mut s = session("cat", &clock);
        assert_eq!(s.type_char('c'), KeystrokeOutcome::Accepted);
        assert_eq!(s.type_char('a'), KeystrokeOutcome::Accepted);
        assert_eq!(s.type_char('t'), KeystrokeOutcome::Completed { score: 100 });
        assert_eq!(s.total_keystrokes(), 3);
        assert!(s.is_complete());
    }

    #[test]
    fn test_one_wrong_key_scores_75() {
        let clock = clock();
        let mut s = session("cat", &clock);
        assert_eq!(s.type_char('x'), KeystrokeOutcome::Rejected);
        assert_eq!(s.input(), "");
        assert_eq!(type_all(&mut s, "cat"), KeystrokeOutcome::Completed { score: 75 });
        assert_eq!(s.total_keystrokes(), 4);
    }

    #[test]
    fn test_wrong_key_mid_phrase_wipes_input() {
        let clock = clock();
        let mut s = session("hello", &clock);
        type_all(&mut s, "hel");
        assert_eq!(s.type_char('x'), KeystrokeOutcome::Rejected);
        assert_eq!(s.input(), "");
        // 4 spent so far, 5 more to finish: round(5/9*100) = 56
        assert_eq!(type_all(&mut s, "hello"), KeystrokeOutcome::Completed { score: 56 });
    }

    #[test]
    fn test_backspace_is_always_rejected() {
        let clock = clock();
        let mut s = session("cat", &clock);
        s.type_char('c');
        assert_eq!(s.on_backspace(), KeystrokeOutcome::Rejected);
        assert_eq!(s.input(), "");
        assert_eq!(s.total_keystrokes(), 2);
        assert!(s.is_error());
    }

    #[test]
    fn test_progress_is_percent_and_resets_on_error() {
        let clock = clock();
        let mut s = session("abcd", &clock);
        assert_eq!(s.progress(), 0.0);
        type_all(&mut s, "ab");
        assert!((s.progress() - 50.0).abs() < 1e-9);
        s.type_char('x');
        assert_eq!(s.progress(), 0.0);
        type_all(&mut s, "abcd");
        assert!((s.progress() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_on_change_accepts_pasted_prefix() {
        let clock = clock();
        let mut s = session("calm mind", &clock);
        assert_eq!(s.on_change("calm"), KeystrokeOutcome::Accepted);
        assert_eq!(s.input(), "calm");
        assert_eq!(s.total_keystrokes(), 1);
    }

    #[test]
    fn test_error_flash_clears_after_timeout() {
        let clock = clock();
        let mut s = session("cat", &clock);
        s.type_char('z');
        assert!(s.is_error());
        clock.advance_ms(299);
        assert!(!s.tick());
        assert!(s.is_error());
        clock.advance_ms(1);
        assert!(s.tick());
        assert!(!s.is_error());
    }

    #[test]
    fn test_second_error_extends_flash() {
        let clock = clock();
        let mut s = session("cat", &clock);
        s.type_char('z');
        clock.advance_ms(200);
        s.type_char('z');
        clock.advance_ms(200);
        assert!(!s.tick());
        assert!(s.is_error());
        clock.advance_ms(100);
        assert!(s.tick());
    }

    #[test]
    fn test_keystrokes_after_completion_are_ignored() {
        let clock = clock();
        let mut s = session("ok", &clock);
        type_all(&mut s, "ok");
        assert_eq!(s.type_char('!'), KeystrokeOutcome::Ignored);
        assert_eq!(s.on_backspace(), KeystrokeOutcome::Ignored);
        assert_eq!(s.total_keystrokes(), 2);
        assert_eq!(s.final_score(), Some(100));
    }

    #[test]
    fn test_retry_keeps_target() {
        let clock = clock();
        let mut s = session("cat", &clock);
        s.type_char('x');
        s.retry();
        assert_eq!(s.target(), "cat");
        assert_eq!(s.total_keystrokes(), 0);
        assert!(!s.is_error());
        assert_eq!(s.final_score(), None);
    }

    #[test]
    fn test_empty_pool_is_noop() {
        let clock = clock();
        let mut s = TypingSession::new(
            PhrasePool::default(),
            StepRng::new(0, 0),
            clock.shared(),
            TypingConfig::default(),
        );
        assert_eq!(s.target(), "");
        assert!(!s.reroll());
        assert_eq!(s.type_char('a'), KeystrokeOutcome::Ignored);
        assert_eq!(s.on_backspace(), KeystrokeOutcome::Ignored);
        assert_eq!(s.total_keystrokes(), 0);
    }

    #[test]
    fn test_reroll_resets_attempt() {
        let clock = clock();
        let pool = PhrasePool::from(vec!["alpha", "beta", "gamma"]);
        let mut s = TypingSession::new(
            pool.clone(),
            SmallRng::seed_from_u64(3),
            clock.shared(),
            TypingConfig::default(),
        );
        s.type_char('q');
        assert!(s.reroll());
        assert!(pool.phrases().iter().any(|p| p == s.target()));
        assert_eq!(s.total_keystrokes(), 0);
        assert_eq!(s.input(), "");
    }

    #[test]
    fn test_score_is_bounded_for_many_errors() {
        let clock = clock();
        let mut s = session("a", &clock);
        for _ in 0..500 {
            s.on_backspace();
        }
        match s.type_char('a') {
            KeystrokeOutcome::Completed { score } => assert_eq!(score, 0),
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[test]
    fn test_multibyte_target_length_in_chars() {
        let clock = clock();
        let mut s = session("café", &clock);
        assert_eq!(type_all(&mut s, "café"), KeystrokeOutcome::Completed { score: 100 });
    }
}
