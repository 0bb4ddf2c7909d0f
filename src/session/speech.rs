use rand::Rng;
use rand::rngs::SmallRng;

use crate::clock::SharedClock;
use crate::config::SpeechConfig;
use crate::content::PhrasePool;
use crate::engine::scoring::match_score;
use crate::error::CaptureError;
use crate::timer::Deadline;

/// Speech-to-text source. The drill only starts and stops it; transcripts
/// arrive separately through [`SpeechDrill::on_transcript`].
pub trait CaptureDevice {
    fn start(&mut self) -> Result<(), CaptureError>;
    fn stop(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrillPhase {
    Idle,
    Listening,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// No capture on this platform, or it refused to start.
    Unavailable,
    Started,
    /// Capture stopped; carries the score when there was something to score.
    Stopped { score: Option<u8> },
}

/// Say-the-phrase drill: listen until the speaker goes quiet, then score the
/// transcript against the target.
pub struct SpeechDrill<R = SmallRng> {
    pool: PhrasePool,
    fallback_phrase: Option<String>,
    rng: R,
    clock: SharedClock,
    config: SpeechConfig,
    capture: Option<Box<dyn CaptureDevice>>,
    phase: DrillPhase,
    target: String,
    transcript: String,
    score: Option<u8>,
    silence: Deadline,
}

impl<R: Rng> SpeechDrill<R> {
    pub fn new(
        pool: PhrasePool,
        fallback_phrase: Option<String>,
        rng: R,
        clock: SharedClock,
        config: SpeechConfig,
        capture: Option<Box<dyn CaptureDevice>>,
    ) -> Self {
        let target = fallback_phrase.clone().unwrap_or_default();
        let mut drill = Self {
            pool,
            fallback_phrase,
            rng,
            clock,
            config,
            capture,
            phase: DrillPhase::Idle,
            target,
            transcript: String::new(),
            score: None,
            silence: Deadline::default(),
        };
        drill.reroll();
        drill
    }

    pub fn is_available(&self) -> bool {
        self.capture.is_some()
    }

    /// Swap the capture source. A drill listening on the old one is stopped
    /// without scoring.
    pub fn set_capture(&mut self, capture: Option<Box<dyn CaptureDevice>>) {
        if self.phase == DrillPhase::Listening {
            if let Some(old) = self.capture.as_mut() {
                old.stop();
            }
            self.phase = DrillPhase::Idle;
            self.silence.cancel();
        }
        self.capture = capture;
    }

    /// Start listening from Idle, or stop and score from Listening.
    pub fn toggle(&mut self) -> ToggleOutcome {
        let Some(capture) = self.capture.as_mut() else {
            return ToggleOutcome::Unavailable;
        };

        match self.phase {
            DrillPhase::Listening => {
                capture.stop();
                let score = self.finalize();
                ToggleOutcome::Stopped { score }
            }
            DrillPhase::Idle => {
                if let Err(e) = capture.start() {
                    log::warn!("speech capture unavailable: {e}");
                    return ToggleOutcome::Unavailable;
                }
                self.transcript.clear();
                self.score = None;
                self.silence.cancel();
                self.phase = DrillPhase::Listening;
                log::debug!("listening for {:?}", self.target);
                ToggleOutcome::Started
            }
        }
    }

    /// Latest full transcript from the capture. Each update restarts the
    /// silence timer. Ignored unless listening.
    pub fn on_transcript(&mut self, transcript: &str) -> bool {
        if self.phase != DrillPhase::Listening {
            return false;
        }
        self.transcript = transcript.to_string();
        self.silence.arm(self.clock.now(), self.config.silence_timeout_ms);
        true
    }

    /// The capture stopped on its own.
    pub fn on_capture_end(&mut self) -> Option<u8> {
        if self.phase != DrillPhase::Listening {
            return None;
        }
        self.finalize()
    }

    /// Deliver due timers. Returns the score when silence ended the attempt.
    pub fn tick(&mut self) -> Option<u8> {
        if self.phase != DrillPhase::Listening || !self.silence.fire(self.clock.now()) {
            return None;
        }
        log::debug!("silence timeout, stopping capture");
        if let Some(capture) = self.capture.as_mut() {
            capture.stop();
        }
        self.finalize()
    }

    fn finalize(&mut self) -> Option<u8> {
        self.phase = DrillPhase::Idle;
        self.silence.cancel();
        if self.transcript.is_empty() || self.score.is_some() {
            return None;
        }
        let score = match_score(&self.target, &self.transcript);
        log::info!("speech attempt scored {score}");
        self.score = Some(score);
        Some(score)
    }

    /// New random phrase; clears the transcript and score but leaves capture
    /// alone. Returns false when the pool is empty.
    pub fn reroll(&mut self) -> bool {
        let Some(phrase) = self.pool.pick(&mut self.rng) else {
            log::warn!("speech phrase pool is empty; keeping {:?}", self.fallback_phrase);
            return false;
        };
        self.target = phrase.to_string();
        self.retry();
        true
    }

    pub fn retry(&mut self) {
        self.transcript.clear();
        self.score = None;
    }

    pub fn phase(&self) -> DrillPhase {
        self.phase
    }

    pub fn is_listening(&self) -> bool {
        self.phase == DrillPhase::Listening
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn score(&self) -> Option<u8> {
        self.score
    }
}

impl<R> Drop for SpeechDrill<R> {
    fn drop(&mut self) {
        self.silence.cancel();
        if self.phase == DrillPhase::Listening {
            if let Some(capture) = self.capture.as_mut() {
                capture.stop();
            }
        }
    }
}
