use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

use crate::clock::SharedClock;
use crate::config::Config;
use crate::content::Content;
use crate::error::SessionError;
use crate::notice::{Haptics, LogNotifier, Notice, Notifier};
use crate::session::reader::{Advance, ReadingSession, Step};
use crate::session::result::{Penalty, ReadingResult};
use crate::session::speech::{CaptureDevice, SpeechDrill, ToggleOutcome};
use crate::session::typing::{KeystrokeOutcome, TypingSession};
use crate::store::schema::Exercise;
use crate::store::scoreboard::ScoreBoard;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DojoScreen {
    Reader,
    Typing,
    Scores,
}

impl DojoScreen {
    pub fn next(self) -> Self {
        match self {
            DojoScreen::Reader => DojoScreen::Typing,
            DojoScreen::Typing => DojoScreen::Scores,
            DojoScreen::Scores => DojoScreen::Reader,
        }
    }
}

/// Owns the three exercises and the score board, and routes every finished
/// attempt into the board.
pub struct Dojo {
    pub screen: DojoScreen,
    pub should_quit: bool,
    pub config: Config,
    pub scoreboard: ScoreBoard,
    pub reader: Option<ReadingSession>,
    pub last_reading: Option<ReadingResult>,
    pub typing: TypingSession,
    pub speech: SpeechDrill,
    clock: SharedClock,
    notifier: Box<dyn Notifier>,
    haptics: Option<Box<dyn Haptics>>,
}

impl Dojo {
    pub fn new(
        config: Config,
        content: Content,
        scoreboard: ScoreBoard,
        clock: SharedClock,
        mut rng: SmallRng,
    ) -> Self {
        let typing = TypingSession::new(
            content.zen_quotes,
            SmallRng::seed_from_u64(rng.next_u64()),
            clock.clone(),
            config.typing.clone(),
        );
        let speech = SpeechDrill::new(
            content.drills,
            content.fallback_drill,
            SmallRng::seed_from_u64(rng.next_u64()),
            clock.clone(),
            config.speech.clone(),
            None,
        );

        let mut dojo = Self {
            screen: DojoScreen::Reader,
            should_quit: false,
            config,
            scoreboard,
            reader: None,
            last_reading: None,
            typing,
            speech,
            clock,
            notifier: Box::new(LogNotifier),
            haptics: None,
        };
        dojo.check_daily_reset();
        dojo
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_haptics(mut self, haptics: Box<dyn Haptics>) -> Self {
        self.haptics = Some(haptics);
        self
    }

    pub fn with_capture(mut self, capture: Box<dyn CaptureDevice>) -> Self {
        self.speech.set_capture(Some(capture));
        self
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    // --- Reader ---

    /// Replace the current reading session. On rejection the previous
    /// session, if any, is left as it was.
    pub fn start_reading(&mut self, text: &str, source_id: &str) -> Result<(), SessionError> {
        match ReadingSession::start(
            text,
            source_id,
            self.config.reader.clone(),
            self.clock.clone(),
        ) {
            Ok(session) => {
                self.notify(Notice::SessionStarted {
                    source_id: source_id.to_string(),
                    sentences: session.sentences().len(),
                });
                self.reader = Some(session);
                self.screen = DojoScreen::Reader;
                Ok(())
            }
            Err(e) => {
                self.notify(Notice::SessionRejected(e.clone()));
                Err(e)
            }
        }
    }

    pub fn advance_reading(&mut self) -> Option<Advance> {
        let advance = self.reader.as_mut()?.advance();

        for penalty in &advance.penalties {
            let notice = match *penalty {
                Penalty::Skim { wpm, blocked } => Notice::SkimWarning { wpm, blocked },
                Penalty::Drift { elapsed_ms } => Notice::DriftWarning { elapsed_ms },
            };
            self.notify(notice);
        }

        if let Step::Completed(result) = &advance.step {
            let result = result.clone();
            self.record(Exercise::FocusReader, result.score);
            self.notify(Notice::ReadingComplete(result.clone()));
            self.last_reading = Some(result);
        }
        Some(advance)
    }

    pub fn retreat_reading(&mut self) -> bool {
        self.reader.as_mut().is_some_and(|r| r.retreat())
    }

    // --- Typing ---

    pub fn type_char(&mut self, ch: char) -> KeystrokeOutcome {
        let outcome = self.typing.type_char(ch);
        self.on_keystroke(outcome)
    }

    /// Whole-value input, for front ends that report the text field instead
    /// of single keys.
    pub fn type_change(&mut self, value: &str) -> KeystrokeOutcome {
        let outcome = self.typing.on_change(value);
        self.on_keystroke(outcome)
    }

    pub fn type_backspace(&mut self) -> KeystrokeOutcome {
        let outcome = self.typing.on_backspace();
        self.on_keystroke(outcome)
    }

    pub fn reroll_typing(&mut self) -> bool {
        let rerolled = self.typing.reroll();
        if !rerolled {
            self.notify(Notice::PhrasePoolEmpty {
                exercise: Exercise::ZenType,
            });
        }
        rerolled
    }

    pub fn retry_typing(&mut self) {
        self.typing.retry();
    }

    fn on_keystroke(&mut self, outcome: KeystrokeOutcome) -> KeystrokeOutcome {
        match outcome {
            KeystrokeOutcome::Rejected => {
                self.notify(Notice::InvalidKeystroke);
                let duration = Duration::from_millis(self.config.typing.haptic_ms);
                if let Some(haptics) = self.haptics.as_mut() {
                    haptics.vibrate(duration);
                }
            }
            KeystrokeOutcome::Completed { score } => {
                self.record(Exercise::ZenType, score);
                self.notify(Notice::TypingComplete { score });
            }
            KeystrokeOutcome::Accepted | KeystrokeOutcome::Ignored => {}
        }
        outcome
    }

    // --- Speech ---

    pub fn toggle_speech(&mut self) -> ToggleOutcome {
        let outcome = self.speech.toggle();
        match outcome {
            ToggleOutcome::Unavailable => self.notify(Notice::CaptureUnavailable),
            ToggleOutcome::Stopped { score: Some(score) } => self.on_speech_scored(score),
            ToggleOutcome::Started | ToggleOutcome::Stopped { score: None } => {}
        }
        outcome
    }

    pub fn speech_transcript(&mut self, transcript: &str) -> bool {
        self.speech.on_transcript(transcript)
    }

    /// The capture source ended on its own.
    pub fn speech_capture_ended(&mut self) -> Option<u8> {
        let score = self.speech.on_capture_end();
        if let Some(score) = score {
            self.on_speech_scored(score);
        }
        score
    }

    pub fn reroll_speech(&mut self) -> bool {
        let rerolled = self.speech.reroll();
        if !rerolled {
            self.notify(Notice::PhrasePoolEmpty {
                exercise: Exercise::VocalGym,
            });
        }
        rerolled
    }

    pub fn retry_speech(&mut self) {
        self.speech.retry();
    }

    fn on_speech_scored(&mut self, score: u8) {
        self.record(Exercise::VocalGym, score);
        self.notify(Notice::SpeechScored { score });
    }

    // --- Shared ---

    /// Fire whichever deadlines are due.
    pub fn tick(&mut self) {
        self.typing.tick();
        if let Some(score) = self.speech.tick() {
            self.on_speech_scored(score);
        }
    }

    pub fn recovery_score(&self) -> u8 {
        self.scoreboard.recovery_score()
    }

    pub fn check_daily_reset(&mut self) -> bool {
        match self.scoreboard.check_daily_reset() {
            Ok(true) => {
                self.notify(Notice::DailyReset);
                true
            }
            Ok(false) => false,
            Err(e) => {
                // The decay still happened in memory.
                self.notify(Notice::DailyReset);
                self.storage_failed(e);
                true
            }
        }
    }

    pub fn set_initial_attempt(&mut self, value: bool) {
        if let Err(e) = self.scoreboard.set_initial_attempt(value) {
            self.storage_failed(e);
        }
    }

    fn record(&mut self, exercise: Exercise, score: u8) {
        self.check_daily_reset();
        match self.scoreboard.add_attempt(exercise, score) {
            Ok(rolling_average) => self.notify(Notice::AttemptRecorded {
                exercise,
                score,
                rolling_average,
            }),
            Err(e) => self.storage_failed(e),
        }
    }

    fn storage_failed(&mut self, e: anyhow::Error) {
        log::error!("score storage failed: {e:#}");
        self.notify(Notice::StorageFailed {
            message: format!("{e:#}"),
        });
    }

    fn notify(&mut self, notice: Notice) {
        self.notifier.notify(notice);
    }
}
