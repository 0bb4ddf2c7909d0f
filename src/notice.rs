use std::time::Duration;

use crate::error::SessionError;
use crate::session::result::ReadingResult;
use crate::store::schema::Exercise;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Named events for whatever renders feedback to the user.
#[derive(Clone, Debug, PartialEq)]
pub enum Notice {
    SessionStarted { source_id: String, sentences: usize },
    SessionRejected(SessionError),
    SkimWarning { wpm: Option<u32>, blocked: bool },
    DriftWarning { elapsed_ms: i64 },
    ReadingComplete(ReadingResult),
    InvalidKeystroke,
    TypingComplete { score: u8 },
    SpeechScored { score: u8 },
    CaptureUnavailable,
    PhrasePoolEmpty { exercise: Exercise },
    AttemptRecorded { exercise: Exercise, score: u8, rolling_average: u8 },
    DailyReset,
    StorageFailed { message: String },
}

impl Notice {
    pub fn level(&self) -> NoticeLevel {
        match self {
            Notice::SessionStarted { .. } | Notice::AttemptRecorded { .. } | Notice::DailyReset => {
                NoticeLevel::Info
            }
            Notice::ReadingComplete(_)
            | Notice::TypingComplete { .. }
            | Notice::SpeechScored { .. } => NoticeLevel::Success,
            Notice::SkimWarning { .. }
            | Notice::DriftWarning { .. }
            | Notice::InvalidKeystroke
            | Notice::CaptureUnavailable
            | Notice::PhrasePoolEmpty { .. } => NoticeLevel::Warning,
            Notice::SessionRejected(_) | Notice::StorageFailed { .. } => NoticeLevel::Error,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Notice::SessionStarted { sentences, .. } => {
                format!("Reading session initialized ({sentences} sentences)")
            }
            Notice::SessionRejected(e) => e.to_string(),
            Notice::SkimWarning { blocked: true, .. } => {
                "Too fast! Don't skim, read deeply.".to_string()
            }
            Notice::SkimWarning { .. } => "Too fast! Skimming costs points.".to_string(),
            Notice::DriftWarning { elapsed_ms } => {
                format!("Mind drifting? {}s on one sentence.", elapsed_ms / 1000)
            }
            Notice::ReadingComplete(r) => format!(
                "Session complete: score {}, {} wpm average",
                r.score, r.average_wpm
            ),
            Notice::InvalidKeystroke => "Wrong key. Start again from the top.".to_string(),
            Notice::TypingComplete { score } => format!("Phrase complete: efficiency {score}%"),
            Notice::SpeechScored { score } => format!("Match: {score}%"),
            Notice::CaptureUnavailable => "Speech capture is not available here.".to_string(),
            Notice::PhrasePoolEmpty { exercise } => format!("No phrases available for {exercise}"),
            Notice::AttemptRecorded {
                exercise,
                rolling_average,
                ..
            } => format!("{exercise} average is now {rolling_average}"),
            Notice::DailyReset => "New day: scores decayed, history cleared".to_string(),
            Notice::StorageFailed { message } => format!("Could not save scores: {message}"),
        }
    }
}

pub trait Notifier {
    fn notify(&mut self, notice: Notice);
}

/// Sends notices to the `log` facade at a matching level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, notice: Notice) {
        let message = notice.message();
        match notice.level() {
            NoticeLevel::Info | NoticeLevel::Success => log::info!("{message}"),
            NoticeLevel::Warning => log::warn!("{message}"),
            NoticeLevel::Error => log::error!("{message}"),
        }
    }
}

impl Notifier for Vec<Notice> {
    fn notify(&mut self, notice: Notice) {
        self.push(notice);
    }
}

/// Optional vibration on invalid input. Devices without it just don't
/// install one.
pub trait Haptics {
    fn vibrate(&mut self, duration: Duration);
}
