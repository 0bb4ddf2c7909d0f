pub mod reader;
pub mod result;
pub mod speech;
pub mod typing;

pub use reader::{Advance, ReadingSession, Step};
pub use result::{Penalty, ReadingResult};
pub use speech::{CaptureDevice, DrillPhase, SpeechDrill, ToggleOutcome};
pub use typing::{KeystrokeOutcome, TypingSession};
