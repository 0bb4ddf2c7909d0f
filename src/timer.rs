use chrono::{DateTime, Duration, Utc};

/// A one-shot scheduled action owned by a session. Arming again replaces the
/// pending deadline; a cancelled or fired deadline never fires again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Deadline {
    due: Option<DateTime<Utc>>,
}

impl Deadline {
    pub fn arm(&mut self, now: DateTime<Utc>, after_ms: u64) {
        let after = Duration::milliseconds(i64::try_from(after_ms).unwrap_or(i64::MAX / 2));
        self.due = Some(now + after);
    }

    pub fn cancel(&mut self) {
        self.due = None;
    }

    pub fn is_armed(&self) -> bool {
        self.due.is_some()
    }

    /// Returns true exactly once when `now` has reached the deadline.
    pub fn fire(&mut self, now: DateTime<Utc>) -> bool {
        match self.due {
            Some(due) if now >= due => {
                self.due = None;
                true
            }
            _ => false,
        }
    }
}
