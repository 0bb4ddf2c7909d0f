use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

const SCHEMA_VERSION: u32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Exercise {
    FocusReader,
    VocalGym,
    ZenType,
}

impl Exercise {
    pub const ALL: [Exercise; 3] = [Exercise::FocusReader, Exercise::VocalGym, Exercise::ZenType];

    pub fn as_str(self) -> &'static str {
        match self {
            Exercise::FocusReader => "focusReader",
            Exercise::VocalGym => "vocalGym",
            Exercise::ZenType => "zenType",
        }
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per exercise, serialized with the exercise keys.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerExercise<T> {
    pub focus_reader: T,
    pub vocal_gym: T,
    pub zen_type: T,
}

impl<T> PerExercise<T> {
    pub fn get(&self, exercise: Exercise) -> &T {
        match exercise {
            Exercise::FocusReader => &self.focus_reader,
            Exercise::VocalGym => &self.vocal_gym,
            Exercise::ZenType => &self.zen_type,
        }
    }

    pub fn get_mut(&mut self, exercise: Exercise) -> &mut T {
        match exercise {
            Exercise::FocusReader => &mut self.focus_reader,
            Exercise::VocalGym => &mut self.vocal_gym,
            Exercise::ZenType => &mut self.zen_type,
        }
    }
}

/// Everything the score board persists, as one document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreState {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Rolling average per exercise.
    pub scores: PerExercise<u8>,
    /// Attempts since the last daily reset, oldest first.
    pub history: PerExercise<Vec<u8>>,
    pub last_active_date: NaiveDate,
    #[serde(default)]
    pub initial_attempt: bool,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl ScoreState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            scores: PerExercise::default(),
            history: PerExercise::default(),
            last_active_date: today,
            initial_attempt: false,
        }
    }

    /// Check if loaded data has a stale schema version and needs reset.
    pub fn needs_reset(&self) -> bool {
        self.schema_version != SCHEMA_VERSION
    }
}

pub const EXPORT_VERSION: u32 = 1;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportData {
    pub focus_dojo_export_version: u32,
    pub exported_at: DateTime<Utc>,
    pub state: ScoreState,
}
