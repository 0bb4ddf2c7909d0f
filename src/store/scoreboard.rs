use anyhow::{Result, bail};
use chrono::NaiveDate;

use crate::clock::SharedClock;
use crate::config::{RecoveryFormula, ScoringConfig};
use crate::store::json_store::KeyValueStore;
use crate::store::schema::{EXPORT_VERSION, Exercise, ExportData, ScoreState};

/// Key the whole score document is stored under.
pub const STORAGE_NAME: &str = "focus-dojo-storage";

/// Attempts after which an exercise counts at full weight.
const FULL_CONFIDENCE_ATTEMPTS: usize = 4;

/// Rolling per-exercise averages and the composite recovery score.
///
/// Every mutation is written back to the backing store before returning.
/// If that write fails the in-memory state has still changed and the error
/// is handed to the caller.
pub struct ScoreBoard {
    state: ScoreState,
    backend: Box<dyn KeyValueStore>,
    clock: SharedClock,
    config: ScoringConfig,
}

impl ScoreBoard {
    /// Load persisted state, starting fresh when there is none or it can't
    /// be read.
    pub fn load(backend: Box<dyn KeyValueStore>, clock: SharedClock, config: ScoringConfig) -> Self {
        let fresh = || ScoreState::new(clock.today());
        let state = match backend.get(STORAGE_NAME) {
            Ok(Some(raw)) => match serde_json::from_str::<ScoreState>(&raw) {
                Ok(state) if !state.needs_reset() => state,
                Ok(state) => {
                    log::warn!(
                        "score schema version {} is stale; starting fresh",
                        state.schema_version
                    );
                    fresh()
                }
                Err(e) => {
                    log::warn!("stored scores are unreadable ({e}); starting fresh");
                    fresh()
                }
            },
            Ok(None) => fresh(),
            Err(e) => {
                log::warn!("could not read stored scores ({e:#}); starting fresh");
                fresh()
            }
        };

        Self {
            state,
            backend,
            clock,
            config,
        }
    }

    /// Record an attempt and return the new rolling average for it.
    pub fn add_attempt(&mut self, exercise: Exercise, score: u8) -> Result<u8> {
        if score > 100 {
            log::warn!("{exercise} score {score} above 100, clamping");
        }
        let score = score.min(100);

        let history = self.state.history.get_mut(exercise);
        history.push(score);
        let recent = &history[history.len().saturating_sub(self.config.rolling_window)..];
        let sum: u32 = recent.iter().map(|&s| u32::from(s)).sum();
        let average = (f64::from(sum) / recent.len() as f64).round() as u8;
        *self.state.scores.get_mut(exercise) = average;

        log::info!("{exercise} attempt {score}, rolling average now {average}");
        self.persist()?;
        Ok(average)
    }

    /// On the first call of a new calendar day, decay every average and
    /// clear the day's history. Returns true when a reset happened.
    pub fn check_daily_reset(&mut self) -> Result<bool> {
        let today = self.clock.today();
        if self.state.last_active_date == today {
            return Ok(false);
        }

        let factor = self.config.decay_factor;
        for exercise in Exercise::ALL {
            let average = self.state.scores.get_mut(exercise);
            *average = (f64::from(*average) * factor).round().clamp(0.0, 100.0) as u8;
            self.state.history.get_mut(exercise).clear();
        }
        log::info!(
            "daily reset {} -> {today}: averages decayed by {factor}",
            self.state.last_active_date
        );
        self.state.last_active_date = today;
        self.persist()?;
        Ok(true)
    }

    pub fn recovery_score(&self) -> u8 {
        let weights = [
            (Exercise::FocusReader, self.config.focus_reader_weight),
            (Exercise::VocalGym, self.config.vocal_gym_weight),
            (Exercise::ZenType, self.config.zen_type_weight),
        ];
        let total: f64 = weights
            .iter()
            .map(|&(exercise, weight)| {
                weight * f64::from(self.rolling_average(exercise)) * self.confidence(exercise)
            })
            .sum();
        total.round().clamp(0.0, 100.0) as u8
    }

    /// Multiplier for an exercise's term in the recovery score.
    pub fn confidence(&self, exercise: Exercise) -> f64 {
        match self.config.recovery_formula {
            RecoveryFormula::Flat => 1.0,
            RecoveryFormula::ConfidenceRamped => {
                let attempts = self.attempts_today(exercise);
                if attempts == 0 {
                    0.0
                } else {
                    let ramp = attempts.min(FULL_CONFIDENCE_ATTEMPTS) as f64
                        / FULL_CONFIDENCE_ATTEMPTS as f64;
                    0.6 + 0.4 * ramp
                }
            }
        }
    }

    /// History only holds the current day once the daily reset has run, so
    /// a stale date means nothing was attempted today yet.
    pub fn attempts_today(&self, exercise: Exercise) -> usize {
        if self.state.last_active_date != self.clock.today() {
            return 0;
        }
        self.state.history.get(exercise).len()
    }

    pub fn set_initial_attempt(&mut self, value: bool) -> Result<()> {
        self.state.initial_attempt = value;
        self.persist()
    }

    pub fn initial_attempt(&self) -> bool {
        self.state.initial_attempt
    }

    pub fn rolling_average(&self, exercise: Exercise) -> u8 {
        *self.state.scores.get(exercise)
    }

    pub fn history(&self, exercise: Exercise) -> &[u8] {
        self.state.history.get(exercise)
    }

    pub fn last_active_date(&self) -> NaiveDate {
        self.state.last_active_date
    }

    pub fn state(&self) -> &ScoreState {
        &self.state
    }

    pub fn export(&self) -> ExportData {
        ExportData {
            focus_dojo_export_version: EXPORT_VERSION,
            exported_at: self.clock.now(),
            state: self.state.clone(),
        }
    }

    pub fn import(&mut self, data: ExportData) -> Result<()> {
        if data.focus_dojo_export_version != EXPORT_VERSION {
            bail!(
                "Unsupported export version: {} (expected {})",
                data.focus_dojo_export_version,
                EXPORT_VERSION
            );
        }
        if data.state.needs_reset() {
            bail!(
                "Unsupported score schema version: {}",
                data.state.schema_version
            );
        }
        self.state = data.state;
        self.persist()
    }

    fn persist(&mut self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.state)?;
        self.backend.set(STORAGE_NAME, &json)
    }
}
