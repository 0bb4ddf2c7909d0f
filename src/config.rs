use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::content;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub reader: ReaderConfig,
    #[serde(default)]
    pub typing: TypingConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

fn default_language() -> String {
    "en".to_string()
}

/// What happens to a sentence advanced faster than the speed limit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkimPolicy {
    /// Deduct, warn, and move on anyway.
    #[default]
    Penalize,
    /// Deduct, warn, and stay on the sentence.
    Block,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryFormula {
    Flat,
    /// Each exercise term is scaled by how many attempts were made today.
    #[default]
    ConfidenceRamped,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub max_char_limit: usize,
    pub speed_limit_wpm: u32,
    pub min_words_for_speed_check: usize,
    pub drift_threshold_ms: i64,
    pub skim_penalty: u8,
    pub drift_penalty: u8,
    pub skim_policy: SkimPolicy,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_char_limit: 50_000,
            speed_limit_wpm: 650,
            min_words_for_speed_check: 3,
            drift_threshold_ms: 20_000,
            skim_penalty: 10,
            drift_penalty: 5,
            skim_policy: SkimPolicy::Penalize,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TypingConfig {
    pub error_flash_ms: u64,
    pub haptic_ms: u64,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            error_flash_ms: 300,
            haptic_ms: 200,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub silence_timeout_ms: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            silence_timeout_ms: 1500,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub rolling_window: usize,
    pub decay_factor: f64,
    pub recovery_formula: RecoveryFormula,
    pub focus_reader_weight: f64,
    pub vocal_gym_weight: f64,
    pub zen_type_weight: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            rolling_window: 5,
            decay_factor: 0.8,
            recovery_formula: RecoveryFormula::ConfidenceRamped,
            focus_reader_weight: 0.4,
            vocal_gym_weight: 0.3,
            zen_type_weight: 0.3,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: default_language(),
            data_dir: None,
            reader: ReaderConfig::default(),
            typing: TypingConfig::default(),
            speech: SpeechConfig::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.validate(&content::available_languages());
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Write to the default location and return where it went.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path();
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("focus-dojo")
            .join("config.toml")
    }

    /// Clamp values a hand-edited file could push out of range.
    pub fn validate(&mut self, valid_languages: &[String]) {
        if !valid_languages.iter().any(|l| l == &self.language) {
            self.language = default_language();
        }

        let reader = &mut self.reader;
        reader.max_char_limit = reader.max_char_limit.max(1);
        reader.speed_limit_wpm = reader.speed_limit_wpm.max(1);
        reader.min_words_for_speed_check = reader.min_words_for_speed_check.max(1);
        reader.drift_threshold_ms = reader.drift_threshold_ms.max(1);
        reader.skim_penalty = reader.skim_penalty.min(100);
        reader.drift_penalty = reader.drift_penalty.min(100);

        let scoring = &mut self.scoring;
        scoring.rolling_window = scoring.rolling_window.max(1);
        if !scoring.decay_factor.is_finite() {
            scoring.decay_factor = ScoringConfig::default().decay_factor;
        }
        scoring.decay_factor = scoring.decay_factor.clamp(0.0, 1.0);
        for weight in [
            &mut scoring.focus_reader_weight,
            &mut scoring.vocal_gym_weight,
            &mut scoring.zen_type_weight,
        ] {
            if !weight.is_finite() || *weight < 0.0 {
                *weight = 0.0;
            }
        }
    }
}
