use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::exercise::{ExerciseConfig, ExerciseKind, RepGate};
use crate::metrics::CONFIDENCE_FLOOR;
use crate::phase::{Phase, PhaseBand};
use crate::session::ExerciseSession;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
    #[error("{exercise}: phase {phase} is not produced by any band")]
    UndefinedPhase { exercise: String, phase: Phase },
    #[error("{exercise}: band {phase} needs enter > exit >= 0 (enter {enter}, exit {exit})")]
    Hysteresis {
        exercise: String,
        phase: Phase,
        enter: f32,
        exit: f32,
    },
    #[error("{exercise}: history capacity {capacity} cannot hold a {pattern}-phase pattern")]
    HistoryCapacity {
        exercise: String,
        capacity: usize,
        pattern: usize,
    },
    #[error("{exercise}: target sequence is empty")]
    EmptySequence { exercise: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepcountConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub coach: CoachConfig,
    /// Per-exercise overrides keyed by exercise id
    #[serde(default)]
    pub exercises: BTreeMap<String, ExerciseOverride>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Minimum landmark confidence for a joint to be used
    pub confidence_floor: f32,
    /// Samples averaged into the baseline for calibrated exercises
    pub calibration_window: usize,
    /// Record phase transitions instead of every classified frame
    pub collapse_repeats: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachConfig {
    pub enabled: bool,
    /// Minimum spacing between snapshots offered to the coach
    pub interval_secs: u64,
    pub queue_capacity: usize,
    /// Upper bound on waiting for the worker at shutdown
    pub shutdown_timeout_ms: u64,
}

/// Optional replacements for fields of a built-in exercise
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExerciseOverride {
    pub calibration_window: Option<usize>,
    pub history_capacity: Option<usize>,
    pub bands: Option<Vec<PhaseBand>>,
    pub rep_gate_percent: Option<f32>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            confidence_floor: CONFIDENCE_FLOOR,
            calibration_window: 30,
            collapse_repeats: true,
        }
    }
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: 10,
            queue_capacity: 2,
            shutdown_timeout_ms: 2000,
        }
    }
}

impl RepcountConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: RepcountConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    /// Environment variables are prefixed with REPCOUNT_
    /// Example: REPCOUNT_CONFIDENCE_FLOOR=0.6
    pub fn from_file_with_env<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. User config file (if exists)
    /// 3. Default config file
    /// 4. Built-in defaults (lowest priority)
    pub fn load_layered(
        default_path: Option<&Path>,
        user_path: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let mut config = RepcountConfig::default();

        if let Some(path) = default_path {
            if path.exists() {
                config = Self::from_file(path)?;
            }
        }

        if let Some(path) = user_path {
            if path.exists() {
                let user_config = Self::from_file(path)?;
                config = config.merge(user_config);
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Merge another config into this one (other takes priority).
    /// Exercise overrides are merged per exercise id.
    fn merge(mut self, other: RepcountConfig) -> Self {
        self.session = other.session;
        self.coach = other.coach;
        self.exercises.extend(other.exercises);
        self
    }

    /// Apply environment variable overrides
    pub(crate) fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        use std::env;

        // Session overrides
        if let Ok(val) = env::var("REPCOUNT_CONFIDENCE_FLOOR") {
            self.session.confidence_floor = val.parse().map_err(|_| {
                ConfigError::Validation("Invalid REPCOUNT_CONFIDENCE_FLOOR".to_string())
            })?;
        }
        if let Ok(val) = env::var("REPCOUNT_CALIBRATION_WINDOW") {
            self.session.calibration_window = val.parse().map_err(|_| {
                ConfigError::Validation("Invalid REPCOUNT_CALIBRATION_WINDOW".to_string())
            })?;
        }

        // Coach overrides
        if let Ok(val) = env::var("REPCOUNT_COACH_ENABLED") {
            self.coach.enabled = val.parse().map_err(|_| {
                ConfigError::Validation("Invalid REPCOUNT_COACH_ENABLED".to_string())
            })?;
        }
        if let Ok(val) = env::var("REPCOUNT_COACH_INTERVAL_SECS") {
            self.coach.interval_secs = val.parse().map_err(|_| {
                ConfigError::Validation("Invalid REPCOUNT_COACH_INTERVAL_SECS".to_string())
            })?;
        }
        if let Ok(val) = env::var("REPCOUNT_COACH_QUEUE_CAPACITY") {
            self.coach.queue_capacity = val.parse().map_err(|_| {
                ConfigError::Validation("Invalid REPCOUNT_COACH_QUEUE_CAPACITY".to_string())
            })?;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Session validation
        if !(0.0..=1.0).contains(&self.session.confidence_floor) {
            return Err(ConfigError::Validation(
                "session.confidence_floor must be in [0, 1]".to_string(),
            ));
        }
        if self.session.calibration_window == 0 {
            return Err(ConfigError::Validation(
                "session.calibration_window must be > 0".to_string(),
            ));
        }

        // Coach validation
        if self.coach.interval_secs == 0 {
            return Err(ConfigError::Validation(
                "coach.interval_secs must be > 0".to_string(),
            ));
        }
        if self.coach.queue_capacity == 0 {
            return Err(ConfigError::Validation(
                "coach.queue_capacity must be > 0".to_string(),
            ));
        }
        if self.coach.shutdown_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "coach.shutdown_timeout_ms must be > 0".to_string(),
            ));
        }

        // Every override must name a known exercise and still produce a
        // valid definition
        for id in self.exercises.keys() {
            let kind: ExerciseKind = id.parse()?;
            self.exercise(kind)?;
        }

        Ok(())
    }

    /// Resolve the definition of `kind` with session defaults and any
    /// override applied
    pub fn exercise(&self, kind: ExerciseKind) -> Result<ExerciseConfig, ConfigError> {
        let mut cfg = ExerciseConfig::builtin(kind);
        // Absolute-scale exercises keep their zero window
        if cfg.calibration_window > 0 {
            cfg.calibration_window = self.session.calibration_window;
        }

        if let Some(ov) = self.exercises.get(kind.id()) {
            if let Some(window) = ov.calibration_window {
                cfg.calibration_window = window;
            }
            if let Some(capacity) = ov.history_capacity {
                cfg.history_capacity = capacity;
            }
            if let Some(bands) = &ov.bands {
                cfg.bands = bands.clone();
            }
            if let Some(percent) = ov.rep_gate_percent {
                let cue = cfg
                    .rep_gate
                    .take()
                    .map(|g| g.cue)
                    .unwrap_or_else(|| "Rep not counted".to_string());
                cfg.rep_gate = Some(RepGate {
                    min_percent: percent,
                    cue,
                });
            }
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Build a ready-to-run session for `kind`
    pub fn session(&self, kind: ExerciseKind) -> Result<ExerciseSession, ConfigError> {
        ExerciseSession::new(self.exercise(kind)?, &self.session)
    }

    /// Export configuration to TOML string
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = self
            .to_toml_string()
            .map_err(|e| ConfigError::Validation(format!("TOML serialization error: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }
}
