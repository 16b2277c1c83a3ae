//! Configuration management
//!
//! One TOML-loadable configuration shared by the organizer, the preprocessor
//! and the trainer. Defaults reproduce the fixed recording layout and seeds.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::data::ShufflePolicy;
use crate::error::{ClassifierError, Result};

/// Lines of header at the top of every recording
pub const HEADER_LINES: usize = 4;
/// Data lines skipped between the header and the window
pub const SKIP_LINES: usize = 768;
/// Samples per window (model input size)
pub const WINDOW_LEN: usize = 512;
/// Seed used when none is configured
pub const DEFAULT_SEED: u64 = 1;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub layout: RecordingLayout,
    pub organizer: OrganizerConfig,
    pub training: TrainingConfig,
}

/// Physical layout of a recording file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingLayout {
    pub header_lines: usize,
    pub skip_lines: usize,
    pub window_len: usize,
}

impl Default for RecordingLayout {
    fn default() -> Self {
        Self {
            header_lines: HEADER_LINES,
            skip_lines: SKIP_LINES,
            window_len: WINDOW_LEN,
        }
    }
}

impl RecordingLayout {
    /// Zero-based index of the first window line
    pub fn window_start(&self) -> usize {
        self.header_lines + self.skip_lines
    }

    /// Minimum number of lines a well-formed recording has
    pub fn min_lines(&self) -> usize {
        self.window_start() + self.window_len
    }
}

/// Split assignment settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizerConfig {
    pub seed: u64,
    /// Draws below this go to testing
    pub testing_threshold: f64,
    /// Draws below this (and not testing) go to validation
    pub validation_threshold: f64,
}

impl Default for OrganizerConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            testing_threshold: 0.05,
            validation_threshold: 0.2,
        }
    }
}

/// Optimizer selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    Sgd,
    Adam,
}

/// Training-related configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Hidden layer widths (ReLU); the output layer is always softmax over the classes
    pub hidden_layers: Vec<usize>,
    pub optimizer: OptimizerKind,
    pub learning_rate: f64,
    /// Only used by SGD
    pub momentum: f64,
    pub epochs: usize,
    pub batch_size: usize,
    /// Seeds weight initialisation and dataset shuffling
    pub seed: u64,
    pub shuffle: ShufflePolicy,
    /// Skip malformed recordings with a warning instead of aborting
    pub skip_invalid: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Preset::Baseline.training_config()
    }
}

/// Named training variants that share the same preprocessing pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Dense 256/512/512, plain SGD at 0.01, batch 1, 50 epochs
    Baseline,
    /// Baseline network with SGD momentum 0.9
    Momentum,
    /// Baseline network with Adam and mini-batches of 16
    Adam,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Baseline, Preset::Momentum, Preset::Adam];

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Baseline => "baseline",
            Preset::Momentum => "momentum",
            Preset::Adam => "adam",
        }
    }

    pub fn training_config(&self) -> TrainingConfig {
        let baseline = TrainingConfig {
            hidden_layers: vec![256, 512, 512],
            optimizer: OptimizerKind::Sgd,
            learning_rate: 0.01,
            momentum: 0.0,
            epochs: 50,
            batch_size: 1,
            seed: DEFAULT_SEED,
            shuffle: ShufflePolicy::Fresh,
            skip_invalid: true,
        };

        match self {
            Preset::Baseline => baseline,
            Preset::Momentum => TrainingConfig {
                momentum: 0.9,
                ..baseline
            },
            Preset::Adam => TrainingConfig {
                optimizer: OptimizerKind::Adam,
                learning_rate: 0.001,
                batch_size: 16,
                ..baseline
            },
        }
    }
}

impl FromStr for Preset {
    type Err = ClassifierError;

    fn from_str(s: &str) -> Result<Self> {
        Preset::ALL
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ClassifierError::Config(format!("unknown preset '{}'", s)))
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default configuration with the training section taken from a preset
    pub fn with_preset(preset: Preset) -> Self {
        Self {
            training: preset.training_config(),
            ..Self::default()
        }
    }

    /// Load configuration from TOML file
    pub fn from_toml(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ClassifierError::io(path, e))?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_toml(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ClassifierError::io(path, e))?;
        Ok(())
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if self.layout.window_len == 0 {
            return Err(ClassifierError::Config("window_len must be > 0".into()));
        }

        let o = &self.organizer;
        if !(0.0..=1.0).contains(&o.testing_threshold)
            || !(0.0..=1.0).contains(&o.validation_threshold)
            || o.testing_threshold > o.validation_threshold
        {
            return Err(ClassifierError::Config(format!(
                "split thresholds must satisfy 0 <= testing ({}) <= validation ({}) <= 1",
                o.testing_threshold, o.validation_threshold
            )));
        }

        let t = &self.training;
        if t.epochs == 0 || t.batch_size == 0 {
            return Err(ClassifierError::Config(
                "epochs and batch_size must be > 0".into(),
            ));
        }
        if t.hidden_layers.iter().any(|&w| w == 0) {
            return Err(ClassifierError::Config("hidden layer width 0".into()));
        }
        if t.learning_rate <= 0.0 {
            return Err(ClassifierError::Config("learning_rate must be > 0".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let layout = RecordingLayout::default();
        assert_eq!(layout.window_start(), 772);
        assert_eq!(layout.min_lines(), 1284);
    }

    #[test]
    fn test_presets_differ_only_in_optimisation() {
        let base = Preset::Baseline.training_config();
        let momentum = Preset::Momentum.training_config();
        let adam = Preset::Adam.training_config();

        assert_eq!(base.hidden_layers, momentum.hidden_layers);
        assert_eq!(base.hidden_layers, adam.hidden_layers);
        assert_eq!(momentum.momentum, 0.9);
        assert_eq!(adam.optimizer, OptimizerKind::Adam);
        assert_eq!(base.epochs, 50);
        assert_eq!(base.batch_size, 1);
    }

    #[test]
    fn test_preset_from_str() {
        assert_eq!("ADAM".parse::<Preset>().unwrap(), Preset::Adam);
        assert!("resnet".parse::<Preset>().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_thresholds() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.organizer.testing_threshold = 0.5;
        config.organizer.validation_threshold = 0.2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::with_preset(Preset::Adam);
        config.training.epochs = 3;
        config.save_toml(&path).unwrap();

        let loaded = Config::from_toml(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[training]\nepochs = 7\n").unwrap();
        assert_eq!(config.training.epochs, 7);
        assert_eq!(config.layout, RecordingLayout::default());
        assert_eq!(config.organizer.seed, DEFAULT_SEED);
    }
}
