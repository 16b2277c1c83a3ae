//! # EEG Event Classifier
//!
//! Organizes a directory of labelled EEG recordings into
//! training/validation/testing splits, preprocesses each recording into a
//! normalized 512-sample window, and trains a small feedforward network to
//! tell four waveform events apart: spike, normal activity, blink and noise.
//!
//! ## Modules
//!
//! - `data` - Class table, recording parser, normalization, lazy datasets
//! - `organize` - Seeded split assignment and copying into the class tree
//! - `nn` - Neural network implementation (layers, activations, optimizers)
//! - `training` - Classifier trait, training loop and metrics
//! - `inference` - Single-recording prediction with a saved model
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use eeg_event_classifier::prelude::*;
//!
//! let config = Config::default();
//! DatasetOrganizer::new("original_signals", "dataset", &config.organizer).run()?;
//!
//! let pre = Preprocessor::new(config.layout);
//! let t = &config.training;
//! let mut train = SplitDataset::for_split("dataset", Split::Training, pre, t.shuffle, t.seed);
//! let trainer = Trainer::new(t.clone());
//! let mut model = trainer.build_network(config.layout.window_len)?;
//! trainer.fit(&mut model, &mut train, None)?;
//! model.save("model/model.json")?;
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod inference;
pub mod nn;
pub mod organize;
pub mod training;

pub use config::{Config, Preset, RecordingLayout};
pub use data::{Preprocessor, Sample, SignalClass, SplitDataset};
pub use error::{ClassifierError, Result};
pub use inference::{Prediction, Predictor};
pub use nn::NeuralNetwork;
pub use organize::{DatasetOrganizer, Split};
pub use training::{Classifier, Trainer};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{Config, Preset, RecordingLayout, TrainingConfig};
    pub use crate::data::{Preprocessor, Sample, ShufflePolicy, SignalClass, SplitDataset};
    pub use crate::error::{ClassifierError, Result};
    pub use crate::inference::{Prediction, Predictor};
    pub use crate::nn::NeuralNetwork;
    pub use crate::organize::{DatasetOrganizer, Split};
    pub use crate::training::{Classifier, Trainer, TrainingHistory};
}

/// Install the global `tracing` subscriber used by the command-line tools
pub fn init_logging(verbose: bool) {
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .finish();
    // A subscriber may already be installed by an embedding application
    let _ = tracing::subscriber::set_global_default(subscriber);
}
