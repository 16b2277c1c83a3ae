//! Training Module
//!
//! - `Classifier` trait implemented by the network
//! - `Trainer` streaming organized splits into the model
//! - Epoch metrics, history and confusion matrix

mod classifier;
mod metrics;
mod trainer;

pub use classifier::{stack_samples, Classifier};
pub use metrics::{ConfusionMatrix, EpochMetrics, PassMetrics, TrainingHistory};
pub use trainer::Trainer;
