//! Data Module
//!
//! Recording parsing and preprocessing:
//! - Class table and one-hot labels
//! - Fixed-layout window parsing
//! - Per-window min-max normalization
//! - Lazy split datasets for training and validation

mod class;
mod dataset;
mod normalize;
mod preprocess;
mod recording;

pub use class::{SignalClass, NUM_CLASSES};
pub use dataset::{Epoch, LabelledPath, ShufflePolicy, SplitDataset};
pub use normalize::MinMax;
pub use preprocess::{Preprocessor, Sample};
pub use recording::{parse_window, read_window};
