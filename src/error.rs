//! Error types for recording preprocessing, dataset organization and training

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, ClassifierError>;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum ClassifierError {
    /// A source directory or recording does not exist
    #[error("File not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    /// Fewer samples than the window needs after the header/skip region
    #[error("Truncated recording {}: found {found} of {expected} window samples", .path.display())]
    TruncatedFile {
        path: PathBuf,
        found: usize,
        expected: usize,
    },

    /// A sample line inside the window is not a decimal number
    #[error("Failed to parse sample at line {line} of {}: {value:?}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        value: String,
    },

    /// Every sample in the window has the same value
    #[error("Degenerate signal in {}: all window samples equal {value}", .path.display())]
    DegenerateSignal { path: PathBuf, value: f64 },

    /// Directory or file name matches none of the known classes
    #[error("Unknown signal class: {0}")]
    UnknownClass(String),

    /// Filesystem error with the offending path attached
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Model shape or state problem
    #[error("Model error: {0}")]
    Model(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl ClassifierError {
    /// Wrap an IO error, mapping `NotFound` to [`ClassifierError::FileNotFound`]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        if source.kind() == std::io::ErrorKind::NotFound {
            ClassifierError::FileNotFound { path }
        } else {
            ClassifierError::Io { path, source }
        }
    }

    /// True for problems with the content of a single recording.
    ///
    /// These are the errors a training run may skip over; anything else
    /// (IO, configuration, model) aborts.
    pub fn is_recording_error(&self) -> bool {
        matches!(
            self,
            ClassifierError::TruncatedFile { .. }
                | ClassifierError::Parse { .. }
                | ClassifierError::DegenerateSignal { .. }
                | ClassifierError::UnknownClass(_)
        )
    }
}
