//! Signal class table
//!
//! The single source of truth for class index, organized directory name,
//! raw filename prefix and display name. Both the organizer and the
//! preprocessor go through this table.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ClassifierError, Result};

/// Number of signal classes
pub const NUM_CLASSES: usize = 4;

/// One of the four labelled waveform-event categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalClass {
    /// Epileptiform spike
    Espicula,
    /// Background activity
    Normal,
    /// Eye blink artifact
    Piscada,
    /// Noise
    Ruido,
}

impl SignalClass {
    /// All classes in index order (also the prefix matching priority)
    pub const ALL: [SignalClass; NUM_CLASSES] = [
        SignalClass::Espicula,
        SignalClass::Normal,
        SignalClass::Piscada,
        SignalClass::Ruido,
    ];

    /// Position in the one-hot vector and model output
    pub fn index(&self) -> usize {
        match self {
            SignalClass::Espicula => 0,
            SignalClass::Normal => 1,
            SignalClass::Piscada => 2,
            SignalClass::Ruido => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Directory name in the organized tree
    pub fn dir_name(&self) -> &'static str {
        match self {
            SignalClass::Espicula => "espicula",
            SignalClass::Normal => "normal",
            SignalClass::Piscada => "piscada",
            SignalClass::Ruido => "ruido",
        }
    }

    /// Canonical UTF-8 filename prefix of raw recordings
    pub fn prefix(&self) -> &'static str {
        match self {
            SignalClass::Espicula => "Espícula",
            SignalClass::Normal => "Normal",
            SignalClass::Piscada => "Piscada",
            SignalClass::Ruido => "Ruído",
        }
    }

    /// Unaccented and mis-encoded spellings found in exported datasets
    /// (CP850 `í` read as Latin-1)
    pub fn legacy_prefixes(&self) -> &'static [&'static str] {
        match self {
            SignalClass::Espicula => &["Espicula", "Esp¡cula", "EspÂ¡cula"],
            SignalClass::Ruido => &["Ruido", "Ru¡do", "RuÂ¡do"],
            SignalClass::Normal | SignalClass::Piscada => &[],
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        self.prefix()
    }

    /// Look up a class by organized directory name
    pub fn from_dir_name(name: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.dir_name() == name)
            .ok_or_else(|| ClassifierError::UnknownClass(name.to_string()))
    }

    /// Classify a raw recording by filename prefix.
    ///
    /// Classes are tried in index order and the first match wins. `None`
    /// means the file belongs to no class and is passed over.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| {
            file_name.starts_with(c.prefix())
                || c.legacy_prefixes().iter().any(|p| file_name.starts_with(p))
        })
    }

    /// One-hot label: 1.0 at [`SignalClass::index`], 0.0 elsewhere
    pub fn one_hot(&self) -> Array1<f32> {
        let mut label = Array1::zeros(NUM_CLASSES);
        label[self.index()] = 1.0;
        label
    }
}

impl fmt::Display for SignalClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
