//! Train/validation/test split assignment

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::OrganizerConfig;

/// Dataset partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Training,
    Validation,
    Testing,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Training, Split::Testing, Split::Validation];

    pub fn dir_name(&self) -> &'static str {
        match self {
            Split::Training => "training",
            Split::Validation => "validation",
            Split::Testing => "testing",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Cut points on a single uniform draw in [0, 1).
///
/// `draw < testing` is testing, else `draw < validation` is validation,
/// else training. With the defaults that is 5% / 15% / 80%.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitThresholds {
    pub testing: f64,
    pub validation: f64,
}

impl Default for SplitThresholds {
    fn default() -> Self {
        Self {
            testing: 0.05,
            validation: 0.2,
        }
    }
}

impl From<&OrganizerConfig> for SplitThresholds {
    fn from(config: &OrganizerConfig) -> Self {
        Self {
            testing: config.testing_threshold,
            validation: config.validation_threshold,
        }
    }
}

impl SplitThresholds {
    pub fn assign(&self, draw: f64) -> Split {
        if draw < self.testing {
            Split::Testing
        } else if draw < self.validation {
            Split::Validation
        } else {
            Split::Training
        }
    }
}
