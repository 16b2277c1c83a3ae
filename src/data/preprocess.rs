//! Signal preprocessor
//!
//! Turns one recording into a normalized feature window, and optionally pairs
//! it with the one-hot label of its class.

use ndarray::Array1;
use std::path::Path;
use tracing::debug;

use super::class::SignalClass;
use super::normalize::MinMax;
use super::recording::read_window;
use crate::config::RecordingLayout;
use crate::error::{ClassifierError, Result};

/// A preprocessed, labelled recording
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Normalized window, values in [0, 1]
    pub features: Array1<f32>,
    /// One-hot class label
    pub label: Array1<f32>,
    pub class: SignalClass,
}

/// Parses and normalizes recordings with a fixed layout
#[derive(Debug, Clone, Copy, Default)]
pub struct Preprocessor {
    layout: RecordingLayout,
}

impl Preprocessor {
    pub fn new(layout: RecordingLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &RecordingLayout {
        &self.layout
    }

    /// Inference path: normalized window only.
    ///
    /// A window whose samples are all equal fails with
    /// [`ClassifierError::DegenerateSignal`] rather than producing NaN.
    pub fn features(&self, path: impl AsRef<Path>) -> Result<Array1<f32>> {
        let path = path.as_ref();
        let values = read_window(path, &self.layout)?;

        let stats = MinMax::fit(&values).ok_or_else(|| ClassifierError::TruncatedFile {
            path: path.to_path_buf(),
            found: 0,
            expected: self.layout.window_len,
        })?;
        if stats.is_degenerate() {
            return Err(ClassifierError::DegenerateSignal {
                path: path.to_path_buf(),
                value: stats.min,
            });
        }

        debug!(
            path = %path.display(),
            min = stats.min,
            max = stats.max,
            "normalized window"
        );
        Ok(stats.scale(&values))
    }

    /// Training/validation path with an already known class
    pub fn sample(&self, path: impl AsRef<Path>, class: SignalClass) -> Result<Sample> {
        let features = self.features(path)?;
        Ok(Sample {
            features,
            label: class.one_hot(),
            class,
        })
    }

    /// Training/validation path with the class taken from a directory name
    pub fn labelled_sample(&self, path: impl AsRef<Path>, class_dir: &str) -> Result<Sample> {
        let class = SignalClass::from_dir_name(class_dir)?;
        self.sample(path, class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    fn write_recording(dir: &Path, name: &str, window: &[String]) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        for i in 0..4 {
            writeln!(file, "header {}", i).unwrap();
        }
        for _ in 0..768 {
            writeln!(file, "0.0").unwrap();
        }
        for line in window {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    fn ramp() -> Vec<String> {
        (0..512).map(|i| i.to_string()).collect()
    }

    #[test]
    fn test_ramp_normalizes_to_index_over_511() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_recording(dir.path(), "Normal_001.pdr", &ramp());

        let sample = Preprocessor::default()
            .sample(&path, SignalClass::Normal)
            .unwrap();

        assert_eq!(sample.features.len(), 512);
        for (i, &v) in sample.features.iter().enumerate() {
            assert_relative_eq!(v, i as f32 / 511.0, max_relative = 1e-6);
        }
        assert_eq!(sample.label.to_vec(), vec![0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_features_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let window: Vec<String> = (0..512)
            .map(|i| format!("{:.3}", ((i as f64) * 0.37).sin() * 40.0))
            .collect();
        let path = write_recording(dir.path(), "x.pdr", &window);

        let pre = Preprocessor::default();
        let a = pre.features(&path).unwrap();
        let b = pre.features(&path).unwrap();
        assert_eq!(a, b);
        assert!(a.iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert!(a.iter().any(|&v| v == 0.0));
        assert!(a.iter().any(|&v| v == 1.0));
    }

    #[test]
    fn test_one_line_short_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let mut window = ramp();
        window.pop();
        let path = write_recording(dir.path(), "short.pdr", &window);

        let err = Preprocessor::default().features(&path).unwrap_err();
        assert!(matches!(err, ClassifierError::TruncatedFile { found: 511, .. }));
    }

    #[test]
    fn test_flat_window_is_degenerate() {
        let dir = tempfile::tempdir().unwrap();
        let window = vec!["3.25".to_string(); 512];
        let path = write_recording(dir.path(), "flat.pdr", &window);

        let err = Preprocessor::default().features(&path).unwrap_err();
        assert!(matches!(err, ClassifierError::DegenerateSignal { value, .. } if value == 3.25));
    }

    #[test]
    fn test_extreme_values_stay_in_unit_range() {
        let dir = tempfile::tempdir().unwrap();
        let mut window = vec!["1e308".to_string(), "-1e308".to_string()];
        window.extend(std::iter::repeat("0".to_string()).take(510));
        let path = write_recording(dir.path(), "wide.pdr", &window);

        let features = Preprocessor::default().features(&path).unwrap();
        assert!(features.iter().all(|v| (0.0..=1.0).contains(v)));
        assert_eq!(features[0], 1.0);
        assert_eq!(features[1], 0.0);
        assert_eq!(features[2], 0.5);
    }

    #[test]
    fn test_unknown_class_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_recording(dir.path(), "x.pdr", &ramp());

        let err = Preprocessor::default()
            .labelled_sample(&path, "artefato")
            .unwrap_err();
        assert!(matches!(err, ClassifierError::UnknownClass(_)));
    }
}
