//! Per-window min-max scaling
//!
//! Statistics are computed over a single window on every call; nothing is
//! carried across recordings.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Minimum and maximum of one window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMax {
    pub min: f64,
    pub max: f64,
}

impl MinMax {
    /// Fit to a window. `None` for an empty slice.
    pub fn fit(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        Some(Self { min, max })
    }

    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Zero dynamic range: scaling would divide by zero
    pub fn is_degenerate(&self) -> bool {
        self.range() == 0.0
    }

    /// Scale into [0, 1]: the minimum maps to 0.0 and the maximum to 1.0.
    ///
    /// Callers must reject degenerate windows first. When `max - min`
    /// overflows, both sides are halved before subtracting.
    pub fn scale(&self, values: &[f64]) -> Array1<f32> {
        let range = self.range();
        if range.is_finite() {
            return values
                .iter()
                .map(|&x| ((x - self.min) / range) as f32)
                .collect();
        }

        let half_min = self.min / 2.0;
        let half_range = self.max / 2.0 - half_min;
        values
            .iter()
            .map(|&x| ((x / 2.0 - half_min) / half_range) as f32)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_hits_both_ends() {
        let values = vec![3.0, -1.0, 7.0, 5.0];
        let mm = MinMax::fit(&values).unwrap();
        assert_eq!(mm.min, -1.0);
        assert_eq!(mm.max, 7.0);

        let scaled = mm.scale(&values);
        assert_eq!(scaled.to_vec(), vec![0.5, 0.0, 1.0, 0.75]);
    }

    #[test]
    fn test_degenerate() {
        let mm = MinMax::fit(&[2.0, 2.0, 2.0]).unwrap();
        assert!(mm.is_degenerate());
        assert!(MinMax::fit(&[]).is_none());
    }

    #[test]
    fn test_full_f64_range_stays_finite() {
        let values = vec![1e308, -1e308, 0.0, -1e308];
        let mm = MinMax::fit(&values).unwrap();
        assert!(mm.range().is_infinite());
        assert!(!mm.is_degenerate());

        let scaled = mm.scale(&values);
        assert_eq!(scaled.to_vec(), vec![1.0, 0.0, 0.5, 0.0]);
    }
}
