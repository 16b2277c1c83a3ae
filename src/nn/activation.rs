//! Activation Functions
//!
//! Batch-wise activations and the derivatives used in backpropagation.
//! Rows are samples, columns are units.

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

/// Types of activation functions available
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ActivationType {
    /// Rectified Linear Unit: max(0, x)
    ReLU,
    /// Sigmoid: 1 / (1 + exp(-x))
    Sigmoid,
    /// Row-wise softmax: exp(x_i) / sum(exp(x_j))
    Softmax,
    /// Identity
    Linear,
}

/// Activation function trait with forward and backward passes
pub trait Activation: Send + Sync {
    /// Apply to a batch of pre-activations
    fn forward(&self, z: &Array2<f64>) -> Array2<f64>;

    /// Element-wise derivative with respect to the pre-activation
    fn derivative(&self, z: &Array2<f64>) -> Array2<f64>;
}

pub struct ReLU;

impl Activation for ReLU {
    fn forward(&self, z: &Array2<f64>) -> Array2<f64> {
        z.mapv(|v| v.max(0.0))
    }

    fn derivative(&self, z: &Array2<f64>) -> Array2<f64> {
        z.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 })
    }
}

pub struct Sigmoid;

impl Activation for Sigmoid {
    fn forward(&self, z: &Array2<f64>) -> Array2<f64> {
        z.mapv(|v| 1.0 / (1.0 + (-v).exp()))
    }

    fn derivative(&self, z: &Array2<f64>) -> Array2<f64> {
        let s = self.forward(z);
        &s * &(1.0 - &s)
    }
}

/// Numerically stable softmax over each row.
///
/// The derivative is reported as ones: the network folds the softmax
/// Jacobian into the cross-entropy gradient (`p - y`), so the layer must not
/// apply it a second time.
pub struct Softmax;

impl Activation for Softmax {
    fn forward(&self, z: &Array2<f64>) -> Array2<f64> {
        let mut out = z.clone();
        for mut row in out.axis_iter_mut(Axis(0)) {
            let max = row.fold(f64::NEG_INFINITY, |a, &b| a.max(b));
            row.mapv_inplace(|v| (v - max).exp());
            let sum = row.sum();
            row.mapv_inplace(|v| v / sum);
        }
        out
    }

    fn derivative(&self, z: &Array2<f64>) -> Array2<f64> {
        Array2::ones(z.dim())
    }
}

pub struct Linear;

impl Activation for Linear {
    fn forward(&self, z: &Array2<f64>) -> Array2<f64> {
        z.clone()
    }

    fn derivative(&self, z: &Array2<f64>) -> Array2<f64> {
        Array2::ones(z.dim())
    }
}

/// Create an activation function from type
pub fn create_activation(activation_type: ActivationType) -> Box<dyn Activation> {
    match activation_type {
        ActivationType::ReLU => Box::new(ReLU),
        ActivationType::Sigmoid => Box::new(Sigmoid),
        ActivationType::Softmax => Box::new(Softmax),
        ActivationType::Linear => Box::new(Linear),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_relu() {
        let z = array![[-1.0, 0.0, 1.0, 2.0]];
        assert_eq!(ReLU.forward(&z), array![[0.0, 0.0, 1.0, 2.0]]);
        assert_eq!(ReLU.derivative(&z), array![[0.0, 0.0, 1.0, 1.0]]);
    }

    #[test]
    fn test_sigmoid() {
        let y = Sigmoid.forward(&array![[0.0]]);
        assert_relative_eq!(y[[0, 0]], 0.5, epsilon = 1e-10);
    }

    #[test]
    fn test_softmax_rows_sum_to_one() {
        let z = array![[1.0, 2.0, 3.0, 4.0], [1000.0, 1000.0, 1000.0, 1000.0]];
        let p = Softmax.forward(&z);

        for row in p.rows() {
            assert_relative_eq!(row.sum(), 1.0, epsilon = 1e-12);
        }
        assert!(p[[0, 3]] > p[[0, 2]]);
        assert_relative_eq!(p[[1, 0]], 0.25, epsilon = 1e-12);
    }
}
