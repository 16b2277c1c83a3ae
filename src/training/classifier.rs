//! The seam between preprocessing and the model
//!
//! Anything that can score a feature window and learn from labelled batches
//! can be driven by the [`Trainer`](super::Trainer) and the
//! [`Predictor`](crate::inference::Predictor).

use ndarray::{Array1, Array2};

use crate::data::{Sample, NUM_CLASSES};
use crate::error::{ClassifierError, Result};
use crate::inference::Prediction;
use crate::nn::NeuralNetwork;

/// A trainable four-way classifier
pub trait Classifier {
    /// Length of the feature window the model expects
    fn input_size(&self) -> usize;

    /// Class probabilities for one window
    fn predict(&self, features: &Array1<f32>) -> Result<Prediction>;

    /// One optimisation step; returns (mean loss, correct predictions)
    fn train_batch(&mut self, x: &Array2<f64>, y: &Array2<f64>) -> Result<(f64, usize)>;

    /// Score a batch without updating; returns (mean loss, correct predictions)
    fn evaluate_batch(&self, x: &Array2<f64>, y: &Array2<f64>) -> Result<(f64, usize)>;
}

impl Classifier for NeuralNetwork {
    fn input_size(&self) -> usize {
        NeuralNetwork::input_size(self)
    }

    fn predict(&self, features: &Array1<f32>) -> Result<Prediction> {
        let x = features
            .mapv(f64::from)
            .into_shape((1, features.len()))
            .map_err(|e| ClassifierError::Model(e.to_string()))?;
        let probabilities = NeuralNetwork::predict(self, &x)?;
        Prediction::from_probabilities(probabilities.row(0).iter().copied())
    }

    fn train_batch(&mut self, x: &Array2<f64>, y: &Array2<f64>) -> Result<(f64, usize)> {
        NeuralNetwork::train_batch(self, x, y)
    }

    fn evaluate_batch(&self, x: &Array2<f64>, y: &Array2<f64>) -> Result<(f64, usize)> {
        self.evaluate(x, y)
    }
}

/// Stack samples into (features, labels) matrices, one row per sample
pub fn stack_samples(samples: &[Sample]) -> Result<(Array2<f64>, Array2<f64>)> {
    let width = samples.first().map(|s| s.features.len()).unwrap_or(0);
    if samples.iter().any(|s| s.features.len() != width) {
        return Err(ClassifierError::Model(
            "samples in a batch have different window lengths".to_string(),
        ));
    }

    let x = Array2::from_shape_fn((samples.len(), width), |(i, j)| {
        f64::from(samples[i].features[j])
    });
    let y = Array2::from_shape_fn((samples.len(), NUM_CLASSES), |(i, j)| {
        f64::from(samples[i].label[j])
    });
    Ok((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SignalClass;
    use ndarray::array;

    fn sample(features: Array1<f32>, class: SignalClass) -> Sample {
        Sample {
            features,
            label: class.one_hot(),
            class,
        }
    }

    #[test]
    fn test_stack_samples() {
        let samples = vec![
            sample(array![0.0, 1.0, 0.5], SignalClass::Piscada),
            sample(array![1.0, 0.0, 0.25], SignalClass::Espicula),
        ];
        let (x, y) = stack_samples(&samples).unwrap();
        assert_eq!(x, array![[0.0, 1.0, 0.5], [1.0, 0.0, 0.25]]);
        assert_eq!(y, array![[0.0, 0.0, 1.0, 0.0], [1.0, 0.0, 0.0, 0.0]]);
    }

    #[test]
    fn test_stack_rejects_ragged_batch() {
        let samples = vec![
            sample(array![0.0, 1.0], SignalClass::Normal),
            sample(array![0.0, 1.0, 0.5], SignalClass::Normal),
        ];
        assert!(stack_samples(&samples).is_err());
    }

    #[test]
    fn test_network_predicts_through_trait() {
        let network = NeuralNetwork::classifier(3, &[4], NUM_CLASSES, 1).unwrap();
        let prediction = Classifier::predict(&network, &array![0.0, 0.5, 1.0]).unwrap();
        let total: f32 = prediction.probabilities.iter().sum();
        assert!((total - 1.0).abs() < 1e-5);
    }
}
