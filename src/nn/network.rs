//! Feedforward classification network
//!
//! Dense ReLU stack with a softmax output trained on categorical
//! cross-entropy. Weights persist as JSON.

use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::info;

use super::activation::ActivationType;
use super::layer::DenseLayer;
use super::optimizer::{Optimizer, Sgd};
use crate::error::{ClassifierError, Result};

const EPSILON: f64 = 1e-15;

/// Network configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub layer_sizes: Vec<usize>,
    pub activations: Vec<ActivationType>,
}

impl NetworkConfig {
    pub fn new(input_size: usize) -> Self {
        Self {
            layer_sizes: vec![input_size],
            activations: vec![],
        }
    }

    /// Add a hidden layer
    pub fn add_layer(mut self, size: usize, activation: ActivationType) -> Self {
        self.layer_sizes.push(size);
        self.activations.push(activation);
        self
    }

    /// Softmax output over `classes`
    pub fn output_layer(self, classes: usize) -> Self {
        self.add_layer(classes, ActivationType::Softmax)
    }

    pub fn input_size(&self) -> usize {
        self.layer_sizes[0]
    }

    pub fn output_size(&self) -> usize {
        self.layer_sizes.last().copied().unwrap_or(0)
    }

    fn validate(&self) -> Result<()> {
        if self.activations.is_empty() || self.layer_sizes.len() != self.activations.len() + 1 {
            return Err(ClassifierError::Model(
                "network needs at least an output layer".to_string(),
            ));
        }
        if self.activations.last() != Some(&ActivationType::Softmax)
            || self.activations[..self.activations.len() - 1].contains(&ActivationType::Softmax)
        {
            return Err(ClassifierError::Model(
                "softmax is only supported as the output activation".to_string(),
            ));
        }
        Ok(())
    }
}

/// Feedforward Neural Network
pub struct NeuralNetwork {
    pub layers: Vec<DenseLayer>,
    pub config: NetworkConfig,
    optimizers: Vec<Box<dyn Optimizer>>,
}

#[derive(Serialize, Deserialize)]
struct SavedNetwork {
    config: NetworkConfig,
    layers: Vec<DenseLayer>,
}

impl NeuralNetwork {
    /// Create network from configuration, initialising weights from `seed`
    pub fn from_config(config: NetworkConfig, seed: u64) -> Result<Self> {
        config.validate()?;

        let mut rng = StdRng::seed_from_u64(seed);
        let layers: Vec<DenseLayer> = config
            .activations
            .iter()
            .enumerate()
            .map(|(i, &activation)| {
                DenseLayer::new(
                    config.layer_sizes[i],
                    config.layer_sizes[i + 1],
                    activation,
                    &mut rng,
                )
            })
            .collect();

        let optimizers = default_optimizers(layers.len());
        Ok(Self {
            layers,
            config,
            optimizers,
        })
    }

    /// ReLU hidden layers and a softmax output
    pub fn classifier(
        input_size: usize,
        hidden_sizes: &[usize],
        classes: usize,
        seed: u64,
    ) -> Result<Self> {
        let config = hidden_sizes
            .iter()
            .fold(NetworkConfig::new(input_size), |c, &size| {
                c.add_layer(size, ActivationType::ReLU)
            })
            .output_layer(classes);
        Self::from_config(config, seed)
    }

    /// Use a fresh copy of `optimizer` for every layer
    pub fn set_optimizer(&mut self, optimizer: Box<dyn Optimizer>) {
        self.optimizers = self.layers.iter().map(|_| optimizer.clone_box()).collect();
    }

    pub fn input_size(&self) -> usize {
        self.config.input_size()
    }

    pub fn output_size(&self) -> usize {
        self.config.output_size()
    }

    fn check_input(&self, input: &Array2<f64>) -> Result<()> {
        if input.ncols() != self.input_size() {
            return Err(ClassifierError::Model(format!(
                "expected {} input features, got {}",
                self.input_size(),
                input.ncols()
            )));
        }
        Ok(())
    }

    /// Forward pass caching activations for a following `backward`
    fn forward(&mut self, input: &Array2<f64>) -> Array2<f64> {
        let mut output = input.clone();
        for layer in &mut self.layers {
            output = layer.forward(&output);
        }
        output
    }

    /// Class probabilities for each row of `input`
    pub fn predict(&self, input: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_input(input)?;
        let mut output = input.clone();
        for layer in &self.layers {
            output = layer.infer(&output);
        }
        Ok(output)
    }

    /// Mean categorical cross-entropy over the batch
    pub fn compute_loss(predictions: &Array2<f64>, targets: &Array2<f64>) -> f64 {
        let n = predictions.nrows().max(1) as f64;
        let p = predictions.mapv(|v| v.clamp(EPSILON, 1.0 - EPSILON));
        -(targets * &p.mapv(f64::ln)).sum() / n
    }

    /// Backward pass and parameter update.
    ///
    /// For softmax + cross-entropy the output gradient is `(p - y) / n`.
    fn backward(&mut self, predictions: &Array2<f64>, targets: &Array2<f64>) -> Result<()> {
        let n = predictions.nrows().max(1) as f64;
        let mut gradient = (predictions - targets) / n;

        for (layer, optimizer) in self.layers.iter_mut().zip(self.optimizers.iter_mut()).rev() {
            let grads = layer.backward(&gradient)?;
            optimizer.step(layer, &grads);
            gradient = grads.input;
        }
        Ok(())
    }

    /// One optimisation step on a batch.
    ///
    /// Returns the loss and correct count of the forward pass, i.e. before
    /// the update.
    pub fn train_batch(&mut self, x: &Array2<f64>, y: &Array2<f64>) -> Result<(f64, usize)> {
        self.check_input(x)?;
        if y.dim() != (x.nrows(), self.output_size()) {
            return Err(ClassifierError::Model(format!(
                "label batch shape {:?} does not match ({}, {})",
                y.dim(),
                x.nrows(),
                self.output_size()
            )));
        }

        let predictions = self.forward(x);
        let loss = Self::compute_loss(&predictions, y);
        let correct = count_correct(&predictions, y);
        self.backward(&predictions, y)?;
        Ok((loss, correct))
    }

    /// Loss and number of rows whose argmax matches the target's argmax
    pub fn evaluate(&self, x: &Array2<f64>, y: &Array2<f64>) -> Result<(f64, usize)> {
        let predictions = self.predict(x)?;
        let loss = Self::compute_loss(&predictions, y);
        Ok((loss, count_correct(&predictions, y)))
    }

    pub fn num_parameters(&self) -> usize {
        self.layers.iter().map(|l| l.num_parameters()).sum()
    }

    /// Save model to a JSON file, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ClassifierError::io(parent, e))?;
        }

        let file = File::create(path).map_err(|e| ClassifierError::io(path, e))?;
        let saved = SavedNetwork {
            config: self.config.clone(),
            layers: self.layers.clone(),
        };
        serde_json::to_writer(BufWriter::new(file), &saved)?;
        Ok(())
    }

    /// Load model from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ClassifierError::io(path, e))?;
        let saved: SavedNetwork = serde_json::from_reader(BufReader::new(file))?;
        saved.config.validate()?;

        let shapes_match = saved.layers.len() == saved.config.activations.len()
            && saved.layers.iter().enumerate().all(|(i, l)| {
                l.input_size() == saved.config.layer_sizes[i]
                    && l.output_size() == saved.config.layer_sizes[i + 1]
                    && l.biases.len() == l.output_size()
            });
        if !shapes_match {
            return Err(ClassifierError::Model(format!(
                "layer shapes in {} do not match its config",
                path.display()
            )));
        }

        let optimizers = default_optimizers(saved.layers.len());
        Ok(Self {
            layers: saved.layers,
            config: saved.config,
            optimizers,
        })
    }

    /// Log a layer-by-layer summary
    pub fn summary(&self) {
        info!(input = self.input_size(), "network summary");
        for (i, layer) in self.layers.iter().enumerate() {
            info!(
                "  layer {}: {} -> {} ({:?}), params: {}",
                i + 1,
                layer.input_size(),
                layer.output_size(),
                layer.activation_type,
                layer.num_parameters()
            );
        }
        info!(total = self.num_parameters(), "parameters");
    }
}

fn default_optimizers(n: usize) -> Vec<Box<dyn Optimizer>> {
    (0..n)
        .map(|_| Box::new(Sgd::new(0.01)) as Box<dyn Optimizer>)
        .collect()
}

fn count_correct(predictions: &Array2<f64>, targets: &Array2<f64>) -> usize {
    predictions
        .axis_iter(Axis(0))
        .zip(targets.axis_iter(Axis(0)))
        .filter(|(p, t)| argmax(p.iter()) == argmax(t.iter()))
        .count()
}

/// Index of the largest value; first wins on ties
pub fn argmax<'a>(values: impl Iterator<Item = &'a f64>) -> usize {
    values
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(bi, bv), (i, &v)| {
            if v > bv {
                (i, v)
            } else {
                (bi, bv)
            }
        })
        .0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_network_creation() {
        let network = NeuralNetwork::classifier(10, &[32, 16], 4, 1).unwrap();
        assert_eq!(network.layers.len(), 3);
        assert_eq!(network.num_parameters(), 10 * 32 + 32 + 32 * 16 + 16 + 16 * 4 + 4);
    }

    #[test]
    fn test_softmax_must_be_last() {
        let config = NetworkConfig::new(4)
            .add_layer(8, ActivationType::Softmax)
            .output_layer(2);
        assert!(NeuralNetwork::from_config(config, 1).is_err());

        let config = NetworkConfig::new(4).add_layer(2, ActivationType::ReLU);
        assert!(NeuralNetwork::from_config(config, 1).is_err());
    }

    #[test]
    fn test_predict_is_probability() {
        let network = NeuralNetwork::classifier(6, &[8], 4, 1).unwrap();
        let out = network.predict(&Array2::from_elem((3, 6), 0.5)).unwrap();
        assert_eq!(out.dim(), (3, 4));
        for row in out.rows() {
            assert_relative_eq!(row.sum(), 1.0, epsilon = 1e-12);
        }
        assert!(network.predict(&Array2::zeros((1, 5))).is_err());
    }

    #[test]
    fn test_training_reduces_loss() {
        let mut network = NeuralNetwork::classifier(2, &[8], 2, 5).unwrap();
        network.set_optimizer(Box::new(Sgd::new(0.5)));

        let x = array![[0.0, 1.0], [1.0, 0.0], [0.1, 0.9], [0.9, 0.1]];
        let y = array![[1.0, 0.0], [0.0, 1.0], [1.0, 0.0], [0.0, 1.0]];

        let (initial_loss, _) = network.evaluate(&x, &y).unwrap();
        for _ in 0..200 {
            network.train_batch(&x, &y).unwrap();
        }
        let (final_loss, correct) = network.evaluate(&x, &y).unwrap();

        assert!(final_loss < initial_loss);
        assert_eq!(correct, 4);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model").join("model.json");

        let network = NeuralNetwork::classifier(5, &[7], 4, 9).unwrap();
        network.save(&path).unwrap();
        let loaded = NeuralNetwork::load(&path).unwrap();

        let x = Array2::from_elem((2, 5), 0.3);
        assert_eq!(network.predict(&x).unwrap(), loaded.predict(&x).unwrap());
        assert_eq!(loaded.config, network.config);
    }

    #[test]
    fn test_argmax() {
        assert_eq!(argmax([0.1, 0.7, 0.2].iter()), 1);
        assert_eq!(argmax([0.5, 0.5].iter()), 0);
    }
}
