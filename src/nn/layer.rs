//! Dense (Fully Connected) Layer
//!
//! output = activation(input · weights + bias)

use ndarray::{Array1, Array2, Axis};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::activation::{create_activation, ActivationType};
use crate::error::{ClassifierError, Result};

/// Gradients of one layer for one batch
pub struct LayerGradients {
    pub input: Array2<f64>,
    pub weights: Array2<f64>,
    pub biases: Array1<f64>,
}

/// Dense layer with weights, biases, and activation function
#[derive(Debug, Serialize, Deserialize)]
pub struct DenseLayer {
    /// Weight matrix (input_size x output_size)
    pub weights: Array2<f64>,
    pub biases: Array1<f64>,
    pub activation_type: ActivationType,

    // Cached for backpropagation
    #[serde(skip)]
    last_input: Option<Array2<f64>>,
    #[serde(skip)]
    last_z: Option<Array2<f64>>,
}

impl DenseLayer {
    /// Xavier/Glorot uniform initialisation from the given generator
    pub fn new<R: Rng>(
        input_size: usize,
        output_size: usize,
        activation: ActivationType,
        rng: &mut R,
    ) -> Self {
        let limit = (6.0 / (input_size + output_size) as f64).sqrt();
        let weights = Array2::random_using(
            (input_size, output_size),
            Uniform::new(-limit, limit),
            rng,
        );

        Self {
            weights,
            biases: Array1::zeros(output_size),
            activation_type: activation,
            last_input: None,
            last_z: None,
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.nrows()
    }

    pub fn output_size(&self) -> usize {
        self.weights.ncols()
    }

    /// Forward pass; caches what `backward` needs
    pub fn forward(&mut self, input: &Array2<f64>) -> Array2<f64> {
        let z = input.dot(&self.weights) + &self.biases;
        let output = create_activation(self.activation_type).forward(&z);

        self.last_input = Some(input.clone());
        self.last_z = Some(z);
        output
    }

    /// Forward pass without caching
    pub fn infer(&self, input: &Array2<f64>) -> Array2<f64> {
        let z = input.dot(&self.weights) + &self.biases;
        create_activation(self.activation_type).forward(&z)
    }

    /// Backward pass for the gradient flowing into this layer's output
    pub fn backward(&self, output_gradient: &Array2<f64>) -> Result<LayerGradients> {
        let (input, z) = match (&self.last_input, &self.last_z) {
            (Some(input), Some(z)) => (input, z),
            _ => {
                return Err(ClassifierError::Model(
                    "backward called before forward".to_string(),
                ))
            }
        };

        let delta = output_gradient * &create_activation(self.activation_type).derivative(z);

        Ok(LayerGradients {
            input: delta.dot(&self.weights.t()),
            weights: input.t().dot(&delta),
            biases: delta.sum_axis(Axis(0)),
        })
    }

    pub fn num_parameters(&self) -> usize {
        self.weights.len() + self.biases.len()
    }
}

impl Clone for DenseLayer {
    fn clone(&self) -> Self {
        Self {
            weights: self.weights.clone(),
            biases: self.biases.clone(),
            activation_type: self.activation_type,
            last_input: None,
            last_z: None,
        }
    }
}
