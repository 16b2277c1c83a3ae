//! Optimization Algorithms
//!
//! - SGD with optional momentum
//! - Adam (Adaptive Moment Estimation)
//!
//! Each layer owns its own optimizer instance so that moment state never
//! mixes between layers.

use ndarray::{Array1, Array2};

use super::layer::{DenseLayer, LayerGradients};
use crate::config::{OptimizerKind, TrainingConfig};

/// Optimizer trait for parameter updates
pub trait Optimizer: Send + Sync {
    /// Apply one update to a layer's parameters
    fn step(&mut self, layer: &mut DenseLayer, grads: &LayerGradients);

    /// Fresh instance with the same hyperparameters and no state
    fn clone_box(&self) -> Box<dyn Optimizer>;
}

/// Build the optimizer described by a training configuration
pub fn from_config(config: &TrainingConfig) -> Box<dyn Optimizer> {
    match config.optimizer {
        OptimizerKind::Sgd => {
            Box::new(Sgd::new(config.learning_rate).with_momentum(config.momentum))
        }
        OptimizerKind::Adam => Box::new(Adam::new(config.learning_rate)),
    }
}

/// Stochastic Gradient Descent with optional momentum
#[derive(Clone)]
pub struct Sgd {
    pub learning_rate: f64,
    pub momentum: f64,
    velocity_w: Option<Array2<f64>>,
    velocity_b: Option<Array1<f64>>,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            momentum: 0.0,
            velocity_w: None,
            velocity_b: None,
        }
    }

    pub fn with_momentum(mut self, momentum: f64) -> Self {
        self.momentum = momentum;
        self
    }
}

impl Optimizer for Sgd {
    fn step(&mut self, layer: &mut DenseLayer, grads: &LayerGradients) {
        let lr = self.learning_rate;

        if self.momentum > 0.0 {
            let vw = self
                .velocity_w
                .get_or_insert_with(|| Array2::zeros(layer.weights.dim()));
            *vw = &*vw * self.momentum - &grads.weights * lr;
            layer.weights += &*vw;

            let vb = self
                .velocity_b
                .get_or_insert_with(|| Array1::zeros(layer.biases.len()));
            *vb = &*vb * self.momentum - &grads.biases * lr;
            layer.biases += &*vb;
        } else {
            layer.weights.scaled_add(-lr, &grads.weights);
            layer.biases.scaled_add(-lr, &grads.biases);
        }
    }

    fn clone_box(&self) -> Box<dyn Optimizer> {
        Box::new(Sgd::new(self.learning_rate).with_momentum(self.momentum))
    }
}

/// Adam optimizer
#[derive(Clone)]
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    t: i32,
    m_w: Option<Array2<f64>>,
    v_w: Option<Array2<f64>>,
    m_b: Option<Array1<f64>>,
    v_b: Option<Array1<f64>>,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            t: 0,
            m_w: None,
            v_w: None,
            m_b: None,
            v_b: None,
        }
    }
}

impl Optimizer for Adam {
    fn step(&mut self, layer: &mut DenseLayer, grads: &LayerGradients) {
        self.t += 1;
        let (b1, b2) = (self.beta1, self.beta2);
        let correction1 = 1.0 - b1.powi(self.t);
        let correction2 = 1.0 - b2.powi(self.t);
        let lr = self.learning_rate;
        let eps = self.epsilon;

        let m = self.m_w.get_or_insert_with(|| Array2::zeros(layer.weights.dim()));
        let v = self.v_w.get_or_insert_with(|| Array2::zeros(layer.weights.dim()));
        *m = &*m * b1 + &grads.weights * (1.0 - b1);
        *v = &*v * b2 + &(&grads.weights * &grads.weights) * (1.0 - b2);
        let update = (&*m / correction1) / ((&*v / correction2).mapv(f64::sqrt) + eps);
        layer.weights.scaled_add(-lr, &update);

        let m = self.m_b.get_or_insert_with(|| Array1::zeros(layer.biases.len()));
        let v = self.v_b.get_or_insert_with(|| Array1::zeros(layer.biases.len()));
        *m = &*m * b1 + &grads.biases * (1.0 - b1);
        *v = &*v * b2 + &(&grads.biases * &grads.biases) * (1.0 - b2);
        let update = (&*m / correction1) / ((&*v / correction2).mapv(f64::sqrt) + eps);
        layer.biases.scaled_add(-lr, &update);
    }

    fn clone_box(&self) -> Box<dyn Optimizer> {
        Box::new(Adam::new(self.learning_rate))
    }
}
