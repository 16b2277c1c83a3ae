//! Neural Network Module
//!
//! Building blocks for the feedforward classifier:
//! - Activation functions (ReLU, Sigmoid, Softmax, Linear)
//! - Dense layers with forward and backward propagation
//! - SGD and Adam optimizers
//! - Full network with training, evaluation and persistence

pub mod activation;
pub mod layer;
pub mod network;
pub mod optimizer;

pub use activation::{Activation, ActivationType};
pub use layer::DenseLayer;
pub use network::{argmax, NetworkConfig, NeuralNetwork};
pub use optimizer::{Adam, Optimizer, Sgd};
