//! Inference on single recordings with a saved model

use ndarray::Array1;
use std::fmt;
use std::path::Path;
use tracing::info;

use crate::config::RecordingLayout;
use crate::data::{Preprocessor, SignalClass, NUM_CLASSES};
use crate::error::{ClassifierError, Result};
use crate::nn::NeuralNetwork;
use crate::training::Classifier;

/// Class probabilities for one recording, in class-table order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub probabilities: [f32; NUM_CLASSES],
}

impl Prediction {
    pub fn from_probabilities(values: impl IntoIterator<Item = f64>) -> Result<Self> {
        let values: Vec<f64> = values.into_iter().collect();
        if values.len() != NUM_CLASSES {
            return Err(ClassifierError::Model(format!(
                "expected {} class probabilities, got {}",
                NUM_CLASSES,
                values.len()
            )));
        }

        let mut probabilities = [0.0f32; NUM_CLASSES];
        for (slot, v) in probabilities.iter_mut().zip(values) {
            *slot = v as f32;
        }
        Ok(Self { probabilities })
    }

    pub fn probability(&self, class: SignalClass) -> f32 {
        self.probabilities[class.index()]
    }

    /// Classes sorted by descending probability; ties keep table order
    pub fn ranked(&self) -> Vec<(SignalClass, f32)> {
        let mut ranked: Vec<(SignalClass, f32)> = SignalClass::ALL
            .iter()
            .map(|&c| (c, self.probability(c)))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }

    /// Most likely class
    pub fn top(&self) -> (SignalClass, f32) {
        self.ranked()[0]
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for class in SignalClass::ALL {
            writeln!(f, "{} = {:.2}%", class, self.probability(class) * 100.0)?;
        }
        Ok(())
    }
}

/// A loaded model paired with the preprocessor it was trained with
pub struct Predictor<C: Classifier = NeuralNetwork> {
    model: C,
    preprocessor: Preprocessor,
}

impl Predictor<NeuralNetwork> {
    /// Load a saved network
    pub fn load(model_path: impl AsRef<Path>, layout: RecordingLayout) -> Result<Self> {
        let model_path = model_path.as_ref();
        let network = NeuralNetwork::load(model_path)?;
        if network.output_size() != NUM_CLASSES {
            return Err(ClassifierError::Model(format!(
                "model has {} outputs, expected {}",
                network.output_size(),
                NUM_CLASSES
            )));
        }
        info!(model = %model_path.display(), params = network.num_parameters(), "loaded model");
        Self::new(network, layout)
    }
}

impl<C: Classifier> Predictor<C> {
    pub fn new(model: C, layout: RecordingLayout) -> Result<Self> {
        if model.input_size() != layout.window_len {
            return Err(ClassifierError::Model(format!(
                "model expects {} samples but the layout window is {}",
                model.input_size(),
                layout.window_len
            )));
        }
        Ok(Self {
            model,
            preprocessor: Preprocessor::new(layout),
        })
    }

    pub fn model(&self) -> &C {
        &self.model
    }

    pub fn predict_features(&self, features: &Array1<f32>) -> Result<Prediction> {
        self.model.predict(features)
    }

    /// Preprocess one recording (no label) and classify it
    pub fn predict_file(&self, path: impl AsRef<Path>) -> Result<Prediction> {
        let features = self.preprocessor.features(path)?;
        self.predict_features(&features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranked_descending() {
        let p = Prediction::from_probabilities([0.1, 0.6, 0.05, 0.25]).unwrap();
        let ranked: Vec<SignalClass> = p.ranked().into_iter().map(|(c, _)| c).collect();
        assert_eq!(
            ranked,
            vec![
                SignalClass::Normal,
                SignalClass::Ruido,
                SignalClass::Espicula,
                SignalClass::Piscada
            ]
        );
        assert_eq!(p.top().0, SignalClass::Normal);
    }

    #[test]
    fn test_wrong_arity() {
        assert!(Prediction::from_probabilities([0.5, 0.5]).is_err());
    }

    #[test]
    fn test_display_percentages() {
        let p = Prediction::from_probabilities([1.0, 0.0, 0.0, 0.0]).unwrap();
        let text = p.to_string();
        assert!(text.starts_with("Espícula = 100.00%"));
        assert!(text.contains("Ruído = 0.00%"));
    }

    #[test]
    fn test_predictor_rejects_mismatched_window() {
        let network = NeuralNetwork::classifier(16, &[4], NUM_CLASSES, 1).unwrap();
        assert!(Predictor::new(network, RecordingLayout::default()).is_err());
    }
}
