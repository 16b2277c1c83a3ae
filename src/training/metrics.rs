//! Training and evaluation metrics

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::data::{SignalClass, NUM_CLASSES};

/// Running loss/accuracy over a pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PassMetrics {
    /// Mean per-sample loss
    pub loss: f64,
    /// Fraction of samples classified correctly
    pub accuracy: f64,
    pub samples: usize,
    /// Recordings skipped as malformed
    pub skipped: usize,
}

/// Accumulates batch results into [`PassMetrics`]
#[derive(Debug, Default)]
pub(crate) struct Accumulator {
    loss_sum: f64,
    correct: usize,
    samples: usize,
    skipped: usize,
}

impl Accumulator {
    pub fn add_batch(&mut self, mean_loss: f64, correct: usize, size: usize) {
        self.loss_sum += mean_loss * size as f64;
        self.correct += correct;
        self.samples += size;
    }

    pub fn skip(&mut self) {
        self.skipped += 1;
    }

    pub fn finish(&self) -> PassMetrics {
        let n = self.samples.max(1) as f64;
        PassMetrics {
            loss: self.loss_sum / n,
            accuracy: self.correct as f64 / n,
            samples: self.samples,
            skipped: self.skipped,
        }
    }
}

/// Metrics for one training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// 1-based epoch number
    pub epoch: usize,
    pub train: PassMetrics,
    pub validation: Option<PassMetrics>,
}

impl fmt::Display for EpochMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Epoch {}: loss={:.4} acc={:.2}%",
            self.epoch,
            self.train.loss,
            self.train.accuracy * 100.0
        )?;
        if let Some(v) = &self.validation {
            write!(f, " val_loss={:.4} val_acc={:.2}%", v.loss, v.accuracy * 100.0)?;
        }
        Ok(())
    }
}

/// Everything recorded during `Trainer::fit`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochMetrics>,
    /// Set when the stop flag ended training early
    pub stopped: bool,
}

impl TrainingHistory {
    pub fn last(&self) -> Option<&EpochMetrics> {
        self.epochs.last()
    }

    pub fn final_validation_accuracy(&self) -> Option<f64> {
        self.last()
            .and_then(|e| e.validation.as_ref())
            .map(|v| v.accuracy)
    }

    /// Train losses in epoch order
    pub fn losses(&self) -> Vec<f64> {
        self.epochs.iter().map(|e| e.train.loss).collect()
    }
}

/// Counts of (actual, predicted) class pairs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// `counts[actual][predicted]`
    pub counts: [[usize; NUM_CLASSES]; NUM_CLASSES],
}

impl ConfusionMatrix {
    pub fn record(&mut self, actual: SignalClass, predicted: SignalClass) {
        self.counts[actual.index()][predicted.index()] += 1;
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn accuracy(&self) -> f64 {
        let correct: usize = (0..NUM_CLASSES).map(|i| self.counts[i][i]).sum();
        correct as f64 / self.total().max(1) as f64
    }

    /// Recall for one class; `None` when the class never occurs
    pub fn recall(&self, class: SignalClass) -> Option<f64> {
        let row = &self.counts[class.index()];
        let actual: usize = row.iter().sum();
        (actual > 0).then(|| row[class.index()] as f64 / actual as f64)
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>10}", "")?;
        for class in SignalClass::ALL {
            write!(f, "{:>10}", class.dir_name())?;
        }
        writeln!(f)?;
        for actual in SignalClass::ALL {
            write!(f, "{:>10}", actual.dir_name())?;
            for predicted in SignalClass::ALL {
                write!(f, "{:>10}", self.counts[actual.index()][predicted.index()])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
