//! Training loop
//!
//! Streams each epoch from a [`SplitDataset`], batching samples as they are
//! preprocessed, and scores the validation split after every epoch.

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use super::classifier::{stack_samples, Classifier};
use super::metrics::{Accumulator, ConfusionMatrix, EpochMetrics, PassMetrics, TrainingHistory};
use crate::config::TrainingConfig;
use crate::data::{Epoch, Sample, SplitDataset, NUM_CLASSES};
use crate::error::{ClassifierError, Result};
use crate::nn::{optimizer, NeuralNetwork};

/// Drives a [`Classifier`] over organized splits
pub struct Trainer {
    config: TrainingConfig,
    stop: Option<Arc<AtomicBool>>,
    progress: bool,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            stop: None,
            progress: false,
        }
    }

    /// Check `flag` between recordings and stop when it is set
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop = Some(flag);
        self
    }

    /// Show a progress bar per epoch
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.progress = enabled;
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Fresh network shaped by the configuration
    pub fn build_network(&self, input_size: usize) -> Result<NeuralNetwork> {
        let mut network = NeuralNetwork::classifier(
            input_size,
            &self.config.hidden_layers,
            NUM_CLASSES,
            self.config.seed,
        )?;
        network.set_optimizer(optimizer::from_config(&self.config));
        Ok(network)
    }

    fn stop_requested(&self) -> bool {
        self.stop
            .as_ref()
            .map(|f| f.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    fn progress_bar(&self, len: usize, label: &str) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message(label.to_string());
        pb
    }

    /// Pull the next sample, skipping malformed recordings when configured
    fn next_sample(&self, epoch: &mut Epoch, acc: &mut Accumulator) -> Option<Result<Sample>> {
        loop {
            match epoch.next()? {
                Ok(sample) => return Some(Ok(sample)),
                Err(e) if self.config.skip_invalid && e.is_recording_error() => {
                    warn!("skipping recording: {}", e);
                    acc.skip();
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }

    /// Train for the configured number of epochs.
    ///
    /// Each epoch re-enumerates `train`; `validation` is scored after every
    /// epoch when given. A set stop flag is checked before each recording;
    /// the unfinished batch is discarded, the epoch is not recorded and the
    /// history is marked as stopped.
    pub fn fit<C: Classifier>(
        &self,
        model: &mut C,
        train: &mut SplitDataset,
        mut validation: Option<&mut SplitDataset>,
    ) -> Result<TrainingHistory> {
        let mut history = TrainingHistory::default();
        info!(
            epochs = self.config.epochs,
            batch_size = self.config.batch_size,
            root = %train.root().display(),
            "starting training"
        );

        for epoch_index in 0..self.config.epochs {
            let mut epoch = train.epoch()?;
            let pb = self.progress_bar(epoch.len(), &format!("epoch {}", epoch_index + 1));
            let mut acc = Accumulator::default();
            let mut batch = Vec::with_capacity(self.config.batch_size);

            loop {
                if self.stop_requested() {
                    history.stopped = true;
                    break;
                }
                match self.next_sample(&mut epoch, &mut acc) {
                    Some(sample) => batch.push(sample?),
                    None => break,
                }
                if batch.len() == self.config.batch_size {
                    self.step(model, &batch, &mut acc)?;
                    pb.inc(batch.len() as u64);
                    batch.clear();
                }
            }
            if !history.stopped && !batch.is_empty() {
                self.step(model, &batch, &mut acc)?;
                pb.inc(batch.len() as u64);
            }
            pb.finish_and_clear();

            if history.stopped {
                warn!(epoch = epoch_index + 1, "training stopped");
                break;
            }

            let train_metrics = acc.finish();
            if train_metrics.samples == 0 {
                return Err(ClassifierError::Model(format!(
                    "no usable training recordings under {}",
                    train.root().display()
                )));
            }

            let validation_metrics = match validation.as_deref_mut() {
                Some(ds) => Some(self.evaluate(model, ds)?.0),
                None => None,
            };

            let metrics = EpochMetrics {
                epoch: epoch_index + 1,
                train: train_metrics,
                validation: validation_metrics,
            };
            info!("{}", metrics);
            history.epochs.push(metrics);
        }

        if let Some(acc) = history.final_validation_accuracy() {
            info!("validation accuracy = {:.2}%", acc * 100.0);
        }
        Ok(history)
    }

    fn step<C: Classifier>(
        &self,
        model: &mut C,
        batch: &[Sample],
        acc: &mut Accumulator,
    ) -> Result<()> {
        let (x, y) = stack_samples(batch)?;
        let (loss, correct) = model.train_batch(&x, &y)?;
        acc.add_batch(loss, correct, batch.len());
        Ok(())
    }

    /// Score a split without training; also returns its confusion matrix
    pub fn evaluate<C: Classifier>(
        &self,
        model: &C,
        dataset: &mut SplitDataset,
    ) -> Result<(PassMetrics, ConfusionMatrix)> {
        let mut epoch = dataset.epoch()?;
        let mut acc = Accumulator::default();
        let mut confusion = ConfusionMatrix::default();
        let mut batch = Vec::with_capacity(self.config.batch_size);

        loop {
            let next = self.next_sample(&mut epoch, &mut acc);
            let done = next.is_none();
            if let Some(sample) = next {
                batch.push(sample?);
            }

            if batch.len() == self.config.batch_size || (done && !batch.is_empty()) {
                let (x, y) = stack_samples(&batch)?;
                let (loss, correct) = model.evaluate_batch(&x, &y)?;
                acc.add_batch(loss, correct, batch.len());

                for sample in &batch {
                    let (predicted, _) = model.predict(&sample.features)?.top();
                    confusion.record(sample.class, predicted);
                }
                batch.clear();
            }
            if done {
                break;
            }
        }

        Ok((acc.finish(), confusion))
    }
}
