//! Train the event classifier on an organized dataset
//!
//! Usage: cargo run --bin train -- --dataset . --preset baseline --model model/model.json

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use eeg_event_classifier::{
    init_logging, Config, Preprocessor, Preset, Split, SplitDataset, Trainer,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Train the EEG event classifier")]
struct Args {
    /// Root of the organized tree (contains training/ and validation/)
    #[arg(short, long, default_value = ".")]
    dataset: PathBuf,

    /// Output model file
    #[arg(short, long, default_value = "model/model.json")]
    model: PathBuf,

    /// TOML configuration file (takes precedence over --preset)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Training variant: baseline, momentum or adam
    #[arg(short, long, default_value = "baseline")]
    preset: String,

    /// Override the number of epochs
    #[arg(short, long)]
    epochs: Option<usize>,

    /// Override the batch size
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Override the learning rate
    #[arg(long)]
    lr: Option<f64>,

    /// Also report metrics on the testing split
    #[arg(long)]
    test: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = match &args.config {
        Some(path) => Config::from_toml(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::with_preset(args.preset.parse::<Preset>()?),
    };
    if let Some(epochs) = args.epochs {
        config.training.epochs = epochs;
    }
    if let Some(batch_size) = args.batch_size {
        config.training.batch_size = batch_size;
    }
    if let Some(lr) = args.lr {
        config.training.learning_rate = lr;
    }
    config.validate()?;

    let preprocessor = Preprocessor::new(config.layout);
    let t = &config.training;
    let split = |split: Split| {
        SplitDataset::for_split(&args.dataset, split, preprocessor, t.shuffle, t.seed)
    };
    let mut train = split(Split::Training);
    let mut validation = split(Split::Validation);

    let trainer = Trainer::new(t.clone()).with_progress(!args.verbose);
    let mut model = trainer.build_network(config.layout.window_len)?;
    model.summary();

    let history = trainer
        .fit(&mut model, &mut train, Some(&mut validation))
        .context("Training failed")?;

    model
        .save(&args.model)
        .with_context(|| format!("Failed to save model to {}", args.model.display()))?;
    info!(path = %args.model.display(), "model saved");

    let (val_metrics, confusion) = trainer.evaluate(&model, &mut validation)?;
    println!("Validation accuracy = {:.2}%", val_metrics.accuracy * 100.0);
    println!("{}", confusion);

    if args.test {
        let mut testing = split(Split::Testing);
        let (test_metrics, confusion) = trainer.evaluate(&model, &mut testing)?;
        println!("Testing accuracy = {:.2}%", test_metrics.accuracy * 100.0);
        println!("{}", confusion);
    }

    if let (Some(first), Some(last)) = (history.epochs.first(), history.last()) {
        println!(
            "Loss {:.4} -> {:.4} over {} epochs",
            first.train.loss,
            last.train.loss,
            history.epochs.len()
        );
    }

    Ok(())
}
