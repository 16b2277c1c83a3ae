//! Classify a single recording with a saved model
//!
//! Usage: cargo run --bin predict -- --model model/model.json testing/espicula/file.pdr

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use eeg_event_classifier::{init_logging, Config, Predictor};

#[derive(Parser, Debug)]
#[command(author, version, about = "Classify one EEG recording")]
struct Args {
    /// Recording to classify
    recording: PathBuf,

    /// Saved model file
    #[arg(short, long, default_value = "model/model.json")]
    model: PathBuf,

    /// TOML configuration file (for the recording layout)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print classes by descending probability
    #[arg(long)]
    ranked: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => Config::from_toml(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    let predictor = Predictor::load(&args.model, config.layout)
        .with_context(|| format!("Failed to load model {}", args.model.display()))?;
    let prediction = predictor
        .predict_file(&args.recording)
        .with_context(|| format!("Failed to classify {}", args.recording.display()))?;

    if args.ranked {
        for (class, p) in prediction.ranked() {
            println!("{} = {:.2}%", class, p * 100.0);
        }
    } else {
        print!("{}", prediction);
    }

    Ok(())
}
