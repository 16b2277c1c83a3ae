//! Split a flat directory of raw recordings into the training tree
//!
//! Usage: cargo run --bin organize -- --source original_signals --dest .

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use eeg_event_classifier::{init_logging, Config, DatasetOrganizer, Split};

#[derive(Parser, Debug)]
#[command(author, version, about = "Organize raw recordings into training/validation/testing splits")]
struct Args {
    /// Flat directory of raw recordings
    #[arg(short, long, default_value = "original_signals")]
    source: PathBuf,

    /// Root of the organized tree
    #[arg(short, long, default_value = ".")]
    dest: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the split seed
    #[arg(long)]
    seed: Option<u64>,

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
        None => Config::default(),
    };
    if let Some(seed) = args.seed {
        config.organizer.seed = seed;
    }
    config.validate()?;

    info!(
        source = %args.source.display(),
        dest = %args.dest.display(),
        seed = config.organizer.seed,
        "organizing recordings"
    );

    let organizer = DatasetOrganizer::new(&args.source, &args.dest, &config.organizer);
    let report = organizer
        .run()
        .with_context(|| format!("Failed to organize {}", args.source.display()))?;

    println!("Copied {} recordings, skipped {}", report.copied.len(), report.skipped.len());
    for split in Split::ALL {
        println!("  {:<10} {}", split.dir_name(), report.split_count(split));
    }
    for ((split, class), count) in report.counts() {
        info!("{}/{}: {}", split, class.dir_name(), count);
    }

    Ok(())
}
