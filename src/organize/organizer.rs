//! Dataset organizer
//!
//! Copies a flat directory of raw recordings into
//! `<dest>/<split>/<class>/<file>`. Sources are never moved or modified.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::split::{Split, SplitThresholds};
use crate::config::OrganizerConfig;
use crate::data::SignalClass;
use crate::error::{ClassifierError, Result};

/// Where one source file goes
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub split: Split,
    pub class: SignalClass,
}

/// Outcome of an organize run
#[derive(Debug, Clone, Default)]
pub struct OrganizeReport {
    pub copied: Vec<Placement>,
    /// Files matching no class prefix
    pub skipped: Vec<PathBuf>,
}

impl OrganizeReport {
    /// Number of files copied into each split/class directory
    pub fn counts(&self) -> BTreeMap<(Split, SignalClass), usize> {
        let mut counts = BTreeMap::new();
        for p in &self.copied {
            *counts.entry((p.split, p.class)).or_insert(0) += 1;
        }
        counts
    }

    pub fn split_count(&self, split: Split) -> usize {
        self.copied.iter().filter(|p| p.split == split).count()
    }
}

/// Assigns raw recordings to splits and copies them into the class tree
#[derive(Debug, Clone)]
pub struct DatasetOrganizer {
    source: PathBuf,
    destination: PathBuf,
    thresholds: SplitThresholds,
    seed: u64,
}

impl DatasetOrganizer {
    pub fn new(
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        config: &OrganizerConfig,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            thresholds: SplitThresholds::from(config),
            seed: config.seed,
        }
    }

    /// Create every split/class directory. Existing directories are fine.
    pub fn prepare_tree(&self) -> Result<()> {
        for split in Split::ALL {
            for class in SignalClass::ALL {
                let dir = self.class_dir(split, class);
                fs::create_dir_all(&dir).map_err(|e| ClassifierError::io(&dir, e))?;
            }
        }
        Ok(())
    }

    pub fn class_dir(&self, split: Split, class: SignalClass) -> PathBuf {
        self.destination
            .join(split.dir_name())
            .join(class.dir_name())
    }

    /// Decide placements without touching the destination.
    ///
    /// Files are visited in sorted name order and every file consumes exactly
    /// one draw, including those that match no class.
    pub fn plan<R: Rng>(&self, rng: &mut R) -> Result<OrganizeReport> {
        let mut report = OrganizeReport::default();

        for source in list_files(&self.source)? {
            let draw: f64 = rng.gen();
            let split = self.thresholds.assign(draw);

            let file_name = match source.file_name() {
                Some(name) => name.to_owned(),
                None => continue,
            };

            match class_of(&file_name) {
                Some(class) => {
                    let destination = self.class_dir(split, class).join(&file_name);
                    report.copied.push(Placement {
                        source,
                        destination,
                        split,
                        class,
                    });
                }
                None if file_name.to_str().is_none() => {
                    warn!(file = %source.display(), "undecodable file name, skipping");
                    report.skipped.push(source);
                }
                None => {
                    debug!(file = %source.display(), "no class prefix, skipping");
                    report.skipped.push(source);
                }
            }
        }

        Ok(report)
    }

    /// Organize with the configured seed
    pub fn run(&self) -> Result<OrganizeReport> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        self.run_with_rng(&mut rng)
    }

    /// Organize using the given generator.
    ///
    /// The first failing copy aborts the run; files copied before it stay in
    /// place and the error names the offending path.
    pub fn run_with_rng<R: Rng>(&self, rng: &mut R) -> Result<OrganizeReport> {
        self.prepare_tree()?;
        let report = self.plan(rng)?;

        for placement in &report.copied {
            fs::copy(&placement.source, &placement.destination)
                .map_err(|e| ClassifierError::io(&placement.destination, e))?;
            debug!(
                from = %placement.source.display(),
                split = %placement.split,
                class = placement.class.dir_name(),
                "copied"
            );
        }

        info!(
            copied = report.copied.len(),
            skipped = report.skipped.len(),
            training = report.split_count(Split::Training),
            validation = report.split_count(Split::Validation),
            testing = report.split_count(Split::Testing),
            "organized dataset"
        );
        Ok(report)
    }
}

/// Class of a raw file name. Names that are not UTF-8 are read as Latin-1,
/// which turns CP850 bytes into the legacy prefix spellings.
fn class_of(file_name: &OsStr) -> Option<SignalClass> {
    match file_name.to_str() {
        Some(name) => SignalClass::from_file_name(name),
        None => SignalClass::from_file_name(&latin1(file_name)),
    }
}

#[cfg(unix)]
fn latin1(name: &OsStr) -> String {
    use std::os::unix::ffi::OsStrExt;
    name.as_bytes().iter().map(|&b| b as char).collect()
}

#[cfg(not(unix))]
fn latin1(name: &OsStr) -> String {
    name.to_string_lossy().into_owned()
}

fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| ClassifierError::io(dir, e))? {
        let path = entry.map_err(|e| ClassifierError::io(dir, e))?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
