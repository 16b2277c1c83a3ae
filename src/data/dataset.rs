//! Lazy, restartable dataset over an organized split directory
//!
//! Layout: `<split_root>/<class_dir>/<file>`. Every call to
//! [`SplitDataset::epoch`] re-enumerates the tree and reshuffles according
//! to the [`ShufflePolicy`]; samples are preprocessed one at a time as the
//! consumer pulls them.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::preprocess::{Preprocessor, Sample};
use crate::error::{ClassifierError, Result};
use crate::organize::Split;

/// How file order changes between epochs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShufflePolicy {
    /// Sorted enumeration order
    Disabled,
    /// The same shuffled order every epoch (generator reseeded per epoch)
    Fixed,
    /// A new order every epoch drawn from one seeded stream
    #[default]
    Fresh,
}

/// A recording path with the class directory it was found in
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct LabelledPath {
    pub class_dir: String,
    pub path: PathBuf,
}

/// One split of an organized dataset
pub struct SplitDataset {
    root: PathBuf,
    preprocessor: Preprocessor,
    policy: ShufflePolicy,
    seed: u64,
    rng: StdRng,
}

impl SplitDataset {
    pub fn new(
        root: impl Into<PathBuf>,
        preprocessor: Preprocessor,
        policy: ShufflePolicy,
        seed: u64,
    ) -> Self {
        Self {
            root: root.into(),
            preprocessor,
            policy,
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Dataset for `<dataset_root>/<split>`
    pub fn for_split(
        dataset_root: impl AsRef<Path>,
        split: Split,
        preprocessor: Preprocessor,
        policy: ShufflePolicy,
        seed: u64,
    ) -> Self {
        Self::new(
            dataset_root.as_ref().join(split.dir_name()),
            preprocessor,
            policy,
            seed,
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All files two levels below the split root, in sorted order
    pub fn files(&self) -> Result<Vec<LabelledPath>> {
        let mut files = Vec::new();

        for class_entry in read_dir_sorted(&self.root)? {
            if !class_entry.is_dir() {
                continue;
            }
            let class_dir = class_entry
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            for path in read_dir_sorted(&class_entry)? {
                if path.is_file() {
                    files.push(LabelledPath {
                        class_dir: class_dir.clone(),
                        path,
                    });
                }
            }
        }

        Ok(files)
    }

    /// Start a new pass over the split
    pub fn epoch(&mut self) -> Result<Epoch> {
        let mut files = self.files()?;

        match self.policy {
            ShufflePolicy::Disabled => {}
            ShufflePolicy::Fixed => {
                let mut rng = StdRng::seed_from_u64(self.seed);
                files.shuffle(&mut rng);
            }
            ShufflePolicy::Fresh => files.shuffle(&mut self.rng),
        }

        debug!(root = %self.root.display(), files = files.len(), "starting epoch");
        Ok(Epoch {
            entries: files.into_iter(),
            preprocessor: self.preprocessor,
        })
    }
}

fn read_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = fs::read_dir(dir)
        .map_err(|e| ClassifierError::io(dir, e))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| ClassifierError::io(dir, e))?;
    paths.sort();
    Ok(paths)
}

/// A single pass over a split; yields one preprocessed sample per file
pub struct Epoch {
    entries: std::vec::IntoIter<LabelledPath>,
    preprocessor: Preprocessor,
}

impl Epoch {
    /// Files not yet consumed, in yield order
    pub fn remaining(&self) -> &[LabelledPath] {
        self.entries.as_slice()
    }
}

impl Iterator for Epoch {
    type Item = Result<Sample>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.next()?;
        Some(
            self.preprocessor
                .labelled_sample(&entry.path, &entry.class_dir),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl ExactSizeIterator for Epoch {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecordingLayout;
    use std::io::Write;

    fn layout() -> RecordingLayout {
        RecordingLayout {
            header_lines: 1,
            skip_lines: 1,
            window_len: 3,
        }
    }

    fn write(path: &Path, window: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut f = fs::File::create(path).unwrap();
        writeln!(f, "header\n0\n{}", window).unwrap();
    }

    fn build_split(root: &Path) {
        for i in 0..6 {
            write(&root.join("normal").join(format!("n{}.pdr", i)), "1\n2\n3");
            write(&root.join("ruido").join(format!("r{}.pdr", i)), "3\n2\n1");
        }
        write(&root.join("stray.pdr"), "1\n2\n3");
    }

    fn order(epoch: &Epoch) -> Vec<PathBuf> {
        epoch.remaining().iter().map(|e| e.path.clone()).collect()
    }

    #[test]
    fn test_enumerates_two_levels_only() {
        let dir = tempfile::tempdir().unwrap();
        build_split(dir.path());

        let ds = SplitDataset::new(
            dir.path(),
            Preprocessor::new(layout()),
            ShufflePolicy::Disabled,
            1,
        );
        let files = ds.files().unwrap();
        assert_eq!(files.len(), 12);
        assert!(files.iter().all(|f| f.class_dir == "normal" || f.class_dir == "ruido"));
    }

    #[test]
    fn test_yields_labelled_samples_lazily() {
        let dir = tempfile::tempdir().unwrap();
        build_split(dir.path());

        let mut ds = SplitDataset::new(
            dir.path(),
            Preprocessor::new(layout()),
            ShufflePolicy::Fresh,
            1,
        );
        let mut epoch = ds.epoch().unwrap();
        assert_eq!(epoch.len(), 12);

        let first = epoch.next().unwrap().unwrap();
        assert_eq!(epoch.len(), 11);
        assert_eq!(first.features.len(), 3);
        assert_eq!(first.label[first.class.index()], 1.0);
    }

    #[test]
    fn test_fixed_policy_repeats_order() {
        let dir = tempfile::tempdir().unwrap();
        build_split(dir.path());

        let mut ds = SplitDataset::new(
            dir.path(),
            Preprocessor::new(layout()),
            ShufflePolicy::Fixed,
            7,
        );
        let a = order(&ds.epoch().unwrap());
        let b = order(&ds.epoch().unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn test_fresh_policy_is_reproducible_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        build_split(dir.path());

        let make = || {
            SplitDataset::new(
                dir.path(),
                Preprocessor::new(layout()),
                ShufflePolicy::Fresh,
                7,
            )
        };
        let mut ds1 = make();
        let mut ds2 = make();

        let a1 = order(&ds1.epoch().unwrap());
        let a2 = order(&ds1.epoch().unwrap());
        let b1 = order(&ds2.epoch().unwrap());
        let b2 = order(&ds2.epoch().unwrap());

        assert_eq!(a1, b1);
        assert_eq!(a2, b2);
        assert_ne!(a1, a2);
    }

    #[test]
    fn test_unknown_class_dir_yields_error() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("artefato").join("a.pdr"), "1\n2\n3");

        let mut ds = SplitDataset::new(
            dir.path(),
            Preprocessor::new(layout()),
            ShufflePolicy::Disabled,
            1,
        );
        let result = ds.epoch().unwrap().next().unwrap();
        assert!(matches!(result, Err(ClassifierError::UnknownClass(_))));
    }

    #[test]
    fn test_missing_split_root() {
        let dir = tempfile::tempdir().unwrap();
        let mut ds = SplitDataset::new(
            dir.path().join("training"),
            Preprocessor::new(layout()),
            ShufflePolicy::Disabled,
            1,
        );
        assert!(matches!(
            ds.epoch(),
            Err(ClassifierError::FileNotFound { .. })
        ));
    }
}
