//! Training corpus ingestion.
//!
//! The corpus is a root directory whose immediate subdirectories are
//! labels; each holds the images for that label at its top level.

use std::path::Path;

use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::features::{self, FeatureVector};
use crate::labels::{LabelCode, LabelIndex};

/// File extensions accepted as images, compared case-insensitively.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// One training image after feature extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledSample {
    pub features: FeatureVector,
    pub label: String,
}

/// Feature vectors paired with label codes, plus the index resolving them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingSet {
    samples: Vec<(FeatureVector, LabelCode)>,
    labels: LabelIndex,
}

impl TrainingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sample, interning its label if it has not been seen yet.
    pub fn push(&mut self, sample: LabeledSample) -> LabelCode {
        let code = self.labels.intern(&sample.label);
        self.samples.push((sample.features, code));
        code
    }

    pub fn samples(&self) -> &[(FeatureVector, LabelCode)] {
        &self.samples
    }

    pub fn labels(&self) -> &LabelIndex {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl FromIterator<LabeledSample> for TrainingSet {
    fn from_iter<I: IntoIterator<Item = LabeledSample>>(iter: I) -> Self {
        let mut set = TrainingSet::new();
        for sample in iter {
            set.push(sample);
        }
        set
    }
}

/// Builds a training set from a labeled directory tree.
///
/// Label directories and the files within them are visited in file-name
/// order, so label codes and training order are reproducible. Files that
/// fail to decode are logged and skipped.
pub fn load(root: impl AsRef<Path>) -> Result<TrainingSet> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(Error::PathNotFound(root.to_path_buf()));
    }

    let mut set = TrainingSet::new();
    for label_dir in sorted_entries(root) {
        let path = label_dir.path();
        if !path.is_dir() {
            continue;
        }
        let label = label_dir.file_name().to_string_lossy().into_owned();
        let before = set.len();
        for file in sorted_entries(path) {
            let file = file.path();
            if !file.is_file() || !is_supported_image(file) {
                continue;
            }
            match features::decode_file(file).and_then(|img| features::extract(&img)) {
                Ok(features) => {
                    set.push(LabeledSample {
                        features,
                        label: label.clone(),
                    });
                }
                Err(e) => tracing::warn!("Skipping {}: {e}", file.display()),
            }
        }
        tracing::debug!(
            "Loaded {} samples for label {label:?} from {}",
            set.len() - before,
            path.display()
        );
    }

    if set.is_empty() {
        return Err(Error::EmptyDataset(root.to_path_buf()));
    }
    tracing::info!(
        "Loaded {} training samples across {} labels from {}",
        set.len(),
        set.labels().len(),
        root.display()
    );
    Ok(set)
}

/// Immediate children of `dir`, sorted by file name.
fn sorted_entries(dir: &Path) -> impl Iterator<Item = walkdir::DirEntry> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                tracing::warn!("walkdir error: {}", e);
                None
            }
        })
}

pub(crate) fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|s| s.to_str()) {
        Some(ext) => {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}
