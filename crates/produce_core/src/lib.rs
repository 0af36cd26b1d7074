//! Produce freshness classification by nearest-neighbor lookup against a
//! labeled reference set of images.

use anyhow::{Context, Result as AnyResult};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod knn;
pub mod labels;

pub use config::ClassifierConfig;
pub use dataset::{LabeledSample, TrainingSet};
pub use error::{Error, Result};
pub use features::{FEATURE_LEN, FeatureVector};
pub use knn::{Classification, Decision, KnnClassifier};
pub use labels::{LabelCode, LabelIndex};

/// Host-facing entry point: train once from a directory, then classify.
#[derive(Debug, Clone)]
pub struct Recognizer {
    k: usize,
    model: Option<KnnClassifier>,
}

impl Recognizer {
    pub fn new(k: usize) -> Result<Self> {
        if k == 0 {
            return Err(Error::InvalidConfig("k must be at least 1".into()));
        }
        Ok(Self { k, model: None })
    }

    pub fn from_config(cfg: &ClassifierConfig) -> Result<Self> {
        cfg.validate()?;
        Self::new(cfg.k)
    }

    /// Loads the corpus under `root` and installs it as the model.
    ///
    /// The new model is fully built before it replaces the current one; on
    /// error the current model stays in place.
    pub fn train_from_directory(&mut self, root: impl AsRef<Path>) -> Result<()> {
        let training = dataset::load(root)?;
        self.model = Some(KnnClassifier::train(self.k, training)?);
        Ok(())
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    pub fn classify(&self, image: &DynamicImage) -> Result<Classification> {
        let model = self.model.as_ref().ok_or(Error::NotTrained)?;
        let features = features::extract(image)?;
        model.predict(&features)
    }

    pub fn classify_file(&self, path: impl AsRef<Path>) -> Result<Classification> {
        // fail before decoding when there is nothing to compare against
        if self.model.is_none() {
            return Err(Error::NotTrained);
        }
        self.classify(&features::decode_file(path)?)
    }

    pub fn classify_bytes(&self, bytes: &[u8]) -> Result<Classification> {
        if self.model.is_none() {
            return Err(Error::NotTrained);
        }
        self.classify(&features::decode_bytes(bytes)?)
    }

    /// Classifies every row in place, reporting `(done, total)` after each.
    ///
    /// A row that cannot be classified keeps `classification: None`.
    pub fn classify_rows<F>(&self, rows: &mut [ImageInfo], mut progress: F) -> Result<()>
    where
        F: FnMut(usize, usize),
    {
        if self.model.is_none() {
            return Err(Error::NotTrained);
        }
        let total = rows.len();
        for (idx, info) in rows.iter_mut().enumerate() {
            match self.classify_file(&info.file) {
                Ok(classification) => info.classification = Some(classification),
                Err(err) => {
                    tracing::warn!("Classification failed for {}: {err}", info.file.display());
                    info.classification = None;
                }
            }
            progress(idx + 1, total);
        }
        Ok(())
    }
}

/// A query image and, once classified, its result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub file: PathBuf,
    pub classification: Option<Classification>,
}

/// Options controlling how folder scanning behaves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOptions {
    /// When true, scan subdirectories recursively.
    pub recursive: bool,
}

/// Scan a folder for query images and produce unclassified `ImageInfo` rows.
pub fn scan_folder(path: impl AsRef<Path>) -> AnyResult<Vec<ImageInfo>> {
    scan_folder_with(path, ScanOptions::default())
}

/// Scan a folder with options. Rows come back sorted by path.
pub fn scan_folder_with(path: impl AsRef<Path>, opts: ScanOptions) -> AnyResult<Vec<ImageInfo>> {
    let root = path.as_ref();
    if !root.exists() {
        anyhow::bail!("Path does not exist: {}", root.display());
    }
    if !root.is_dir() {
        anyhow::bail!("Path is not a directory: {}", root.display());
    }

    let walker = if opts.recursive {
        WalkDir::new(root)
    } else {
        WalkDir::new(root).max_depth(1)
    };

    let mut infos = Vec::new();
    for entry in walker.sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("walkdir error: {}", e);
                continue;
            }
        };
        let path = entry.path();
        if path.is_file() && dataset::is_supported_image(path) {
            infos.push(ImageInfo {
                file: path.to_path_buf(),
                classification: None,
            });
        }
    }

    Ok(infos)
}

/// Export the provided rows to CSV with headers: file,label,confidence
pub fn export_csv(rows: &[ImageInfo], path: impl AsRef<Path>) -> AnyResult<()> {
    let path = path.as_ref();
    let context = || format!("writing {}", path.display());
    let mut wtr = csv::Writer::from_path(path).with_context(context)?;
    wtr.write_record(["file", "label", "confidence"]).with_context(context)?;

    for info in rows {
        let (label, confidence) = match &info.classification {
            Some(c) => (c.decision.to_string(), format!("{}", c.confidence)),
            None => (String::new(), String::new()),
        };
        wtr.write_record([
            info.file.to_string_lossy().as_ref(),
            label.as_str(),
            confidence.as_str(),
        ])
        .with_context(context)?;
    }

    wtr.flush().with_context(context)?;
    Ok(())
}
