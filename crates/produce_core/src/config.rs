use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::knn::DEFAULT_K;

/// Settings for training and classification.
///
/// Feature geometry is not configurable; see [`crate::features`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Root of the labeled training corpus.
    pub dataset_root: PathBuf,
    /// Number of neighbors consulted per query.
    pub k: usize,
    /// Recurse into subdirectories when scanning a folder of query images.
    pub recursive: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            dataset_root: PathBuf::from("dataset"),
            k: DEFAULT_K,
            recursive: false,
        }
    }
}

impl ClassifierConfig {
    /// Reads and validates a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(Error::InvalidConfig("k must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_document_yields_defaults() -> Result<()> {
        assert_eq!(ClassifierConfig::from_toml_str("")?, ClassifierConfig::default());
        Ok(())
    }

    #[test]
    fn partial_document_overrides_given_fields() -> Result<()> {
        let cfg = ClassifierConfig::from_toml_str("k = 5\ndataset_root = \"/data/fruit\"")?;
        assert_eq!(cfg.k, 5);
        assert_eq!(cfg.dataset_root, PathBuf::from("/data/fruit"));
        assert!(!cfg.recursive);
        Ok(())
    }

    #[test]
    fn zero_k_is_rejected() {
        assert!(matches!(
            ClassifierConfig::from_toml_str("k = 0"),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        assert!(matches!(
            ClassifierConfig::from_toml_str("k = \"three\""),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn load_reads_file() -> anyhow::Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "recursive = true")?;
        let cfg = ClassifierConfig::load(file.path())?;
        assert!(cfg.recursive);
        assert_eq!(cfg.k, DEFAULT_K);
        Ok(())
    }
}
