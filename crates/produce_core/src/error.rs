use std::path::PathBuf;

/// Errors raised by the classification pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Dataset path does not exist or is not a directory: {}", .0.display())]
    PathNotFound(PathBuf),
    #[error("No usable training images found under {}", .0.display())]
    EmptyDataset(PathBuf),
    #[error("Cannot decode image {origin}: {reason}")]
    Decode { origin: String, reason: String },
    #[error("Feature vector has length {actual}, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Label was never interned: {0}")]
    UnknownLabel(String),
    #[error("Label code was never assigned: {0}")]
    UnknownCode(usize),
    #[error("No model has been trained yet")]
    NotTrained,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] toml::de::Error),
}

impl Error {
    pub(crate) fn decode(origin: impl Into<String>, reason: impl ToString) -> Self {
        Self::Decode {
            origin: origin.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
