//! Error taxonomy for artifact loading, prediction and dataset access

use std::path::PathBuf;
use thiserror::Error;

/// Failure while loading artifacts into the model cache.
///
/// Fatal to the cache's loaded state, not to the process.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("artifact not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed artifact {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid artifact {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },

    #[error("failed to prepare ONNX model {}: {message}", path.display())]
    Onnx { path: PathBuf, message: String },
}

impl LoadError {
    pub(crate) fn invalid(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        LoadError::Invalid {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Path of the artifact that failed
    pub fn path(&self) -> &std::path::Path {
        match self {
            LoadError::Missing { path }
            | LoadError::Io { path, .. }
            | LoadError::Malformed { path, .. }
            | LoadError::Invalid { path, .. }
            | LoadError::Onnx { path, .. } => path,
        }
    }
}

/// The cache was read before a successful load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Models not loaded. Server may still be starting up.")]
pub struct NotLoadedError;

/// A model variant outside {rf, lgbm} was requested.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown model type: {0}")]
pub struct UnknownVariantError(pub String);

/// A supplied feature value could not be used as a number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Feature '{feature}' must be numeric, got {found}")]
pub struct AlignmentError {
    pub feature: String,
    pub found: String,
}

/// Any rejection surfaced by the predictor.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error(transparent)]
    NotLoaded(#[from] NotLoadedError),

    #[error(transparent)]
    UnknownVariant(#[from] UnknownVariantError),

    #[error(transparent)]
    Alignment(#[from] AlignmentError),

    #[error("Prediction error: {0}")]
    Inference(String),
}

impl PredictError {
    /// Short label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            PredictError::NotLoaded(_) => "not_loaded",
            PredictError::UnknownVariant(_) => "unknown_variant",
            PredictError::Alignment(_) => "alignment",
            PredictError::Inference(_) => "inference",
        }
    }
}

/// Failure while serving a dataset page.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Dataset not found: {}. Please run data preparation notebooks first.", path.display())]
    NotFound { path: PathBuf },

    #[error("Error loading dataset: {0}")]
    Unreadable(String),

    #[error("Page {page} exceeds total pages {total_pages}")]
    PageOutOfRange { page: usize, total_pages: usize },

    #[error("{0}")]
    InvalidQuery(String),
}
