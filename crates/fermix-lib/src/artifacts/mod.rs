//! Trained-model artifacts and the in-process cache that holds them
//!
//! The offline training process leaves four files in one directory: a
//! manifest per model variant, the ordered feature list and a metadata
//! document. They are read once at startup into a [`ModelCache`].

mod cache;
mod manifest;
mod metadata;
mod schema;

pub use cache::{ModelArtifact, ModelCache};
pub use manifest::{ModelManifest, ModelSpec};
pub use metadata::ModelMetadata;
pub use schema::FeatureSchema;

use crate::error::LoadError;
use crate::models::ModelVariant;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

pub const RF_MODEL_FILE: &str = "model_rf.json";
pub const LGBM_MODEL_FILE: &str = "model_lgbm.json";
pub const FEATURES_FILE: &str = "features.json";
pub const METADATA_FILE: &str = "metadata.json";

/// Filesystem locations of every artifact the cache consumes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub rf_model: PathBuf,
    pub lgbm_model: PathBuf,
    pub features: PathBuf,
    pub metadata: PathBuf,
}

impl ArtifactPaths {
    /// Default file names inside a single models directory
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            rf_model: dir.join(RF_MODEL_FILE),
            lgbm_model: dir.join(LGBM_MODEL_FILE),
            features: dir.join(FEATURES_FILE),
            metadata: dir.join(METADATA_FILE),
        }
    }

    /// Manifest path for a variant
    pub fn model(&self, variant: ModelVariant) -> &Path {
        match variant {
            ModelVariant::RandomForest => &self.rf_model,
            ModelVariant::LightGbm => &self.lgbm_model,
        }
    }
}

/// Read an artifact file, mapping a missing file to [`LoadError::Missing`]
pub(crate) fn read_artifact(path: &Path) -> Result<Vec<u8>, LoadError> {
    std::fs::read(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            LoadError::Missing {
                path: path.to_path_buf(),
            }
        } else {
            LoadError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

pub(crate) fn parse_artifact<T: DeserializeOwned>(path: &Path, bytes: &[u8]) -> Result<T, LoadError> {
    serde_json::from_slice(bytes).map_err(|source| LoadError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}
