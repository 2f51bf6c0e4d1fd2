//! Training metadata document

use super::{parse_artifact, read_artifact};
use crate::error::LoadError;
use crate::models::ModelVariant;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// Metadata written by the training run. The fields the service inspects
/// are typed; anything else is kept in `extra` and passed through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub created_utc: String,
    pub dataset: String,
    pub task: String,
    pub n_samples: BTreeMap<String, u64>,
    pub n_features: usize,
    pub models: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ModelMetadata {
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let bytes = read_artifact(path)?;
        parse_artifact(path, &bytes)
    }

    /// Metric summary recorded for a variant, if any
    pub fn model_summary(&self, variant: ModelVariant) -> Option<&Value> {
        self.models.get(variant.metadata_key())
    }
}
