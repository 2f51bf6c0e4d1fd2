//! Per-variant model manifest
//!
//! A manifest carries the feature importances and either an inline tree
//! ensemble or a reference to an ONNX graph next to it:
//!
//! ```json
//! { "feature_importances": [0.12, 0.03],
//!   "model": { "format": "tree_ensemble", "aggregation": "mean_probability", "trees": [...] } }
//! { "feature_importances": [0.12, 0.03],
//!   "model": { "format": "onnx", "path": "model_lgbm.onnx" } }
//! ```

use super::{parse_artifact, read_artifact, FeatureSchema, ModelArtifact};
use crate::error::LoadError;
use crate::models::ModelVariant;
use crate::predictor::{Classifier, EnsembleSpec, OnnxClassifier, TreeEnsemble};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::info;

/// How the classifier itself is stored
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum ModelSpec {
    TreeEnsemble(EnsembleSpec),
    Onnx { path: PathBuf },
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelManifest {
    pub feature_importances: Vec<f64>,
    pub model: ModelSpec,
}

impl ModelManifest {
    /// Read a manifest, returning it with the SHA-256 of its bytes
    pub fn load(path: &Path) -> Result<(Self, String), LoadError> {
        let bytes = read_artifact(path)?;
        let digest = hex::encode(Sha256::digest(&bytes));
        let manifest = parse_artifact(path, &bytes)?;
        Ok((manifest, digest))
    }

    /// Validate against the schema and build the runnable artifact.
    ///
    /// ONNX paths are resolved relative to the manifest's directory.
    pub fn build(
        self,
        variant: ModelVariant,
        manifest_path: &Path,
        schema: &FeatureSchema,
        digest: String,
    ) -> Result<ModelArtifact, LoadError> {
        if self.feature_importances.len() != schema.len() {
            return Err(LoadError::invalid(
                manifest_path,
                format!(
                    "{} feature importances for {} schema features",
                    self.feature_importances.len(),
                    schema.len()
                ),
            ));
        }
        if let Some(bad) = self.feature_importances.iter().find(|v| !v.is_finite()) {
            return Err(LoadError::invalid(
                manifest_path,
                format!("non-finite feature importance {}", bad),
            ));
        }

        let classifier: Box<dyn Classifier> = match self.model {
            ModelSpec::TreeEnsemble(spec) => {
                let ensemble = TreeEnsemble::new(spec, schema.len())
                    .map_err(|reason| LoadError::invalid(manifest_path, reason))?;
                info!(
                    model = %variant,
                    trees = ensemble.tree_count(),
                    "Tree ensemble loaded"
                );
                Box::new(ensemble)
            }
            ModelSpec::Onnx { path } => {
                let onnx_path = manifest_path
                    .parent()
                    .map(|dir| dir.join(&path))
                    .unwrap_or(path);
                info!(model = %variant, path = %onnx_path.display(), "Loading ONNX model");
                Box::new(OnnxClassifier::load(&onnx_path, schema.len())?)
            }
        };

        Ok(ModelArtifact::new(
            variant,
            classifier,
            self.feature_importances,
            digest,
        ))
    }
}
