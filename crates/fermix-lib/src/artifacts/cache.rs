//! In-process model cache
//!
//! Populated once by [`ModelCache::load`] before serving starts, then shared
//! read-only. Loading is all-or-nothing: a failure on any artifact leaves
//! the cache empty so callers only ever check one flag.

use super::{ArtifactPaths, FeatureSchema, ModelManifest, ModelMetadata};
use crate::error::{LoadError, NotLoadedError, PredictError};
use crate::models::ModelVariant;
use crate::predictor::{class_from_probabilities, Classifier};
use tracing::{info, warn};

/// A loaded classifier with its importance weights
pub struct ModelArtifact {
    variant: ModelVariant,
    classifier: Box<dyn Classifier>,
    feature_importances: Vec<f64>,
    digest: String,
}

impl ModelArtifact {
    pub fn new(
        variant: ModelVariant,
        classifier: Box<dyn Classifier>,
        feature_importances: Vec<f64>,
        digest: String,
    ) -> Self {
        Self {
            variant,
            classifier,
            feature_importances,
            digest,
        }
    }

    pub fn variant(&self) -> ModelVariant {
        self.variant
    }

    /// `[P(class 0), P(class 1)]` for one aligned row
    pub fn predict_proba(&self, row: &[f64]) -> Result<[f64; 2], PredictError> {
        self.classifier.predict_proba(row)
    }

    /// Class id (0 or 1) for one aligned row
    pub fn predict(&self, row: &[f64]) -> Result<u8, PredictError> {
        self.predict_proba(row).map(|p| class_from_probabilities(&p))
    }

    /// Importance weights, positionally aligned with the feature schema
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    /// SHA-256 (hex) of the manifest this model was loaded from
    pub fn digest(&self) -> &str {
        &self.digest
    }
}

impl std::fmt::Debug for ModelArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelArtifact")
            .field("variant", &self.variant)
            .field("features", &self.feature_importances.len())
            .field("digest", &self.digest)
            .finish()
    }
}

#[derive(Debug)]
struct LoadedArtifacts {
    random_forest: ModelArtifact,
    lightgbm: ModelArtifact,
    schema: FeatureSchema,
    metadata: ModelMetadata,
}

/// Holder for the model pair, feature schema and metadata
#[derive(Debug)]
pub struct ModelCache {
    paths: ArtifactPaths,
    loaded: Option<LoadedArtifacts>,
}

impl ModelCache {
    /// Create an empty, not-loaded cache
    pub fn new(paths: ArtifactPaths) -> Self {
        Self {
            paths,
            loaded: None,
        }
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    /// Load every artifact. On failure the cache is left not-loaded, even
    /// if it held artifacts from an earlier load.
    pub fn load(&mut self) -> Result<(), LoadError> {
        self.loaded = None;

        match Self::load_artifacts(&self.paths) {
            Ok(artifacts) => {
                info!(
                    features = artifacts.schema.len(),
                    rf = %self.paths.rf_model.display(),
                    lgbm = %self.paths.lgbm_model.display(),
                    "Models loaded successfully"
                );
                self.loaded = Some(artifacts);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, path = %e.path().display(), "Failed to load models");
                Err(e)
            }
        }
    }

    fn load_artifacts(paths: &ArtifactPaths) -> Result<LoadedArtifacts, LoadError> {
        let schema = FeatureSchema::load(&paths.features)?;

        let load_model = |variant: ModelVariant| -> Result<ModelArtifact, LoadError> {
            let path = paths.model(variant);
            let (manifest, digest) = ModelManifest::load(path)?;
            manifest.build(variant, path, &schema, digest)
        };
        let random_forest = load_model(ModelVariant::RandomForest)?;
        let lightgbm = load_model(ModelVariant::LightGbm)?;

        let metadata = ModelMetadata::load(&paths.metadata)?;
        if metadata.n_features != schema.len() {
            warn!(
                metadata_n_features = metadata.n_features,
                schema_len = schema.len(),
                "Metadata feature count disagrees with feature list"
            );
        }

        Ok(LoadedArtifacts {
            random_forest,
            lightgbm,
            schema,
            metadata,
        })
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    fn artifacts(&self) -> Result<&LoadedArtifacts, NotLoadedError> {
        self.loaded.as_ref().ok_or(NotLoadedError)
    }

    pub fn metadata(&self) -> Result<&ModelMetadata, NotLoadedError> {
        self.artifacts().map(|a| &a.metadata)
    }

    pub fn schema(&self) -> Result<&FeatureSchema, NotLoadedError> {
        self.artifacts().map(|a| &a.schema)
    }

    pub fn model(&self, variant: ModelVariant) -> Result<&ModelArtifact, NotLoadedError> {
        self.artifacts().map(|a| match variant {
            ModelVariant::RandomForest => &a.random_forest,
            ModelVariant::LightGbm => &a.lightgbm,
        })
    }

    /// Build an already-loaded cache from in-memory parts
    #[cfg(test)]
    pub(crate) fn preloaded(
        schema: FeatureSchema,
        metadata: ModelMetadata,
        random_forest: ModelArtifact,
        lightgbm: ModelArtifact,
    ) -> Self {
        Self {
            paths: ArtifactPaths::in_dir("."),
            loaded: Some(LoadedArtifacts {
                random_forest,
                lightgbm,
                schema,
                metadata,
            }),
        }
    }
}
