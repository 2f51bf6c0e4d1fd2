//! Prediction entry point over a shared, loaded model cache

use super::output::{format_result, top_features};
use super::FeatureAligner;
use crate::artifacts::ModelCache;
use crate::error::PredictError;
use crate::models::{PredictionRequest, PredictionResult};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Runs one request against the selected model variant.
///
/// Holds no mutable state; clones share the same cache and may run in
/// parallel without coordination.
#[derive(Debug, Clone)]
pub struct Predictor {
    cache: Arc<ModelCache>,
    aligner: FeatureAligner,
}

impl Predictor {
    pub fn new(cache: Arc<ModelCache>) -> Self {
        Self {
            cache,
            aligner: FeatureAligner::new(),
        }
    }

    pub fn cache(&self) -> &ModelCache {
        &self.cache
    }

    pub fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult, PredictError> {
        let start = Instant::now();

        let schema = self.cache.schema()?;
        let model = self.cache.model(request.variant)?;

        // Unusable values only matter for features the model reads
        if let Some(e) = request
            .non_numeric
            .iter()
            .find(|e| schema.position(&e.feature).is_some())
        {
            return Err(e.clone().into());
        }

        let row = self.aligner.align(&request.features, schema);
        let probabilities = model.predict_proba(&row)?;
        let explanation = top_features(&request.features, schema, model.feature_importances());
        let result = format_result(probabilities, request.variant, explanation);

        debug!(
            model = %request.variant,
            supplied = request.features.len(),
            predicted_class = result.predicted_class,
            confidence = result.confidence,
            elapsed_us = start.elapsed().as_micros(),
            "Prediction completed"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{FeatureSchema, ModelArtifact, ModelMetadata};
    use crate::error::{NotLoadedError, UnknownVariantError};
    use crate::models::{ModelVariant, LABEL_CONFIRMED, LABEL_FALSE_POSITIVE};
    use crate::predictor::Classifier;
    use crate::ArtifactPaths;
    use serde_json::json;
    use std::sync::Mutex;

    const FEATURES: [&str; 8] = [
        "koi_period",
        "koi_duration",
        "koi_depth",
        "koi_prad",
        "koi_steff",
        "koi_slogg",
        "koi_smetal",
        "koi_impact",
    ];

    /// Returns a fixed probability and remembers the last row it saw
    struct FixedClassifier {
        p1: f64,
        last_row: Mutex<Vec<f64>>,
    }

    impl FixedClassifier {
        fn boxed(p1: f64) -> Box<dyn Classifier> {
            Box::new(Self {
                p1,
                last_row: Mutex::new(Vec::new()),
            })
        }
    }

    impl Classifier for FixedClassifier {
        fn predict_proba(&self, row: &[f64]) -> Result<[f64; 2], PredictError> {
            *self.last_row.lock().unwrap() = row.to_vec();
            Ok([1.0 - self.p1, self.p1])
        }
    }

    fn metadata() -> ModelMetadata {
        serde_json::from_value(json!({
            "created_utc": "2025-10-05T12:00:00Z",
            "dataset": "Kepler KOI cleaned",
            "task": "binary",
            "n_samples": {"train": 6257, "test": 1565},
            "n_features": FEATURES.len(),
            "models": {}
        }))
        .unwrap()
    }

    fn loaded_predictor(rf_p1: f64, lgbm_p1: f64) -> Predictor {
        let schema = FeatureSchema::new(FEATURES.iter().map(|s| s.to_string()).collect()).unwrap();
        let importances = vec![0.15, 0.05, 0.12, 0.2, 0.03, 0.08, 0.01, 0.3];
        let rf = ModelArtifact::new(
            ModelVariant::RandomForest,
            FixedClassifier::boxed(rf_p1),
            importances.clone(),
            "rf".to_string(),
        );
        let lgbm = ModelArtifact::new(
            ModelVariant::LightGbm,
            FixedClassifier::boxed(lgbm_p1),
            importances,
            "lgbm".to_string(),
        );
        Predictor::new(Arc::new(ModelCache::preloaded(schema, metadata(), rf, lgbm)))
    }

    fn scenario_request(variant: ModelVariant) -> PredictionRequest {
        PredictionRequest::new(variant)
            .with_feature("koi_period", 12.34)
            .with_feature("koi_duration", 3.1)
            .with_feature("koi_depth", 1200.0)
            .with_feature("koi_prad", 1.2)
            .with_feature("koi_steff", 5750.0)
            .with_feature("koi_slogg", 4.3)
            .with_feature("koi_smetal", 0.01)
    }

    #[test]
    fn test_not_loaded_rejects_every_request() {
        let cache = Arc::new(ModelCache::new(ArtifactPaths::in_dir("/nonexistent")));
        let predictor = Predictor::new(cache);

        for variant in ModelVariant::ALL {
            let err = predictor.predict(&scenario_request(variant)).unwrap_err();
            assert!(matches!(err, PredictError::NotLoaded(NotLoadedError)));
        }
        let err = predictor
            .predict(&PredictionRequest::new(ModelVariant::LightGbm))
            .unwrap_err();
        assert_eq!(err.kind(), "not_loaded");
    }

    #[test]
    fn test_scenario_lgbm() {
        let predictor = loaded_predictor(0.2, 0.88);
        let result = predictor.predict(&scenario_request(ModelVariant::LightGbm)).unwrap();

        assert_eq!(result.model_used, ModelVariant::LightGbm);
        assert_eq!(result.predicted_class, 1);
        assert_eq!(result.predicted_label, LABEL_CONFIRMED);
        assert!((result.probability_false_positive + result.probability_confirmed - 1.0).abs() < 1e-9);
        assert_eq!(result.confidence, 0.88);

        let supplied: Vec<&str> = FEATURES[..7].to_vec();
        assert!(result.top_features.len() <= 5);
        assert!(result
            .top_features
            .iter()
            .all(|t| supplied.contains(&t.feature.as_str())));
        // koi_impact has the highest importance but was not supplied
        assert_eq!(result.top_features[0].feature, "koi_prad");
        assert_eq!(result.top_features[0].value, 1.2);
    }

    #[test]
    fn test_variant_selects_model() {
        let predictor = loaded_predictor(0.3, 0.9);
        let result = predictor.predict(&scenario_request(ModelVariant::RandomForest)).unwrap();
        assert_eq!(result.model_used, ModelVariant::RandomForest);
        assert_eq!(result.predicted_class, 0);
        assert_eq!(result.predicted_label, LABEL_FALSE_POSITIVE);
        assert!((result.confidence - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_model_sees_aligned_row() {
        let schema = FeatureSchema::new(vec!["a".into(), "b".into(), "c".into()]).unwrap();
        let classifier = Arc::new(FixedClassifier {
            p1: 0.6,
            last_row: Mutex::new(Vec::new()),
        });

        struct Shared(Arc<FixedClassifier>);
        impl Classifier for Shared {
            fn predict_proba(&self, row: &[f64]) -> Result<[f64; 2], PredictError> {
                self.0.predict_proba(row)
            }
        }

        let rf = ModelArtifact::new(
            ModelVariant::RandomForest,
            Box::new(Shared(classifier.clone())),
            vec![0.2, 0.3, 0.5],
            String::new(),
        );
        let lgbm = ModelArtifact::new(
            ModelVariant::LightGbm,
            FixedClassifier::boxed(0.5),
            vec![0.2, 0.3, 0.5],
            String::new(),
        );
        let predictor = Predictor::new(Arc::new(ModelCache::preloaded(schema, metadata(), rf, lgbm)));

        let request = PredictionRequest::new(ModelVariant::RandomForest)
            .with_feature("c", 7.0)
            .with_feature("unknown", 1.0);
        predictor.predict(&request).unwrap();

        assert_eq!(*classifier.last_row.lock().unwrap(), vec![0.0, 0.0, 7.0]);
    }

    #[test]
    fn test_non_numeric_known_feature_rejected() {
        let predictor = loaded_predictor(0.3, 0.9);
        let body = json!({"koi_period": "long", "koi_prad": 1.2});
        let request =
            PredictionRequest::from_json(body.as_object().unwrap(), ModelVariant::LightGbm).unwrap();

        let err = predictor.predict(&request).unwrap_err();
        assert!(matches!(err, PredictError::Alignment(ref e) if e.feature == "koi_period"));
        assert_eq!(err.kind(), "alignment");
    }

    #[test]
    fn test_non_numeric_unknown_key_ignored() {
        let predictor = loaded_predictor(0.3, 0.9);
        let body = json!({"koi_period": 12.34, "kepoi_name": "K00752.01", "model_type": "lgbm"});
        let request =
            PredictionRequest::from_json(body.as_object().unwrap(), ModelVariant::LightGbm).unwrap();

        let result = predictor.predict(&request).unwrap();
        assert_eq!(result.model_used, ModelVariant::LightGbm);
        assert_eq!(result.top_features.len(), 1);
        assert_eq!(result.top_features[0].feature, "koi_period");
    }

    #[test]
    fn test_unknown_variant_rejected_before_cache() {
        let body = json!({"koi_period": 1.0, "model_type": "xgboost"});
        let err = PredictionRequest::from_json(body.as_object().unwrap(), ModelVariant::LightGbm)
            .unwrap_err();
        assert!(matches!(err, PredictError::UnknownVariant(UnknownVariantError(_))));
    }
}
