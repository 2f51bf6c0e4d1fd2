//! Core data models for the classification service

use crate::error::{AlignmentError, PredictError, UnknownVariantError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Label for class id 1
pub const LABEL_CONFIRMED: &str = "CONFIRMED";

/// Label for class id 0
pub const LABEL_FALSE_POSITIVE: &str = "FALSE POSITIVE";

/// Request body key carrying the variant selector
pub const MODEL_TYPE_KEY: &str = "model_type";

/// The two interchangeable trained classifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelVariant {
    #[serde(rename = "rf")]
    RandomForest,
    #[serde(rename = "lgbm")]
    LightGbm,
}

impl ModelVariant {
    pub const ALL: [ModelVariant; 2] = [ModelVariant::RandomForest, ModelVariant::LightGbm];

    /// Wire name ("rf" / "lgbm")
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelVariant::RandomForest => "rf",
            ModelVariant::LightGbm => "lgbm",
        }
    }

    /// Key used for this variant in the metadata `models` section
    pub fn metadata_key(&self) -> &'static str {
        match self {
            ModelVariant::RandomForest => "random_forest",
            ModelVariant::LightGbm => "lightgbm",
        }
    }

    /// Estimator family the variant was trained with
    pub fn estimator(&self) -> &'static str {
        match self {
            ModelVariant::RandomForest => "RandomForestClassifier",
            ModelVariant::LightGbm => "LGBMClassifier",
        }
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelVariant {
    type Err = UnknownVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rf" => Ok(ModelVariant::RandomForest),
            "lgbm" => Ok(ModelVariant::LightGbm),
            other => Err(UnknownVariantError(other.to_string())),
        }
    }
}

/// Caller-supplied feature values plus the variant to run.
///
/// Features keep the order the caller supplied them in; that order feeds
/// the explanation policy. Values that could not be read as numbers are
/// held in `non_numeric` until the schema decides whether they matter.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    pub features: Vec<(String, f64)>,
    pub non_numeric: Vec<AlignmentError>,
    pub variant: ModelVariant,
}

impl PredictionRequest {
    pub fn new(variant: ModelVariant) -> Self {
        Self {
            features: Vec::new(),
            non_numeric: Vec::new(),
            variant,
        }
    }

    /// Add a feature value, replacing an earlier value for the same name in place
    pub fn with_feature(mut self, name: impl Into<String>, value: f64) -> Self {
        self.insert(name.into(), value);
        self
    }

    fn insert(&mut self, name: String, value: f64) {
        match self.features.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.features.push((name, value)),
        }
    }

    /// Value supplied for `name`, if any
    pub fn get(&self, name: &str) -> Option<f64> {
        self.features
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    /// Build a request from a JSON object body.
    ///
    /// `model_type` selects the variant (absent or null falls back to
    /// `default_variant`). Null feature values are dropped and numeric
    /// strings are accepted. Other values are kept aside in `non_numeric`;
    /// the predictor rejects them only for names the schema knows.
    pub fn from_json(
        body: &Map<String, Value>,
        default_variant: ModelVariant,
    ) -> Result<Self, PredictError> {
        let variant = match body.get(MODEL_TYPE_KEY) {
            None | Some(Value::Null) => default_variant,
            Some(Value::String(s)) => s.parse()?,
            Some(other) => return Err(UnknownVariantError(other.to_string()).into()),
        };

        let mut request = PredictionRequest::new(variant);
        for (name, value) in body {
            if name == MODEL_TYPE_KEY {
                continue;
            }
            match numeric_value(name, value) {
                Ok(Some(v)) => request.insert(name.clone(), v),
                Ok(None) => {}
                Err(e) => request.non_numeric.push(e),
            }
        }

        Ok(request)
    }
}

fn numeric_value(name: &str, value: &Value) -> Result<Option<f64>, AlignmentError> {
    let reject = |found: String| AlignmentError {
        feature: name.to_string(),
        found,
    };

    let parsed = match value {
        Value::Null => return Ok(None),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => return Err(reject(format!("boolean {}", b))),
        Value::Array(_) => return Err(reject("an array".to_string())),
        Value::Object(_) => return Err(reject("an object".to_string())),
    };

    match parsed {
        Some(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(reject(value.to_string())),
    }
}

/// One entry of the feature-importance explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopFeature {
    pub feature: String,
    pub value: f64,
    pub importance: f64,
}

/// Prediction output, serialized verbatim as the API response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub predicted_class: u8,
    pub predicted_label: String,
    pub probability_false_positive: f64,
    pub probability_confirmed: f64,
    pub confidence: f64,
    pub model_used: ModelVariant,
    pub top_features: Vec<TopFeature>,
}

/// Fixed binary label mapping
pub fn label_for_class(class_id: u8) -> &'static str {
    if class_id == 1 {
        LABEL_CONFIRMED
    } else {
        LABEL_FALSE_POSITIVE
    }
}
