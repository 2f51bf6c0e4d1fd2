//! Classification engine

mod engine;
mod ensemble;
mod features;
mod inference;
mod output;

pub use engine::Predictor;
pub use ensemble::{Aggregation, EnsembleSpec, Node, TreeEnsemble, TreeSpec};
pub use features::{FeatureAligner, DEFAULT_FILL_VALUE};
pub use inference::OnnxClassifier;
pub use output::{
    class_from_probabilities, format_result, top_features, EXPLANATION_CANDIDATES,
    EXPLANATION_SIZE,
};

use crate::error::PredictError;

/// A binary classifier over one aligned feature row
pub trait Classifier: Send + Sync {
    /// `[P(class 0), P(class 1)]`, summing to 1
    fn predict_proba(&self, row: &[f64]) -> Result<[f64; 2], PredictError>;
}
