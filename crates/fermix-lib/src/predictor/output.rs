//! Prediction output formatting and explanation ranking

use crate::artifacts::FeatureSchema;
use crate::models::{label_for_class, ModelVariant, PredictionResult, TopFeature};
use std::cmp::Ordering;

/// Supplied features considered for the explanation, in caller order
pub const EXPLANATION_CANDIDATES: usize = 10;

/// Entries kept after ranking by importance
pub const EXPLANATION_SIZE: usize = 5;

/// Class 1 wins only on a strict majority
pub fn class_from_probabilities(probabilities: &[f64; 2]) -> u8 {
    if probabilities[1] > probabilities[0] {
        1
    } else {
        0
    }
}

/// Rank the caller's own features by model importance.
///
/// Takes the first [`EXPLANATION_CANDIDATES`] supplied features the schema
/// knows (caller order), sorts them by importance descending (stable), and
/// keeps [`EXPLANATION_SIZE`]. A high-importance feature supplied after the
/// candidate window never appears.
pub fn top_features(
    supplied: &[(String, f64)],
    schema: &FeatureSchema,
    importances: &[f64],
) -> Vec<TopFeature> {
    let mut candidates: Vec<TopFeature> = supplied
        .iter()
        .filter_map(|(name, value)| {
            let idx = schema.position(name)?;
            Some(TopFeature {
                feature: name.clone(),
                value: *value,
                importance: importances.get(idx).copied().unwrap_or_default(),
            })
        })
        .take(EXPLANATION_CANDIDATES)
        .collect();

    candidates.sort_by(|a, b| {
        b.importance
            .partial_cmp(&a.importance)
            .unwrap_or(Ordering::Equal)
    });
    candidates.truncate(EXPLANATION_SIZE);
    candidates
}

/// Assemble the response record from raw model output
pub fn format_result(
    probabilities: [f64; 2],
    variant: ModelVariant,
    top_features: Vec<TopFeature>,
) -> PredictionResult {
    let predicted_class = class_from_probabilities(&probabilities);
    PredictionResult {
        predicted_class,
        predicted_label: label_for_class(predicted_class).to_string(),
        probability_false_positive: probabilities[0],
        probability_confirmed: probabilities[1],
        confidence: probabilities[0].max(probabilities[1]),
        model_used: variant,
        top_features,
    }
}
