//! Feature alignment for ML inference
//!
//! Turns a partial name→value map into the fixed-order vector every model
//! consumes. Absent features get a fixed fill value; it is a plain zero,
//! not an imputed training statistic, so predictions for sparse inputs
//! should be read with that in mind.

use crate::artifacts::FeatureSchema;
use std::collections::HashMap;

/// Value substituted for features the caller did not supply
pub const DEFAULT_FILL_VALUE: f64 = 0.0;

/// Aligns caller-supplied features to the schema order
#[derive(Debug, Clone)]
pub struct FeatureAligner {
    fill_value: f64,
}

impl Default for FeatureAligner {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureAligner {
    pub fn new() -> Self {
        Self {
            fill_value: DEFAULT_FILL_VALUE,
        }
    }

    /// One value per schema entry, in schema order. Names the schema does
    /// not know are ignored.
    pub fn align(&self, supplied: &[(String, f64)], schema: &FeatureSchema) -> Vec<f64> {
        let lookup: HashMap<&str, f64> = supplied
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
            .collect();

        schema
            .names()
            .iter()
            .map(|name| lookup.get(name.as_str()).copied().unwrap_or(self.fill_value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(names: &[&str]) -> FeatureSchema {
        FeatureSchema::new(names.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    fn supplied(pairs: &[(&str, f64)]) -> Vec<(String, f64)> {
        pairs.iter().map(|(n, v)| (n.to_string(), *v)).collect()
    }

    #[test]
    fn test_align_schema_order() {
        let schema = schema(&["koi_period", "koi_depth", "koi_prad"]);
        let aligner = FeatureAligner::new();

        let row = aligner.align(&supplied(&[("koi_prad", 1.2), ("koi_period", 12.34)]), &schema);
        assert_eq!(row, vec![12.34, 0.0, 1.2]);
    }

    #[test]
    fn test_align_length_independent_of_input() {
        let schema = schema(&["a", "b", "c", "d"]);
        let aligner = FeatureAligner::new();

        assert_eq!(aligner.align(&[], &schema).len(), 4);
        let many = supplied(&[("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0), ("e", 5.0), ("f", 6.0)]);
        assert_eq!(aligner.align(&many, &schema), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_absent_features_are_exactly_zero() {
        let schema = schema(&["a", "b", "c"]);
        let row = FeatureAligner::default().align(&supplied(&[("b", -7.5)]), &schema);
        assert_eq!(row[0], DEFAULT_FILL_VALUE);
        assert_eq!(row[1], -7.5);
        assert_eq!(row[2], DEFAULT_FILL_VALUE);
    }

    #[test]
    fn test_unknown_names_ignored() {
        let schema = schema(&["a"]);
        let row = FeatureAligner::new().align(&supplied(&[("zzz", 9.0)]), &schema);
        assert_eq!(row, vec![0.0]);
    }
}
