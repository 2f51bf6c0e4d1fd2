//! Ordered feature schema shared by every model

use super::{parse_artifact, read_artifact};
use crate::error::LoadError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct FeatureList {
    features: Vec<String>,
}

/// Ordered, unique feature names. Position defines the vector slot for
/// every model and every importance array.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl FeatureSchema {
    pub fn new(names: Vec<String>) -> Result<Self, String> {
        if names.is_empty() {
            return Err("feature list is empty".to_string());
        }

        let mut positions = HashMap::with_capacity(names.len());
        for (idx, name) in names.iter().enumerate() {
            if name.is_empty() {
                return Err(format!("feature name at position {} is empty", idx));
            }
            if positions.insert(name.clone(), idx).is_some() {
                return Err(format!("duplicate feature name '{}'", name));
            }
        }

        Ok(Self { names, positions })
    }

    /// Load `{ "features": [...] }` from disk
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let bytes = read_artifact(path)?;
        let list: FeatureList = parse_artifact(path, &bytes)?;
        Self::new(list.features).map_err(|reason| LoadError::invalid(path, reason))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Vector slot of a feature, if the schema knows it
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_positions_follow_order() {
        let schema = FeatureSchema::new(names(&["koi_period", "koi_depth", "koi_prad"])).unwrap();
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.position("koi_period"), Some(0));
        assert_eq!(schema.position("koi_prad"), Some(2));
        assert_eq!(schema.position("koi_teq"), None);
    }

    #[test]
    fn test_rejects_duplicates_and_empty() {
        assert!(FeatureSchema::new(names(&["a", "b", "a"])).is_err());
        assert!(FeatureSchema::new(Vec::new()).is_err());
        assert!(FeatureSchema::new(names(&["a", ""])).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("features.json");
        std::fs::write(&path, r#"{"features": ["koi_period", "koi_duration"]}"#).unwrap();

        let schema = FeatureSchema::load(&path).unwrap();
        assert_eq!(schema.names(), &["koi_period".to_string(), "koi_duration".to_string()]);
    }

    #[test]
    fn test_load_errors() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("features.json");
        assert!(matches!(FeatureSchema::load(&missing), Err(LoadError::Missing { .. })));

        let malformed = dir.path().join("bad.json");
        std::fs::write(&malformed, r#"{"feature_names": []}"#).unwrap();
        assert!(matches!(FeatureSchema::load(&malformed), Err(LoadError::Malformed { .. })));

        let dupes = dir.path().join("dupes.json");
        std::fs::write(&dupes, r#"{"features": ["a", "a"]}"#).unwrap();
        assert!(matches!(FeatureSchema::load(&dupes), Err(LoadError::Invalid { .. })));
    }
}
