//! Tree-ensemble classifier exported as JSON
//!
//! Each tree is a flat node array with node 0 as the root. A row goes left
//! when `row[feature] <= threshold`. Children always sit after their
//! parent, which is checked at load so traversal cannot loop.

use super::Classifier;
use crate::error::PredictError;
use serde::Deserialize;

/// How leaf values combine into P(class 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Leaves hold P(class 1); the forest averages them
    MeanProbability,
    /// Leaves hold raw margins; P(class 1) = sigmoid(base_score + sum)
    SigmoidMargin,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        leaf: f64,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreeSpec {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnsembleSpec {
    pub aggregation: Aggregation,
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<TreeSpec>,
}

/// Validated tree ensemble
#[derive(Debug, Clone)]
pub struct TreeEnsemble {
    aggregation: Aggregation,
    base_score: f64,
    trees: Vec<Vec<Node>>,
    n_features: usize,
}

impl TreeEnsemble {
    /// Validate a spec for rows of `n_features` values
    pub fn new(spec: EnsembleSpec, n_features: usize) -> Result<Self, String> {
        if spec.trees.is_empty() {
            return Err("ensemble has no trees".to_string());
        }
        if !spec.base_score.is_finite() {
            return Err("base_score is not finite".to_string());
        }

        for (t, tree) in spec.trees.iter().enumerate() {
            validate_tree(&tree.nodes, n_features, spec.aggregation)
                .map_err(|reason| format!("tree {}: {}", t, reason))?;
        }

        Ok(Self {
            aggregation: spec.aggregation,
            base_score: spec.base_score,
            trees: spec.trees.into_iter().map(|t| t.nodes).collect(),
            n_features,
        })
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }

    /// P(class 1) for an aligned row
    pub fn probability(&self, row: &[f64]) -> f64 {
        let leaves = self.trees.iter().map(|nodes| evaluate(nodes, row));
        match self.aggregation {
            Aggregation::MeanProbability => {
                let sum: f64 = leaves.sum();
                (sum / self.trees.len() as f64).clamp(0.0, 1.0)
            }
            Aggregation::SigmoidMargin => sigmoid(self.base_score + leaves.sum::<f64>()),
        }
    }
}

impl Classifier for TreeEnsemble {
    fn predict_proba(&self, row: &[f64]) -> Result<[f64; 2], PredictError> {
        if row.len() != self.n_features {
            return Err(PredictError::Inference(format!(
                "row has {} values, model expects {}",
                row.len(),
                self.n_features
            )));
        }
        let p1 = self.probability(row);
        Ok([1.0 - p1, p1])
    }
}

fn validate_tree(nodes: &[Node], n_features: usize, aggregation: Aggregation) -> Result<(), String> {
    if nodes.is_empty() {
        return Err("no nodes".to_string());
    }

    for (idx, node) in nodes.iter().enumerate() {
        match *node {
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if feature >= n_features {
                    return Err(format!(
                        "node {} splits on feature {} but only {} exist",
                        idx, feature, n_features
                    ));
                }
                if threshold.is_nan() {
                    return Err(format!("node {} has a NaN threshold", idx));
                }
                for child in [left, right] {
                    if child <= idx || child >= nodes.len() {
                        return Err(format!("node {} has invalid child {}", idx, child));
                    }
                }
            }
            Node::Leaf { leaf } => {
                if !leaf.is_finite() {
                    return Err(format!("node {} has a non-finite leaf", idx));
                }
                if aggregation == Aggregation::MeanProbability && !(0.0..=1.0).contains(&leaf) {
                    return Err(format!("node {} leaf {} is not a probability", idx, leaf));
                }
            }
        }
    }

    Ok(())
}

fn evaluate(nodes: &[Node], row: &[f64]) -> f64 {
    let mut idx = 0;
    loop {
        match nodes[idx] {
            Node::Leaf { leaf } => return leaf,
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                idx = if row[feature] <= threshold { left } else { right };
            }
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stump(feature: usize, threshold: f64, left: f64, right: f64) -> TreeSpec {
        TreeSpec {
            nodes: vec![
                Node::Split {
                    feature,
                    threshold,
                    left: 1,
                    right: 2,
                },
                Node::Leaf { leaf: left },
                Node::Leaf { leaf: right },
            ],
        }
    }

    #[test]
    fn test_forest_averages_leaf_probabilities() {
        let spec = EnsembleSpec {
            aggregation: Aggregation::MeanProbability,
            base_score: 0.0,
            trees: vec![stump(0, 10.0, 0.0, 1.0), stump(1, 0.5, 0.2, 0.6)],
        };
        let forest = TreeEnsemble::new(spec, 2).unwrap();

        // tree 1 right (1.0), tree 2 left (0.2)
        assert!((forest.probability(&[11.0, 0.5]) - 0.6).abs() < 1e-12);
        // threshold is inclusive on the left
        assert!((forest.probability(&[10.0, 0.6]) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_boosting_applies_sigmoid() {
        let spec = EnsembleSpec {
            aggregation: Aggregation::SigmoidMargin,
            base_score: 0.5,
            trees: vec![stump(0, 0.0, -0.5, 1.5)],
        };
        let booster = TreeEnsemble::new(spec, 1).unwrap();

        assert!((booster.probability(&[-1.0]) - 0.5).abs() < 1e-12);
        assert!((booster.probability(&[1.0]) - sigmoid(2.0)).abs() < 1e-12);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let spec = EnsembleSpec {
            aggregation: Aggregation::SigmoidMargin,
            base_score: 0.0,
            trees: vec![stump(0, 3.0, -4.0, 0.7)],
        };
        let booster = TreeEnsemble::new(spec, 1).unwrap();
        for x in [-10.0, 0.0, 3.0, 3.1, 100.0] {
            let p = booster.predict_proba(&[x]).unwrap();
            assert!((p[0] + p[1] - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_rejects_wrong_row_width() {
        let spec = EnsembleSpec {
            aggregation: Aggregation::MeanProbability,
            base_score: 0.0,
            trees: vec![stump(0, 1.0, 0.0, 1.0)],
        };
        let forest = TreeEnsemble::new(spec, 3).unwrap();
        assert!(matches!(forest.predict_proba(&[1.0]), Err(PredictError::Inference(_))));
    }

    #[test]
    fn test_validation_errors() {
        let bad_feature = EnsembleSpec {
            aggregation: Aggregation::MeanProbability,
            base_score: 0.0,
            trees: vec![stump(5, 1.0, 0.0, 1.0)],
        };
        assert!(TreeEnsemble::new(bad_feature, 2).is_err());

        let backwards = EnsembleSpec {
            aggregation: Aggregation::SigmoidMargin,
            base_score: 0.0,
            trees: vec![TreeSpec {
                nodes: vec![
                    Node::Leaf { leaf: 0.0 },
                    Node::Split {
                        feature: 0,
                        threshold: 0.0,
                        left: 0,
                        right: 2,
                    },
                    Node::Leaf { leaf: 1.0 },
                ],
            }],
        };
        assert!(TreeEnsemble::new(backwards, 1).is_err());

        let not_probability = EnsembleSpec {
            aggregation: Aggregation::MeanProbability,
            base_score: 0.0,
            trees: vec![stump(0, 1.0, -0.5, 1.0)],
        };
        assert!(TreeEnsemble::new(not_probability, 1).is_err());

        let empty = EnsembleSpec {
            aggregation: Aggregation::MeanProbability,
            base_score: 0.0,
            trees: vec![],
        };
        assert!(TreeEnsemble::new(empty, 1).is_err());
    }

    #[test]
    fn test_deserialize_nodes() {
        let spec: EnsembleSpec = serde_json::from_value(json!({
            "aggregation": "mean_probability",
            "trees": [{"nodes": [
                {"feature": 0, "threshold": 2.5, "left": 1, "right": 2},
                {"leaf": 0.1},
                {"leaf": 0.8}
            ]}]
        }))
        .unwrap();

        assert_eq!(spec.base_score, 0.0);
        assert_eq!(spec.trees[0].nodes[1], Node::Leaf { leaf: 0.1 });
        let forest = TreeEnsemble::new(spec, 1).unwrap();
        assert_eq!(forest.tree_count(), 1);
        assert_eq!(forest.aggregation(), Aggregation::MeanProbability);
    }
}
