//! ONNX inference using tract
//!
//! Runs classifiers exported to ONNX (e.g. through skl2onnx or
//! onnxmltools with zipmap disabled). The graph takes a `[1, n_features]`
//! f32 input; the probability output is the first f32 output whose last
//! dimension is 2 (`[p0, p1]`) or 1 (`p1`).

use super::Classifier;
use crate::artifacts::read_artifact;
use crate::error::{LoadError, PredictError};
use std::path::Path;
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, warn};

/// Maximum inference latency before warning
const MAX_INFERENCE_MS: u128 = 5;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX-backed classifier
pub struct OnnxClassifier {
    model: TractModel,
    n_features: usize,
}

impl OnnxClassifier {
    /// Load and optimize an ONNX graph for rows of `n_features` values
    pub fn load(path: &Path, n_features: usize) -> Result<Self, LoadError> {
        let bytes = read_artifact(path)?;
        Self::from_bytes(&bytes, n_features).map_err(|e| LoadError::Onnx {
            path: path.to_path_buf(),
            message: format!("{:#}", e),
        })
    }

    pub fn from_bytes(model_bytes: &[u8], n_features: usize) -> TractResult<Self> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))?
            .with_input_fact(0, f32::fact([1, n_features]).into())?
            .into_optimized()?
            .into_runnable()?;

        Ok(Self { model, n_features })
    }

    fn row_to_tensor(&self, row: &[f64]) -> Result<Tensor, PredictError> {
        if row.len() != self.n_features {
            return Err(PredictError::Inference(format!(
                "row has {} values, model expects {}",
                row.len(),
                self.n_features
            )));
        }
        let data: Vec<f32> = row.iter().map(|v| *v as f32).collect();
        tract_ndarray::Array2::from_shape_vec((1, self.n_features), data)
            .map(Tensor::from)
            .map_err(|e| PredictError::Inference(e.to_string()))
    }
}

fn probabilities_from_outputs(outputs: &[TValue]) -> Result<[f64; 2], PredictError> {
    for output in outputs {
        if output.datum_type() != DatumType::F32 {
            continue;
        }
        let values = output
            .as_slice::<f32>()
            .map_err(|e| PredictError::Inference(e.to_string()))?;

        match (output.shape().last().copied(), values) {
            (Some(2), [p0, p1, ..]) => {
                let (p0, p1) = (f64::from(*p0).max(0.0), f64::from(*p1).max(0.0));
                let total = p0 + p1;
                if total <= 0.0 || !total.is_finite() {
                    return Err(PredictError::Inference(
                        "model produced degenerate probabilities".to_string(),
                    ));
                }
                return Ok([p0 / total, p1 / total]);
            }
            (Some(1), [p1, ..]) => {
                let p1 = f64::from(*p1).clamp(0.0, 1.0);
                return Ok([1.0 - p1, p1]);
            }
            _ => continue,
        }
    }

    Err(PredictError::Inference(
        "model has no probability output".to_string(),
    ))
}

impl Classifier for OnnxClassifier {
    fn predict_proba(&self, row: &[f64]) -> Result<[f64; 2], PredictError> {
        let start = Instant::now();
        let input = self.row_to_tensor(row)?;

        let outputs = self
            .model
            .run(tvec!(input.into()))
            .map_err(|e| PredictError::Inference(format!("{:#}", e)))?;

        let elapsed = start.elapsed();
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            warn!(elapsed_ms = elapsed.as_millis(), "Inference exceeded {}ms target", MAX_INFERENCE_MS);
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        probabilities_from_outputs(&outputs)
    }
}
