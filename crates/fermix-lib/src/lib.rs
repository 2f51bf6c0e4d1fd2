//! Exoplanet classification serving library
//!
//! This crate provides the core functionality for:
//! - Loading the trained model pair, feature list and metadata once at startup
//! - Aligning partial feature maps into the fixed vector the models expect
//! - Running inference and ranking the supplied features by importance
//! - Paginating the tabular KOI dataset
//! - Metrics and structured logging

pub mod artifacts;
pub mod dataset;
pub mod error;
pub mod models;
pub mod observability;
pub mod predictor;

pub use artifacts::{ArtifactPaths, FeatureSchema, ModelCache, ModelMetadata};
pub use dataset::{DatasetPage, DatasetStore, DatasetTable};
pub use error::{
    AlignmentError, DatasetError, LoadError, NotLoadedError, PredictError, UnknownVariantError,
};
pub use models::*;
pub use observability::{ServingMetrics, StructuredLogger};
pub use predictor::{Classifier, FeatureAligner, Predictor};
