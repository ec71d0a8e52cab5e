//! ensembles: ensemble model inference for Rust.
//!
//! Combines heterogeneous trained submodels into a single prediction (a
//! regression value, or a classification label with probabilities) with
//! optional per-feature attribution of that prediction.
//!
//! # Key Types
//!
//! - [`EnsembleModel`] - Composite model: submodels + aggregator + shaping
//! - [`TreeModel`] / [`SubModel`] - Leaf scorer and the closed dispatch
//! - [`Aggregator`] - Pluggable combination of submodel outputs
//! - [`InferenceConfig`] / [`InferenceResults`] - Request and typed result
//! - [`ImportanceMatrix`] - Per-feature, per-class attribution
//!
//! # Inference
//!
//! Load a model document with [`ensemble_from_json`], run
//! [`rewrite_feature_indices`](EnsembleModel::rewrite_feature_indices) once
//! to compact the feature space, then call
//! [`infer`](EnsembleModel::infer) freely from any number of threads.
//!
//! ```ignore
//! use ensembles::{ensemble_from_json, InferenceConfig};
//!
//! let mut model = ensemble_from_json(&document)?;
//! model.rewrite_feature_indices(&Default::default());
//!
//! let results = model.infer(&[0.4, 1.7], &InferenceConfig::regression())?;
//! ```

// Re-export approx traits for users who want to compare predictions
pub use approx;

pub mod aggregate;
pub mod explainability;
pub mod inference;
pub mod model;
pub mod persist;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

// High-level model types
pub use model::{EnsembleModel, SubModel, TargetType, TreeModel};

// Aggregation
pub use aggregate::{AggregateError, Aggregator};

// Request configuration and results
pub use inference::{
    ClassificationConfig, ClassificationResults, InferenceConfig, InferenceError,
    InferenceResults, PredictedValue, PredictionFieldType, RegressionConfig, RegressionResults,
    TopClassEntry,
};

// Importance
pub use explainability::{FeatureImportance, ImportanceMatrix};

// Document loading
pub use persist::{ensemble_from_json, ReadError};

// Shared utilities
pub use utils::{run_with_threads, Parallelism};
