//! Inference request configuration, typed results, and errors.
//!
//! # Module Structure
//!
//! - [`config`]: request configurations and the raw no-shaping mode
//! - [`results`]: typed result objects consumed by response formatting
//! - [`fields`]: lenient field-value coercion for map-based input
//! - [`error`]: the request-time error taxonomy

mod config;
mod error;
mod fields;
mod results;

pub use config::{
    ClassificationConfig, InferenceConfig, PredictionFieldType, RawConfig, RegressionConfig,
};
pub use error::InferenceError;
pub use fields::to_f64;
pub use results::{
    classification_label, ClassificationResults, InferenceResults, PredictedValue, RawPrediction,
    RegressionResults, TopClassEntry,
};

pub(crate) use results::top_classes;
