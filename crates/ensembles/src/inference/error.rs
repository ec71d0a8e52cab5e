//! Request-time error taxonomy.

use crate::aggregate::AggregateError;
use crate::model::TargetType;

/// Errors surfaced to inference callers.
///
/// Inference is a pure, deterministic computation; every variant is a
/// structural or data problem, never a transient one, so callers must not
/// retry.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    /// The request configuration cannot serve the model's target type.
    #[error("cannot infer using a [{config}] configuration when the model target type is [{target_type}]")]
    UnsupportedTargetType {
        config: &'static str,
        target_type: TargetType,
    },

    /// The aggregator rejected the collected submodel outputs.
    #[error(transparent)]
    Aggregation(#[from] AggregateError),
}
