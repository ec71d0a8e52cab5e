//! Model document loading.
//!
//! Schema types mirror the wire contract ([`schema`]); conversion into
//! runtime models validates every constructor requirement ([`convert`]).

pub mod convert;
pub mod error;
pub mod schema;

pub use error::ReadError;
pub use schema::{EnsembleSchema, LeafValueSchema, SubModelSchema, TreeNodeSchema, TreeSchema};

use crate::model::EnsembleModel;

/// Parse and validate an ensemble model document.
pub fn ensemble_from_json(json: &str) -> Result<EnsembleModel, ReadError> {
    let schema: EnsembleSchema = serde_json::from_str(json)?;
    EnsembleModel::try_from(schema)
}
