//! Feature-importance accumulation and decoding.
//!
//! - [`ImportanceMatrix`]: `[feature][class]` accumulation across submodels
//! - [`decode_feature_importances`] / [`transform_feature_importance`]:
//!   fold raw rows into display-ready [`FeatureImportance`] records

mod decode;
mod matrix;

pub use decode::{
    decode_feature_importances, top_importances, transform_feature_importance, ClassImportance,
    FeatureImportance,
};
pub use matrix::ImportanceMatrix;

pub(crate) use decode::class_label;
