//! Trained model representations.
//!
//! # Overview
//!
//! - [`EnsembleModel`]: the composite orchestrator combining submodels
//! - [`TreeModel`]: decision-tree leaf scorer
//! - [`SubModel`]: closed variant dispatch over the two
//! - [`TargetType`]: regression vs. classification metadata

mod ensemble;
mod meta;
mod submodel;
mod tree;

pub use ensemble::EnsembleModel;
pub use meta::TargetType;
pub use submodel::SubModel;
pub use tree::TreeModel;
