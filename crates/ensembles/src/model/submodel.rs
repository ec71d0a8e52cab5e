//! Closed submodel dispatch.

use std::collections::HashMap;

use crate::inference::{InferenceConfig, InferenceError, RawPrediction};
use crate::model::{EnsembleModel, TreeModel};
use crate::utils::OrderedSet;

/// A trained predictor consumed by an ensemble.
///
/// The variant set is closed: feature collection and index rewriting are
/// defined per variant, with `Ensemble` recursing into its children, so no
/// runtime type inspection is ever needed.
#[derive(Debug, Clone)]
pub enum SubModel {
    Tree(TreeModel),
    Ensemble(Box<EnsembleModel>),
}

impl SubModel {
    /// Feature names this model references directly.
    ///
    /// For a nested ensemble these are its declared names, not the
    /// transitive set; use [`collect_features`](Self::collect_features) for
    /// the transitive walk.
    pub fn feature_names(&self) -> &[String] {
        match self {
            Self::Tree(tree) => tree.feature_names(),
            Self::Ensemble(ensemble) => ensemble.feature_names(),
        }
    }

    /// Raw score vector plus optional importance for one feature vector.
    ///
    /// Nested ensembles are invoked in raw mode, so their combined scalar
    /// flows up without outer-config shaping.
    pub fn infer_raw(
        &self,
        features: &[f64],
        importance_requested: bool,
    ) -> Result<RawPrediction, InferenceError> {
        match self {
            Self::Tree(tree) => Ok(tree.infer_raw(features, importance_requested)),
            Self::Ensemble(ensemble) => {
                let results =
                    ensemble.infer(features, &InferenceConfig::raw(importance_requested))?;
                Ok(results
                    .into_raw()
                    .expect("raw configuration must produce a raw result"))
            }
        }
    }

    pub fn supports_feature_importance(&self) -> bool {
        match self {
            Self::Tree(tree) => tree.supports_feature_importance(),
            Self::Ensemble(ensemble) => ensemble.supports_feature_importance(),
        }
    }

    /// Propagate a dense feature-index mapping into this model.
    pub fn rewrite_feature_indices(&mut self, mapping: &HashMap<String, usize>) {
        match self {
            Self::Tree(tree) => tree.rewrite_feature_indices(mapping),
            Self::Ensemble(ensemble) => ensemble.rewrite_feature_indices(mapping),
        }
    }

    /// Collect referenced feature names, recursing through nested ensembles.
    pub(crate) fn collect_features(&self, out: &mut OrderedSet<String>) {
        match self {
            Self::Tree(tree) => tree.collect_features(out),
            Self::Ensemble(ensemble) => ensemble.collect_features(out),
        }
    }

    /// Approximate heap footprint in bytes.
    pub fn ram_bytes_used(&self) -> usize {
        match self {
            Self::Tree(tree) => tree.ram_bytes_used(),
            Self::Ensemble(ensemble) => ensemble.ram_bytes_used(),
        }
    }
}
