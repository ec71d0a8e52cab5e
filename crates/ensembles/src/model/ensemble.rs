//! Ensemble inference model: the core orchestrator.
//!
//! An [`EnsembleModel`] owns an ordered list of submodels, an aggregator,
//! target-type metadata, and (for classification) label names and optional
//! class weights. Inference extracts features, invokes each submodel with a
//! neutral raw configuration, accumulates importance, aggregates, and shapes
//! the typed result.
//!
//! Trained state is read-only during serving; concurrent [`infer`] calls
//! over one instance need no locking. The only post-construction mutation is
//! [`rewrite_feature_indices`], which takes `&mut self` and therefore cannot
//! overlap with serving reads.
//!
//! [`infer`]: EnsembleModel::infer
//! [`rewrite_feature_indices`]: EnsembleModel::rewrite_feature_indices

use std::collections::HashMap;

use ndarray::ArrayView2;
use serde_json::Value;

use crate::aggregate::Aggregator;
use crate::explainability::{
    decode_feature_importances, top_importances, transform_feature_importance, ImportanceMatrix,
};
use crate::inference::{
    to_f64, top_classes, InferenceConfig, InferenceError, InferenceResults, RawPrediction,
};
use crate::inference::{ClassificationResults, RegressionResults};
use crate::model::{SubModel, TargetType};
use crate::utils::{run_with_threads, OrderedSet};

/// A combination of trained submodels whose outputs merge into one
/// prediction.
#[derive(Debug, Clone)]
pub struct EnsembleModel {
    /// Declared feature names; rewritten once by the index-compaction pass.
    feature_names: Vec<String>,
    models: Vec<SubModel>,
    aggregator: Aggregator,
    target_type: TargetType,
    classification_labels: Option<Vec<String>>,
    classification_weights: Option<Vec<f64>>,
}

impl EnsembleModel {
    /// Create an ensemble from its trained parts.
    pub fn new(
        feature_names: Vec<String>,
        models: Vec<SubModel>,
        aggregator: Aggregator,
        target_type: TargetType,
    ) -> Self {
        Self {
            feature_names,
            models,
            aggregator,
            target_type,
            classification_labels: None,
            classification_weights: None,
        }
    }

    /// Set classification label names, index-aligned with score positions.
    pub fn with_classification_labels(mut self, labels: Vec<String>) -> Self {
        self.classification_labels = Some(labels);
        self
    }

    /// Set per-class multipliers applied before top-class selection.
    pub fn with_classification_weights(mut self, weights: Vec<f64>) -> Self {
        self.classification_weights = Some(weights);
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Declared feature names, in feature-vector order.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn target_type(&self) -> TargetType {
        self.target_type
    }

    pub fn models(&self) -> &[SubModel] {
        &self.models
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn classification_labels(&self) -> Option<&[String]> {
        self.classification_labels.as_deref()
    }

    pub fn classification_weights(&self) -> Option<&[f64]> {
        self.classification_weights.as_deref()
    }

    /// True iff every submodel can attribute feature importance.
    pub fn supports_feature_importance(&self) -> bool {
        self.models.iter().all(SubModel::supports_feature_importance)
    }

    // =========================================================================
    // Inference
    // =========================================================================

    /// Infer from a field-name → value map.
    ///
    /// Each declared feature is coerced to a double in declared order;
    /// missing or unconvertible fields become NaN. `feature_decoder` maps
    /// raw feature names to display names when shaping importance.
    pub fn infer_from_fields(
        &self,
        fields: &serde_json::Map<String, Value>,
        config: &InferenceConfig,
        feature_decoder: &HashMap<String, String>,
    ) -> Result<InferenceResults, InferenceError> {
        let features = self.extract_features(fields);
        self.infer_inner(&features, config, feature_decoder)
    }

    /// Infer from a pre-extracted feature vector.
    pub fn infer(
        &self,
        features: &[f64],
        config: &InferenceConfig,
    ) -> Result<InferenceResults, InferenceError> {
        self.infer_inner(features, config, &HashMap::new())
    }

    /// Infer for a batch of rows, one result per row.
    ///
    /// Rows are independent read-only passes, so they parallelize freely.
    /// Thread count semantics: 0 = auto, 1 = sequential, n = exact count.
    pub fn infer_batch(
        &self,
        features: ArrayView2<'_, f64>,
        config: &InferenceConfig,
        n_threads: usize,
    ) -> Result<Vec<InferenceResults>, InferenceError> {
        run_with_threads(n_threads, |parallelism| {
            parallelism
                .maybe_par_map(0..features.nrows(), |row| {
                    self.infer(&features.row(row).to_vec(), config)
                })
                .into_iter()
                .collect()
        })
    }

    fn extract_features(&self, fields: &serde_json::Map<String, Value>) -> Vec<f64> {
        self.feature_names
            .iter()
            .map(|name| fields.get(name).and_then(to_f64).unwrap_or(f64::NAN))
            .collect()
    }

    pub(crate) fn infer_inner(
        &self,
        features: &[f64],
        config: &InferenceConfig,
        feature_decoder: &HashMap<String, String>,
    ) -> Result<InferenceResults, InferenceError> {
        if !config.supports_target_type(self.target_type) {
            return Err(InferenceError::UnsupportedTargetType {
                config: config.name(),
                target_type: self.target_type,
            });
        }
        let importance_requested = config.requesting_importance();
        if importance_requested {
            assert!(
                self.supports_feature_importance(),
                "feature importance requested but not every submodel provides it"
            );
        }

        let mut scores: Vec<Vec<f64>> = Vec::with_capacity(self.models.len());
        let mut influence = importance_requested.then(|| ImportanceMatrix::new(features.len()));
        for model in &self.models {
            let raw = model.infer_raw(features, importance_requested)?;
            if let Some(accumulated) = influence.as_mut() {
                let matrix = raw
                    .feature_importance
                    .as_ref()
                    .expect("submodel did not return requested feature importance");
                accumulated.merge(matrix);
            }
            scores.push(raw.value);
        }

        let processed = self.aggregator.process_values(&scores)?;
        self.build_results(&processed, influence, feature_decoder, config)
    }

    fn build_results(
        &self,
        processed: &[f64],
        influence: Option<ImportanceMatrix>,
        feature_decoder: &HashMap<String, String>,
        config: &InferenceConfig,
    ) -> Result<InferenceResults, InferenceError> {
        // Raw mode bypasses label and threshold logic entirely; enclosing
        // ensembles consume this without re-deriving configuration semantics.
        if let InferenceConfig::Raw(_) = config {
            return Ok(InferenceResults::Raw(RawPrediction {
                value: vec![self.aggregator.aggregate(processed)],
                feature_importance: influence,
            }));
        }

        let decoded = match &influence {
            Some(matrix) => {
                decode_feature_importances(feature_decoder, &self.feature_names, matrix)
            }
            None => Vec::new(),
        };

        match (self.target_type, config) {
            (TargetType::Regression, InferenceConfig::Regression(rc)) => {
                let feature_importance = top_importances(
                    transform_feature_importance(decoded, None),
                    rc.num_top_feature_importance_values,
                );
                Ok(InferenceResults::Regression(RegressionResults {
                    value: self.aggregator.aggregate(processed),
                    feature_importance,
                }))
            }
            (TargetType::Classification, InferenceConfig::Classification(cc)) => {
                if let Some(weights) = &self.classification_weights {
                    assert_eq!(
                        weights.len(),
                        processed.len(),
                        "classification weights do not match aggregator output length"
                    );
                }
                let labels = self.classification_labels.as_deref();
                let (top, entries) = top_classes(
                    processed,
                    labels,
                    self.classification_weights.as_deref(),
                    cc.num_top_classes,
                    cc.prediction_field_type,
                );
                let predicted_value = cc
                    .prediction_field_type
                    .format(top, labels.and_then(|l| l.get(top)).map(String::as_str));
                let feature_importance = top_importances(
                    transform_feature_importance(decoded, labels),
                    cc.num_top_feature_importance_values,
                );
                Ok(InferenceResults::Classification(ClassificationResults {
                    predicted_value,
                    top_classes: entries,
                    feature_importance,
                }))
            }
            _ => Err(InferenceError::UnsupportedTargetType {
                config: config.name(),
                target_type: self.target_type,
            }),
        }
    }

    // =========================================================================
    // Feature Index Rewriting
    // =========================================================================

    /// Collapse a sparse feature index space into a dense local numbering
    /// and propagate it into every submodel.
    ///
    /// With an empty `mapping` this ensemble is the root: the transitively
    /// referenced feature set (insertion-ordered, deduplicated) becomes the
    /// new `feature_names`, and the freshly built name → index mapping
    /// cascades into the submodels. With a non-empty `mapping` this ensemble
    /// is nested: it no longer owns naming, so local names are discarded and
    /// the parent mapping is forwarded unchanged.
    ///
    /// One-shot preparation: run during model load, before serving.
    pub fn rewrite_feature_indices(&mut self, mapping: &HashMap<String, usize>) {
        let built;
        let forwarded = if mapping.is_empty() {
            let referenced = self.referenced_features();
            self.feature_names = referenced.into_vec();
            built = self
                .feature_names
                .iter()
                .enumerate()
                .map(|(index, name)| (name.clone(), index))
                .collect::<HashMap<_, _>>();
            &built
        } else {
            self.feature_names = Vec::new();
            mapping
        };
        for model in &mut self.models {
            model.rewrite_feature_indices(forwarded);
        }
    }

    /// Features referenced transitively by all submodels, first-seen order.
    pub fn referenced_features(&self) -> OrderedSet<String> {
        let mut referenced = OrderedSet::new();
        self.collect_features(&mut referenced);
        referenced
    }

    pub(crate) fn collect_features(&self, out: &mut OrderedSet<String>) {
        for model in &self.models {
            model.collect_features(out);
        }
    }

    // =========================================================================
    // Memory Accounting
    // =========================================================================

    /// Approximate heap footprint in bytes, summed over constituents.
    pub fn ram_bytes_used(&self) -> usize {
        use std::mem::size_of;
        let mut size = size_of::<Self>();
        size += self
            .feature_names
            .iter()
            .map(|name| size_of::<String>() + name.capacity())
            .sum::<usize>();
        size += self
            .models
            .iter()
            .map(SubModel::ram_bytes_used)
            .sum::<usize>();
        if let Some(labels) = &self.classification_labels {
            size += labels
                .iter()
                .map(|label| size_of::<String>() + label.capacity())
                .sum::<usize>();
        }
        if let Some(weights) = &self.classification_weights {
            size += weights.len() * size_of::<f64>();
        }
        size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TreeModel;

    fn constant_tree(names: &[&str], value: Vec<f64>) -> TreeModel {
        TreeModel::new(
            names.iter().map(|n| n.to_string()).collect(),
            vec![0],
            vec![0.0],
            vec![0],
            vec![0],
            vec![true],
            vec![true],
            vec![value],
            None,
        )
    }

    fn regression_ensemble() -> EnsembleModel {
        EnsembleModel::new(
            vec!["a".to_string(), "b".to_string()],
            vec![
                SubModel::Tree(constant_tree(&["a", "b"], vec![1.0])),
                SubModel::Tree(constant_tree(&["a", "b"], vec![3.0])),
            ],
            Aggregator::Average,
            TargetType::Regression,
        )
    }

    #[test]
    fn regression_infer_averages_submodels() {
        let ensemble = regression_ensemble();
        let results = ensemble
            .infer(&[0.0, 0.0], &InferenceConfig::regression())
            .unwrap();
        assert_eq!(results.as_regression().unwrap().value, 2.0);
    }

    #[test]
    fn target_type_gate_rejects_mismatched_config() {
        let ensemble = regression_ensemble();
        let err = ensemble
            .infer(&[0.0, 0.0], &InferenceConfig::classification())
            .unwrap_err();
        assert!(matches!(
            err,
            InferenceError::UnsupportedTargetType {
                config: "classification",
                target_type: TargetType::Regression,
            }
        ));
    }

    #[test]
    fn raw_mode_returns_aggregate_scalar() {
        let ensemble = regression_ensemble();
        let raw = ensemble
            .infer(&[0.0, 0.0], &InferenceConfig::raw(false))
            .unwrap()
            .into_raw()
            .unwrap();
        assert_eq!(raw.value, vec![2.0]);
        assert!(raw.feature_importance.is_none());
    }

    #[test]
    fn field_extraction_follows_declared_order() {
        let ensemble = regression_ensemble();
        let fields: serde_json::Map<String, Value> = serde_json::from_str(
            r#"{"b": "2.5", "a": 1, "unused": true}"#,
        )
        .unwrap();
        let extracted = ensemble.extract_features(&fields);
        assert_eq!(extracted, vec![1.0, 2.5]);
    }

    #[test]
    fn missing_fields_become_nan() {
        let ensemble = regression_ensemble();
        let fields: serde_json::Map<String, Value> =
            serde_json::from_str(r#"{"a": "not numeric"}"#).unwrap();
        let extracted = ensemble.extract_features(&fields);
        assert!(extracted[0].is_nan());
        assert!(extracted[1].is_nan());
    }

    #[test]
    fn importance_support_requires_all_submodels() {
        let with_samples = TreeModel::new(
            vec!["a".to_string()],
            vec![0],
            vec![0.0],
            vec![0],
            vec![0],
            vec![true],
            vec![true],
            vec![vec![1.0]],
            Some(vec![10.0]),
        );
        let mixed = EnsembleModel::new(
            vec!["a".to_string()],
            vec![
                SubModel::Tree(with_samples),
                SubModel::Tree(constant_tree(&["a"], vec![2.0])),
            ],
            Aggregator::Average,
            TargetType::Regression,
        );
        assert!(!mixed.supports_feature_importance());
    }

    #[test]
    fn ram_bytes_include_submodels() {
        let ensemble = regression_ensemble();
        let submodel_bytes: usize = ensemble
            .models()
            .iter()
            .map(SubModel::ram_bytes_used)
            .sum();
        assert!(ensemble.ram_bytes_used() > submodel_bytes);
    }
}
