//! Typed inference results.
//!
//! The shaped result types serialize for the response-formatting layer;
//! [`RawPrediction`] stays in-process, consumed by enclosing ensembles.

use serde::Serialize;

use super::config::PredictionFieldType;
use crate::explainability::{class_label, FeatureImportance, ImportanceMatrix};

/// A single rendered prediction value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PredictedValue {
    String(String),
    Number(f64),
    Bool(bool),
}

impl std::fmt::Display for PredictedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Raw combined output, untouched by label or threshold shaping.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPrediction {
    /// Score vector: the aggregated scalar for an ensemble, the per-class
    /// leaf values for a tree.
    pub value: Vec<f64>,
    /// Accumulated `[feature][class]` importance, present when requested.
    pub feature_importance: Option<ImportanceMatrix>,
}

/// Regression result: combined scalar plus optional named importance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionResults {
    pub value: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub feature_importance: Vec<FeatureImportance>,
}

/// One entry in the ordered top-classes list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopClassEntry {
    pub class_name: PredictedValue,
    /// Unweighted, normalized probability.
    pub class_probability: f64,
    /// Probability after applying the optional class weight.
    pub class_score: f64,
}

/// Classification result: predicted label, top classes, optional importance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResults {
    pub predicted_value: PredictedValue,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub top_classes: Vec<TopClassEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub feature_importance: Vec<FeatureImportance>,
}

/// Result of one inference call, shaped per the request configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceResults {
    Raw(RawPrediction),
    Regression(RegressionResults),
    Classification(ClassificationResults),
}

impl InferenceResults {
    pub fn as_regression(&self) -> Option<&RegressionResults> {
        match self {
            Self::Regression(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_classification(&self) -> Option<&ClassificationResults> {
        match self {
            Self::Classification(c) => Some(c),
            _ => None,
        }
    }

    pub fn into_raw(self) -> Option<RawPrediction> {
        match self {
            Self::Raw(raw) => Some(raw),
            _ => None,
        }
    }
}

/// Select the weighted top classes from a processed probability vector.
///
/// Scores are `probability * weight` (weight defaults to 1); entries are
/// sorted by score descending and capped at `num_top_classes`. Returns the
/// winning class index alongside the entries. Ties keep the lower index.
pub(crate) fn top_classes(
    probabilities: &[f64],
    labels: Option<&[String]>,
    weights: Option<&[f64]>,
    num_top_classes: usize,
    field_type: PredictionFieldType,
) -> (usize, Vec<TopClassEntry>) {
    debug_assert!(!probabilities.is_empty());
    let score = |class: usize| probabilities[class] * weights.map_or(1.0, |w| w[class]);

    let mut order: Vec<usize> = (0..probabilities.len()).collect();
    order.sort_by(|&a, &b| {
        score(b)
            .partial_cmp(&score(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let top = order[0];
    let entries = order
        .iter()
        .take(num_top_classes.min(probabilities.len()))
        .map(|&class| TopClassEntry {
            class_name: field_type.format(class, label_at(labels, class)),
            class_probability: probabilities[class],
            class_score: score(class),
        })
        .collect();
    (top, entries)
}

fn label_at(labels: Option<&[String]>, class: usize) -> Option<&str> {
    labels.and_then(|l| l.get(class)).map(String::as_str)
}

/// Resolve a class index to its display label (index fallback).
pub fn classification_label(class: usize, labels: Option<&[String]>) -> String {
    class_label(class, labels)
}
