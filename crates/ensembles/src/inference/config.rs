//! Inference request configuration.
//!
//! A request carries one of three configurations: regression shaping,
//! classification shaping, or the raw no-shaping mode used when a nested
//! ensemble consumes a sub-ensemble's output directly.

use bon::Builder;
use serde::{Deserialize, Serialize};

use super::results::PredictedValue;
use crate::model::TargetType;

/// How a predicted class is rendered in results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionFieldType {
    #[default]
    String,
    Number,
    Bool,
}

impl PredictionFieldType {
    /// Render a class index as a result value, using `label` when present.
    pub fn format(self, class_index: usize, label: Option<&str>) -> PredictedValue {
        match self {
            Self::String => PredictedValue::String(
                label
                    .map(str::to_owned)
                    .unwrap_or_else(|| class_index.to_string()),
            ),
            Self::Number => PredictedValue::Number(class_index as f64),
            Self::Bool => PredictedValue::Bool(class_index == 1),
        }
    }
}

/// Configuration for regression requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
pub struct RegressionConfig {
    /// Number of top feature-importance records to return (0 = none).
    #[builder(default = 0)]
    pub num_top_feature_importance_values: usize,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            num_top_feature_importance_values: 0,
        }
    }
}

/// Configuration for classification requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
pub struct ClassificationConfig {
    /// Number of top classes to return alongside the predicted class.
    #[builder(default = 2)]
    pub num_top_classes: usize,
    /// Number of top feature-importance records to return (0 = none).
    #[builder(default = 0)]
    pub num_top_feature_importance_values: usize,
    /// Rendering of predicted labels.
    #[builder(default)]
    pub prediction_field_type: PredictionFieldType,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            num_top_classes: 2,
            num_top_feature_importance_values: 0,
            prediction_field_type: PredictionFieldType::default(),
        }
    }
}

/// Neutral sub-configuration carrying only the importance flag.
///
/// Submodels invoked through an ensemble receive this; it requests the raw
/// combined value with none of the outer request's shaping applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawConfig {
    pub request_importance: bool,
}

/// A caller-supplied inference request configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InferenceConfig {
    Regression(RegressionConfig),
    Classification(ClassificationConfig),
    /// No-shaping mode: the caller wants the raw aggregate value.
    Raw(RawConfig),
}

impl InferenceConfig {
    /// Default regression request.
    pub fn regression() -> Self {
        Self::Regression(RegressionConfig::default())
    }

    /// Default classification request.
    pub fn classification() -> Self {
        Self::Classification(ClassificationConfig::default())
    }

    /// Raw request, as issued by an enclosing ensemble.
    pub fn raw(request_importance: bool) -> Self {
        Self::Raw(RawConfig { request_importance })
    }

    /// Name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Regression(_) => "regression",
            Self::Classification(_) => "classification",
            Self::Raw(_) => "raw",
        }
    }

    /// Whether this configuration can serve the given target type.
    pub fn supports_target_type(&self, target_type: TargetType) -> bool {
        match self {
            Self::Regression(_) => target_type == TargetType::Regression,
            Self::Classification(_) => target_type == TargetType::Classification,
            Self::Raw(_) => true,
        }
    }

    /// Whether the caller asked for per-feature importance.
    pub fn requesting_importance(&self) -> bool {
        match self {
            Self::Regression(c) => c.num_top_feature_importance_values > 0,
            Self::Classification(c) => c.num_top_feature_importance_values > 0,
            Self::Raw(c) => c.request_importance,
        }
    }
}
