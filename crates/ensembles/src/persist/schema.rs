//! Schema types for the model document format.
//!
//! These types mirror the wire contract and are kept separate from runtime
//! types: every constructor-required field is optional here so that absence
//! is reported as a [`ReadError::MissingField`](super::ReadError) during
//! conversion instead of a generic parse failure.

use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregator;
use crate::model::TargetType;

/// Ensemble model document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trained_models: Option<Vec<SubModelSchema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate_output: Option<Aggregator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<TargetType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification_labels: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification_weights: Option<Vec<f64>>,
}

/// Polymorphic submodel descriptor, resolved by its `type` tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SubModelSchema {
    Tree(TreeSchema),
    Ensemble(Box<EnsembleSchema>),
}

/// Decision-tree document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
    #[serde(
        default,
        rename = "tree_structure",
        skip_serializing_if = "Option::is_none"
    )]
    pub nodes: Option<Vec<TreeNodeSchema>>,
}

/// One tree node. Leaves carry `leaf_value`; internal nodes carry the split
/// fields. Node indices are positions in the `tree_structure` array, with
/// the root at position 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNodeSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_feature: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(default = "default_true")]
    pub default_left: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_child: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_child: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaf_value: Option<LeafValueSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_samples: Option<f64>,
}

fn default_true() -> bool {
    true
}

/// Leaf values: a scalar for single-output trees, a vector otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LeafValueSchema {
    Scalar(f64),
    Vector(Vec<f64>),
}

impl LeafValueSchema {
    /// Normalize to a value vector.
    pub fn into_vec(self) -> Vec<f64> {
        match self {
            Self::Scalar(value) => vec![value],
            Self::Vector(values) => values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submodel_schema_is_tagged() {
        let json = r#"{"type":"tree","feature_names":["a"],"tree_structure":[{"leaf_value":1.5}]}"#;
        let parsed: SubModelSchema = serde_json::from_str(json).unwrap();
        assert!(matches!(parsed, SubModelSchema::Tree(_)));
    }

    #[test]
    fn leaf_value_accepts_scalar_and_vector() {
        let scalar: LeafValueSchema = serde_json::from_str("1.5").unwrap();
        assert_eq!(scalar.into_vec(), vec![1.5]);

        let vector: LeafValueSchema = serde_json::from_str("[0.1, 0.9]").unwrap();
        assert_eq!(vector.into_vec(), vec![0.1, 0.9]);
    }

    #[test]
    fn absent_fields_deserialize_to_none() {
        let schema: EnsembleSchema = serde_json::from_str("{}").unwrap();
        assert!(schema.feature_names.is_none());
        assert!(schema.trained_models.is_none());
        assert!(schema.aggregate_output.is_none());
        assert!(schema.target_type.is_none());
    }

    #[test]
    fn default_left_defaults_to_true() {
        let node: TreeNodeSchema = serde_json::from_str(r#"{"leaf_value":0.0}"#).unwrap();
        assert!(node.default_left);
    }
}
