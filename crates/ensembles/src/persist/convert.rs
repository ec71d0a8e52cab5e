//! Conversion from schema types to validated runtime models.
//!
//! Conversions are `TryFrom` so every structural problem surfaces as a
//! [`ReadError`] at load time, before the model ever serves a request.

use super::error::ReadError;
use super::schema::{EnsembleSchema, SubModelSchema, TreeNodeSchema, TreeSchema};
use crate::model::{EnsembleModel, SubModel, TargetType, TreeModel};

impl TryFrom<EnsembleSchema> for EnsembleModel {
    type Error = ReadError;

    fn try_from(schema: EnsembleSchema) -> Result<Self, ReadError> {
        let feature_names = schema
            .feature_names
            .ok_or(ReadError::MissingField("feature_names"))?;
        let trained_models = schema
            .trained_models
            .ok_or(ReadError::MissingField("trained_models"))?;
        let aggregator = schema
            .aggregate_output
            .ok_or(ReadError::MissingField("aggregate_output"))?;
        let target_type = schema
            .target_type
            .ok_or(ReadError::MissingField("target_type"))?;

        if trained_models.is_empty() {
            return Err(ReadError::Validation(
                "trained_models must not be empty".to_string(),
            ));
        }
        if !aggregator.compatible_with(target_type) {
            return Err(ReadError::Validation(format!(
                "[{}] aggregator cannot serve [{target_type}] models",
                aggregator.name()
            )));
        }
        if target_type == TargetType::Regression
            && (schema.classification_labels.is_some()
                || schema.classification_weights.is_some())
        {
            return Err(ReadError::Validation(
                "classification labels and weights are only valid for classification".to_string(),
            ));
        }
        if let (Some(labels), Some(weights)) = (
            &schema.classification_labels,
            &schema.classification_weights,
        ) {
            if labels.len() != weights.len() {
                return Err(ReadError::Validation(format!(
                    "classification_weights length {} does not match classification_labels length {}",
                    weights.len(),
                    labels.len()
                )));
            }
        }

        let models = trained_models
            .into_iter()
            .map(SubModel::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let mut ensemble = EnsembleModel::new(feature_names, models, aggregator, target_type);
        if let Some(labels) = schema.classification_labels {
            ensemble = ensemble.with_classification_labels(labels);
        }
        if let Some(weights) = schema.classification_weights {
            ensemble = ensemble.with_classification_weights(weights);
        }
        Ok(ensemble)
    }
}

impl TryFrom<SubModelSchema> for SubModel {
    type Error = ReadError;

    fn try_from(schema: SubModelSchema) -> Result<Self, ReadError> {
        match schema {
            SubModelSchema::Tree(tree) => Ok(SubModel::Tree(TreeModel::try_from(tree)?)),
            SubModelSchema::Ensemble(ensemble) => Ok(SubModel::Ensemble(Box::new(
                EnsembleModel::try_from(*ensemble)?,
            ))),
        }
    }
}

impl TryFrom<TreeSchema> for TreeModel {
    type Error = ReadError;

    fn try_from(schema: TreeSchema) -> Result<Self, ReadError> {
        let feature_names = schema
            .feature_names
            .ok_or(ReadError::MissingField("feature_names"))?;
        let nodes = schema
            .nodes
            .ok_or(ReadError::MissingField("tree_structure"))?;
        if nodes.is_empty() {
            return Err(ReadError::Validation(
                "tree_structure must not be empty".to_string(),
            ));
        }

        let n_nodes = nodes.len();
        let mut split_indices = Vec::with_capacity(n_nodes);
        let mut thresholds = Vec::with_capacity(n_nodes);
        let mut left_children = Vec::with_capacity(n_nodes);
        let mut right_children = Vec::with_capacity(n_nodes);
        let mut default_left = Vec::with_capacity(n_nodes);
        let mut is_leaf = Vec::with_capacity(n_nodes);
        let mut leaf_values = Vec::with_capacity(n_nodes);
        let mut samples = Vec::with_capacity(n_nodes);
        let mut sampled_nodes = 0usize;
        let mut n_classes: Option<usize> = None;

        for (index, node) in nodes.into_iter().enumerate() {
            default_left.push(node.default_left);
            if let Some(count) = node.number_samples {
                samples.push(count);
                sampled_nodes += 1;
            } else {
                samples.push(0.0);
            }

            match node.leaf_value {
                Some(value) => {
                    let row = value.into_vec();
                    match n_classes {
                        Some(expected) if expected != row.len() => {
                            return Err(ReadError::Validation(format!(
                                "leaf at node {index} has {} values, expected {expected}",
                                row.len()
                            )));
                        }
                        None => n_classes = Some(row.len()),
                        _ => {}
                    }
                    split_indices.push(0);
                    thresholds.push(0.0);
                    left_children.push(0);
                    right_children.push(0);
                    is_leaf.push(true);
                    leaf_values.push(row);
                }
                None => {
                    let (split_feature, threshold, left, right) = split_fields(&node)?;
                    if split_feature as usize >= feature_names.len() {
                        return Err(ReadError::Validation(format!(
                            "node {index} splits on feature {split_feature} but only {} features are declared",
                            feature_names.len()
                        )));
                    }
                    for child in [left, right] {
                        if child as usize >= n_nodes || child as usize <= index {
                            return Err(ReadError::Validation(format!(
                                "node {index} references invalid child {child}"
                            )));
                        }
                    }
                    split_indices.push(split_feature);
                    thresholds.push(threshold);
                    left_children.push(left);
                    right_children.push(right);
                    is_leaf.push(false);
                    leaf_values.push(Vec::new());
                }
            }
        }

        let node_samples = match sampled_nodes {
            0 => None,
            n if n == n_nodes => Some(samples),
            _ => {
                return Err(ReadError::Validation(
                    "number_samples must be set on every node or on none".to_string(),
                ));
            }
        };

        Ok(TreeModel::new(
            feature_names,
            split_indices,
            thresholds,
            left_children,
            right_children,
            default_left,
            is_leaf,
            leaf_values,
            node_samples,
        ))
    }
}

fn split_fields(node: &TreeNodeSchema) -> Result<(u32, f64, u32, u32), ReadError> {
    Ok((
        node.split_feature
            .ok_or(ReadError::MissingField("split_feature"))?,
        node.threshold.ok_or(ReadError::MissingField("threshold"))?,
        node.left_child
            .ok_or(ReadError::MissingField("left_child"))?,
        node.right_child
            .ok_or(ReadError::MissingField("right_child"))?,
    ))
}
