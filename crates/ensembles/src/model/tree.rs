//! Decision-tree leaf scorer.
//!
//! Structure-of-arrays node storage for cache-friendly traversal. Missing
//! feature values (NaN) follow each node's default direction. When per-node
//! sample counts are available the tree also attributes per-feature
//! importance along the decision path.

use std::collections::HashMap;

use crate::explainability::ImportanceMatrix;
use crate::inference::RawPrediction;
use crate::utils::OrderedSet;

/// A trained decision tree scoring a feature vector to a per-class value.
///
/// Node arrays are index-aligned; children reference nodes within the same
/// tree. Before [`rewrite_feature_indices`](Self::rewrite_feature_indices)
/// runs, split indices address positions in the local `feature_names` list;
/// afterwards they address the compacted feature vector directly.
#[derive(Debug, Clone)]
pub struct TreeModel {
    feature_names: Vec<String>,
    split_indices: Box<[u32]>,
    thresholds: Box<[f64]>,
    left_children: Box<[u32]>,
    right_children: Box<[u32]>,
    default_left: Box<[bool]>,
    is_leaf: Box<[bool]>,
    /// Per-node value vectors; empty for internal nodes.
    leaf_values: Box<[Vec<f64>]>,
    /// Training sample count per node; required for importance.
    node_samples: Option<Box<[f64]>>,
    /// Expected value per node, derived from leaves and sample counts.
    node_expectations: Option<Box<[Vec<f64>]>>,
    n_classes: usize,
}

impl TreeModel {
    /// Create a tree from parallel node arrays.
    ///
    /// All arrays must be index-aligned with node 0 as the root; the
    /// persistence layer performs full structural validation before calling
    /// this.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        feature_names: Vec<String>,
        split_indices: Vec<u32>,
        thresholds: Vec<f64>,
        left_children: Vec<u32>,
        right_children: Vec<u32>,
        default_left: Vec<bool>,
        is_leaf: Vec<bool>,
        leaf_values: Vec<Vec<f64>>,
        node_samples: Option<Vec<f64>>,
    ) -> Self {
        let n_nodes = split_indices.len();
        debug_assert!(n_nodes > 0, "tree must have at least one node");
        debug_assert_eq!(n_nodes, thresholds.len());
        debug_assert_eq!(n_nodes, left_children.len());
        debug_assert_eq!(n_nodes, right_children.len());
        debug_assert_eq!(n_nodes, default_left.len());
        debug_assert_eq!(n_nodes, is_leaf.len());
        debug_assert_eq!(n_nodes, leaf_values.len());

        let n_classes = leaf_values
            .iter()
            .zip(&is_leaf)
            .find(|(_, &leaf)| leaf)
            .map(|(values, _)| values.len())
            .unwrap_or(1);

        let mut tree = Self {
            feature_names,
            split_indices: split_indices.into_boxed_slice(),
            thresholds: thresholds.into_boxed_slice(),
            left_children: left_children.into_boxed_slice(),
            right_children: right_children.into_boxed_slice(),
            default_left: default_left.into_boxed_slice(),
            is_leaf: is_leaf.into_boxed_slice(),
            leaf_values: leaf_values.into_boxed_slice(),
            node_samples: node_samples.map(Vec::into_boxed_slice),
            node_expectations: None,
            n_classes,
        };
        tree.node_expectations = tree
            .node_samples
            .clone()
            .map(|samples| tree.compute_expectations(&samples));
        tree
    }

    /// Number of nodes.
    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.split_indices.len()
    }

    /// Number of output classes (1 for regression trees).
    #[inline]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Declared feature names; empty after index rewriting.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Split feature index for a node.
    #[inline]
    pub fn split_index(&self, node: usize) -> u32 {
        self.split_indices[node]
    }

    /// Whether a node is a leaf.
    #[inline]
    pub fn is_leaf(&self, node: usize) -> bool {
        self.is_leaf[node]
    }

    /// Decision-path importance is available when sample counts are.
    pub fn supports_feature_importance(&self) -> bool {
        self.node_expectations.is_some()
    }

    /// Score a feature vector, optionally attributing importance along the
    /// decision path.
    ///
    /// Each visited split attributes `expectation(child) - expectation(node)`
    /// to its split feature, so the attributions plus the root expectation
    /// sum to the returned value.
    pub fn infer_raw(&self, features: &[f64], importance_requested: bool) -> RawPrediction {
        let mut node = 0usize;
        let mut matrix = importance_requested.then(|| ImportanceMatrix::new(features.len()));

        if let Some(matrix) = matrix.as_mut() {
            let expectations = self
                .node_expectations
                .as_ref()
                .expect("feature importance requires node sample counts");
            while !self.is_leaf[node] {
                let next = self.next_node(node, features);
                let delta: Vec<f64> = expectations[next]
                    .iter()
                    .zip(&expectations[node])
                    .map(|(child, parent)| child - parent)
                    .collect();
                matrix.accumulate(self.split_indices[node] as usize, &delta);
                node = next;
            }
        } else {
            while !self.is_leaf[node] {
                node = self.next_node(node, features);
            }
        }

        RawPrediction {
            value: self.leaf_values[node].clone(),
            feature_importance: matrix,
        }
    }

    /// Collect the feature names this tree references.
    pub(crate) fn collect_features(&self, out: &mut OrderedSet<String>) {
        for name in &self.feature_names {
            out.insert(name.clone());
        }
    }

    /// Remap node split indices through a parent-provided dense mapping.
    ///
    /// An empty mapping is a no-op (a standalone tree already owns its
    /// numbering). After remapping the local names are discarded.
    pub fn rewrite_feature_indices(&mut self, mapping: &HashMap<String, usize>) {
        if mapping.is_empty() {
            return;
        }
        for node in 0..self.n_nodes() {
            if self.is_leaf[node] {
                continue;
            }
            let name = &self.feature_names[self.split_indices[node] as usize];
            let index = mapping
                .get(name)
                .unwrap_or_else(|| panic!("feature [{name}] missing from rewrite mapping"));
            self.split_indices[node] = *index as u32;
        }
        self.feature_names = Vec::new();
    }

    /// Approximate heap footprint in bytes.
    pub fn ram_bytes_used(&self) -> usize {
        use std::mem::{size_of, size_of_val};
        let mut size = size_of::<Self>();
        size += self
            .feature_names
            .iter()
            .map(|name| size_of::<String>() + name.capacity())
            .sum::<usize>();
        size += size_of_val(&*self.split_indices);
        size += size_of_val(&*self.thresholds);
        size += size_of_val(&*self.left_children);
        size += size_of_val(&*self.right_children);
        size += size_of_val(&*self.default_left);
        size += size_of_val(&*self.is_leaf);
        size += vec_rows_bytes(&self.leaf_values);
        if let Some(samples) = &self.node_samples {
            size += size_of_val(&**samples);
        }
        if let Some(expectations) = &self.node_expectations {
            size += vec_rows_bytes(expectations);
        }
        size
    }

    #[inline]
    fn next_node(&self, node: usize, features: &[f64]) -> usize {
        let value = features[self.split_indices[node] as usize];
        let go_left = if value.is_nan() {
            self.default_left[node]
        } else {
            value < self.thresholds[node]
        };
        if go_left {
            self.left_children[node] as usize
        } else {
            self.right_children[node] as usize
        }
    }

    fn compute_expectations(&self, samples: &[f64]) -> Box<[Vec<f64>]> {
        let mut expectations = vec![Vec::new(); self.n_nodes()];
        self.fill_expectation(0, samples, &mut expectations);
        expectations.into_boxed_slice()
    }

    fn fill_expectation(&self, node: usize, samples: &[f64], out: &mut [Vec<f64>]) {
        if self.is_leaf[node] {
            out[node] = self.leaf_values[node].clone();
            return;
        }
        let left = self.left_children[node] as usize;
        let right = self.right_children[node] as usize;
        self.fill_expectation(left, samples, out);
        self.fill_expectation(right, samples, out);

        let total = samples[node];
        let expectation: Vec<f64> = out[left]
            .iter()
            .zip(out[right].iter())
            .map(|(l, r)| {
                if total > 0.0 {
                    (l * samples[left] + r * samples[right]) / total
                } else {
                    0.0
                }
            })
            .collect();
        out[node] = expectation;
    }
}

fn vec_rows_bytes(rows: &[Vec<f64>]) -> usize {
    rows.iter()
        .map(|row| std::mem::size_of::<Vec<f64>>() + row.capacity() * std::mem::size_of::<f64>())
        .sum()
}
