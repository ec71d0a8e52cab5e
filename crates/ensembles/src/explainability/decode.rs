//! Importance decoding and shaping into display records.
//!
//! Raw importance rows are indexed by the model's feature positions. The
//! decoder mapping folds derived encodings (one-hot and friends) back to the
//! human-facing field they came from before results are shaped.

use std::collections::HashMap;

use serde::Serialize;

use super::matrix::ImportanceMatrix;

/// Per-class importance entry for classification targets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassImportance {
    pub class_name: String,
    pub importance: f64,
}

/// Decoded, display-ready importance for one feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportance {
    pub feature_name: String,
    /// Total attribution: the raw value for single-output targets, the sum
    /// of absolute per-class attributions otherwise.
    pub importance: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<ClassImportance>,
}

/// Resolve a class index to its display label, falling back to the index.
pub(crate) fn class_label(index: usize, labels: Option<&[String]>) -> String {
    labels
        .and_then(|l| l.get(index))
        .cloned()
        .unwrap_or_else(|| index.to_string())
}

/// Fold raw per-feature rows into display features via `decoder`.
///
/// Raw features mapping to the same display name have their rows summed
/// elementwise. An empty decoder map is an identity rename. First-seen
/// order is preserved.
pub fn decode_feature_importances(
    decoder: &HashMap<String, String>,
    feature_names: &[String],
    matrix: &ImportanceMatrix,
) -> Vec<(String, Vec<f64>)> {
    debug_assert_eq!(feature_names.len(), matrix.n_features());

    let mut decoded: Vec<(String, Vec<f64>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (feature, name) in feature_names.iter().enumerate() {
        let row = matrix.row(feature);
        if row.is_empty() {
            continue;
        }
        let display = decoder.get(name).unwrap_or(name);
        match index.get(display) {
            Some(&at) => {
                let acc = &mut decoded[at].1;
                assert_eq!(
                    acc.len(),
                    row.len(),
                    "decoded importance class count mismatch for [{display}]"
                );
                for (a, v) in acc.iter_mut().zip(row) {
                    *a += v;
                }
            }
            None => {
                index.insert(display.clone(), decoded.len());
                decoded.push((display.clone(), row.to_vec()));
            }
        }
    }
    decoded
}

/// Shape decoded rows into [`FeatureImportance`] records.
///
/// Single-column rows become a plain importance value; multi-column rows
/// carry per-class entries labeled via `labels` with an index fallback.
pub fn transform_feature_importance(
    decoded: Vec<(String, Vec<f64>)>,
    labels: Option<&[String]>,
) -> Vec<FeatureImportance> {
    decoded
        .into_iter()
        .map(|(feature_name, row)| {
            if row.len() == 1 {
                FeatureImportance {
                    feature_name,
                    importance: row[0],
                    classes: Vec::new(),
                }
            } else {
                let importance = row.iter().map(|v| v.abs()).sum();
                let classes = row
                    .iter()
                    .enumerate()
                    .map(|(class, &value)| ClassImportance {
                        class_name: class_label(class, labels),
                        importance: value,
                    })
                    .collect();
                FeatureImportance {
                    feature_name,
                    importance,
                    classes,
                }
            }
        })
        .collect()
}

/// Keep the `n` records with the largest absolute total importance.
pub fn top_importances(mut records: Vec<FeatureImportance>, n: usize) -> Vec<FeatureImportance> {
    records.sort_by(|a, b| {
        b.importance
            .abs()
            .partial_cmp(&a.importance.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    records.truncate(n);
    records
}
