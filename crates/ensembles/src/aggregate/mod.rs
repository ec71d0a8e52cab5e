//! Pluggable output aggregators.
//!
//! An aggregator combines per-submodel raw score rows into one processed
//! vector ([`process_values`](Aggregator::process_values)) and reduces a
//! processed vector to a single scalar
//! ([`aggregate`](Aggregator::aggregate)). Both operations are pure and
//! deterministic; the ensemble core is agnostic to which variant is used.

use serde::{Deserialize, Serialize};

use crate::model::TargetType;

/// Aggregation strategies for combining submodel outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Aggregator {
    /// Weighted sum of single-valued submodel outputs.
    WeightedSum {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        weights: Option<Vec<f64>>,
    },
    /// Columnwise mean across submodels.
    Average,
    /// Weighted vote over predicted classes, normalized to probabilities.
    WeightedMode {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        weights: Option<Vec<f64>>,
        num_classes: usize,
    },
    /// Logistic-regression stacking over single-valued submodel outputs.
    LogisticRegression {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        weights: Option<Vec<f64>>,
    },
}

/// Structural mismatches between trained submodels and the aggregator.
///
/// Nothing here is transient; a failed aggregation means the model document
/// and its submodels disagree.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AggregateError {
    #[error("[{aggregator}] received no submodel values")]
    EmptyValues { aggregator: &'static str },

    #[error("[{aggregator}] has {expected} weights but received {actual} submodel values")]
    WeightCountMismatch {
        aggregator: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("[{aggregator}] submodel value rows must share one length; row {row} has {actual}, expected {expected}")]
    RaggedValues {
        aggregator: &'static str,
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("[{aggregator}] requires single-valued submodel outputs, got a row of length {actual}")]
    MultiValued {
        aggregator: &'static str,
        actual: usize,
    },
}

impl Aggregator {
    /// Name used in documents and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::WeightedSum { .. } => "weighted_sum",
            Self::Average => "average",
            Self::WeightedMode { .. } => "weighted_mode",
            Self::LogisticRegression { .. } => "logistic_regression",
        }
    }

    /// Whether this aggregator can serve the given target type.
    pub fn compatible_with(&self, target_type: TargetType) -> bool {
        match self {
            Self::WeightedSum { .. } => target_type == TargetType::Regression,
            Self::Average => true,
            Self::WeightedMode { .. } | Self::LogisticRegression { .. } => {
                target_type == TargetType::Classification
            }
        }
    }

    /// Combine per-submodel score rows into one processed vector.
    ///
    /// Tolerates any positive submodel count; the row count is checked
    /// against the configured weights rather than assumed.
    pub fn process_values(&self, values: &[Vec<f64>]) -> Result<Vec<f64>, AggregateError> {
        if values.is_empty() {
            return Err(AggregateError::EmptyValues {
                aggregator: self.name(),
            });
        }
        match self {
            Self::WeightedSum { weights } => {
                self.check_weights(weights, values.len())?;
                values
                    .iter()
                    .enumerate()
                    .map(|(row, scores)| {
                        if scores.len() != 1 {
                            return Err(AggregateError::MultiValued {
                                aggregator: self.name(),
                                actual: scores.len(),
                            });
                        }
                        Ok(scores[0] * weight_at(weights, row))
                    })
                    .collect()
            }
            Self::Average => {
                let width = values[0].len();
                let mut sums = vec![0.0; width];
                for (row, scores) in values.iter().enumerate() {
                    if scores.len() != width {
                        return Err(AggregateError::RaggedValues {
                            aggregator: self.name(),
                            row,
                            expected: width,
                            actual: scores.len(),
                        });
                    }
                    for (sum, v) in sums.iter_mut().zip(scores) {
                        *sum += v;
                    }
                }
                let n = values.len() as f64;
                Ok(sums.into_iter().map(|sum| sum / n).collect())
            }
            Self::WeightedMode {
                weights,
                num_classes,
            } => {
                self.check_weights(weights, values.len())?;
                let mut votes = vec![0.0; *num_classes];
                let mut total = 0.0;
                for (row, scores) in values.iter().enumerate() {
                    let class = if scores.len() == 1 {
                        scores[0] as usize
                    } else {
                        argmax(scores)
                    };
                    assert!(
                        class < *num_classes,
                        "voted class {class} out of range for {num_classes} classes"
                    );
                    let weight = weight_at(weights, row);
                    votes[class] += weight;
                    total += weight;
                }
                if total > 0.0 {
                    for vote in votes.iter_mut() {
                        *vote /= total;
                    }
                }
                Ok(votes)
            }
            Self::LogisticRegression { weights } => {
                self.check_weights(weights, values.len())?;
                let mut sum = 0.0;
                for (row, scores) in values.iter().enumerate() {
                    if scores.len() != 1 {
                        return Err(AggregateError::MultiValued {
                            aggregator: self.name(),
                            actual: scores.len(),
                        });
                    }
                    sum += scores[0] * weight_at(weights, row);
                }
                let p = sigmoid(sum);
                Ok(vec![1.0 - p, p])
            }
        }
    }

    /// Reduce a processed vector to a single scalar.
    ///
    /// Value combiners sum the vector; class voters return the index of the
    /// highest-scoring class.
    pub fn aggregate(&self, processed: &[f64]) -> f64 {
        match self {
            Self::WeightedSum { .. } | Self::Average => processed.iter().sum(),
            Self::WeightedMode { .. } | Self::LogisticRegression { .. } => {
                argmax(processed) as f64
            }
        }
    }

    fn check_weights(
        &self,
        weights: &Option<Vec<f64>>,
        n_rows: usize,
    ) -> Result<(), AggregateError> {
        if let Some(w) = weights {
            if w.len() != n_rows {
                return Err(AggregateError::WeightCountMismatch {
                    aggregator: self.name(),
                    expected: w.len(),
                    actual: n_rows,
                });
            }
        }
        Ok(())
    }
}

#[inline]
fn weight_at(weights: &Option<Vec<f64>>, row: usize) -> f64 {
    weights.as_ref().map_or(1.0, |w| w[row])
}

/// Standard logistic function mapping a log-odds score to a probability.
#[inline]
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Index of the maximum value; the first wins on ties.
#[inline]
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn weighted_sum_applies_weights_and_sums() {
        let agg = Aggregator::WeightedSum {
            weights: Some(vec![0.5, 2.0]),
        };
        let processed = agg.process_values(&[vec![4.0], vec![1.0]]).unwrap();
        assert_eq!(processed, vec![2.0, 2.0]);
        assert_abs_diff_eq!(agg.aggregate(&processed), 4.0);
    }

    #[test]
    fn weighted_sum_without_weights_is_plain_sum() {
        let agg = Aggregator::WeightedSum { weights: None };
        let processed = agg.process_values(&[vec![1.0], vec![3.0]]).unwrap();
        assert_abs_diff_eq!(agg.aggregate(&processed), 4.0);
    }

    #[test]
    fn average_is_columnwise_mean() {
        let agg = Aggregator::Average;
        let processed = agg
            .process_values(&[vec![0.2, 0.8], vec![0.6, 0.4]])
            .unwrap();
        assert_abs_diff_eq!(processed[0], 0.4);
        assert_abs_diff_eq!(processed[1], 0.6);
    }

    #[test]
    fn average_rejects_ragged_rows() {
        let agg = Aggregator::Average;
        let err = agg.process_values(&[vec![0.2, 0.8], vec![0.6]]).unwrap_err();
        assert!(matches!(err, AggregateError::RaggedValues { row: 1, .. }));
    }

    #[test]
    fn weighted_mode_votes_by_weight() {
        let agg = Aggregator::WeightedMode {
            weights: Some(vec![1.0, 1.0, 3.0]),
            num_classes: 2,
        };
        // Two models vote class 0, one heavy model votes class 1.
        let processed = agg
            .process_values(&[vec![0.0], vec![0.0], vec![1.0]])
            .unwrap();
        assert_abs_diff_eq!(processed[0], 0.4);
        assert_abs_diff_eq!(processed[1], 0.6);
        assert_eq!(agg.aggregate(&processed), 1.0);
    }

    #[test]
    fn weighted_mode_accepts_probability_rows() {
        let agg = Aggregator::WeightedMode {
            weights: None,
            num_classes: 2,
        };
        let processed = agg
            .process_values(&[vec![0.1, 0.9], vec![0.8, 0.2]])
            .unwrap();
        assert_abs_diff_eq!(processed[0], 0.5);
        assert_abs_diff_eq!(processed[1], 0.5);
    }

    #[test]
    fn logistic_regression_emits_probability_pair() {
        let agg = Aggregator::LogisticRegression { weights: None };
        let processed = agg.process_values(&[vec![0.0]]).unwrap();
        assert_abs_diff_eq!(processed[0], 0.5);
        assert_abs_diff_eq!(processed[1], 0.5);
        assert_abs_diff_eq!(processed[0] + processed[1], 1.0);
    }

    #[test]
    fn weight_count_is_checked() {
        let agg = Aggregator::WeightedSum {
            weights: Some(vec![1.0]),
        };
        let err = agg.process_values(&[vec![1.0], vec![2.0]]).unwrap_err();
        assert!(matches!(
            err,
            AggregateError::WeightCountMismatch {
                expected: 1,
                actual: 2,
                ..
            }
        ));
    }

    #[test]
    fn empty_values_are_rejected() {
        let err = Aggregator::Average.process_values(&[]).unwrap_err();
        assert!(matches!(err, AggregateError::EmptyValues { .. }));
    }

    #[test]
    fn compatibility_by_target_type() {
        let sum = Aggregator::WeightedSum { weights: None };
        assert!(sum.compatible_with(TargetType::Regression));
        assert!(!sum.compatible_with(TargetType::Classification));

        assert!(Aggregator::Average.compatible_with(TargetType::Regression));
        assert!(Aggregator::Average.compatible_with(TargetType::Classification));

        let mode = Aggregator::WeightedMode {
            weights: None,
            num_classes: 2,
        };
        assert!(!mode.compatible_with(TargetType::Regression));
        assert!(mode.compatible_with(TargetType::Classification));
    }

    #[test]
    fn serde_tagged_roundtrip() {
        let agg = Aggregator::WeightedMode {
            weights: Some(vec![1.0, 2.0]),
            num_classes: 3,
        };
        let json = serde_json::to_string(&agg).unwrap();
        assert!(json.contains(r#""type":"weighted_mode""#));

        let parsed: Aggregator = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, agg);
    }

    #[test]
    fn serde_skips_absent_weights() {
        let json = serde_json::to_string(&Aggregator::WeightedSum { weights: None }).unwrap();
        assert!(!json.contains("weights"));
    }
}
