//! Target-type metadata.

use serde::{Deserialize, Serialize};

/// What an ensemble predicts: a continuous value or a discrete label.
///
/// Fixed at construction and immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    /// Continuous target.
    Regression,
    /// Discrete label with per-class probabilities.
    Classification,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regression => "regression",
            Self::Classification => "classification",
        }
    }

    pub fn is_classification(&self) -> bool {
        matches!(self, Self::Classification)
    }
}

impl std::fmt::Display for TargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
