//! Per-feature, per-class importance accumulation.

/// Accumulates `[feature][class]` importance contributions across submodels.
///
/// Rows are allocated lazily the first time a feature receives a
/// contribution; once set, every row for that feature must carry the same
/// class count. Accumulation is elementwise addition, never averaging.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportanceMatrix {
    rows: Vec<Vec<f64>>,
}

impl ImportanceMatrix {
    /// Create a matrix for `n_features` features with no contributions yet.
    pub fn new(n_features: usize) -> Self {
        Self {
            rows: vec![Vec::new(); n_features],
        }
    }

    /// Number of features (rows).
    #[inline]
    pub fn n_features(&self) -> usize {
        self.rows.len()
    }

    /// Importance values for one feature; empty if it never contributed.
    #[inline]
    pub fn row(&self, feature: usize) -> &[f64] {
        &self.rows[feature]
    }

    /// Add `values` into the row for `feature`, allocating it on first use.
    ///
    /// # Panics
    ///
    /// Panics if the row was previously set with a different class count;
    /// a shape mismatch means the trained model is corrupted.
    pub fn accumulate(&mut self, feature: usize, values: &[f64]) {
        let row = &mut self.rows[feature];
        if row.is_empty() {
            row.resize(values.len(), 0.0);
        }
        assert_eq!(
            row.len(),
            values.len(),
            "importance class count mismatch for feature {feature}"
        );
        for (acc, v) in row.iter_mut().zip(values) {
            *acc += v;
        }
    }

    /// Elementwise sum of another matrix into this one.
    ///
    /// # Panics
    ///
    /// Panics if the matrices disagree on feature count or class count.
    pub fn merge(&mut self, other: &ImportanceMatrix) {
        assert_eq!(
            self.rows.len(),
            other.rows.len(),
            "importance feature count mismatch"
        );
        for (feature, row) in other.rows.iter().enumerate() {
            if !row.is_empty() {
                self.accumulate(feature, row);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_allocate_lazily() {
        let mut matrix = ImportanceMatrix::new(3);
        assert!(matrix.row(0).is_empty());

        matrix.accumulate(1, &[0.5, -0.5]);
        assert!(matrix.row(0).is_empty());
        assert_eq!(matrix.row(1), &[0.5, -0.5]);
    }

    #[test]
    fn accumulate_sums_elementwise() {
        let mut matrix = ImportanceMatrix::new(2);
        matrix.accumulate(0, &[1.0, 2.0]);
        matrix.accumulate(0, &[0.25, -1.0]);
        assert_eq!(matrix.row(0), &[1.25, 1.0]);
    }

    #[test]
    fn merge_is_additive() {
        let mut a = ImportanceMatrix::new(2);
        a.accumulate(0, &[1.0]);

        let mut b = ImportanceMatrix::new(2);
        b.accumulate(0, &[2.0]);
        b.accumulate(1, &[3.0]);

        a.merge(&b);
        assert_eq!(a.row(0), &[3.0]);
        assert_eq!(a.row(1), &[3.0]);
    }

    #[test]
    #[should_panic(expected = "class count mismatch")]
    fn mismatched_class_count_panics() {
        let mut matrix = ImportanceMatrix::new(1);
        matrix.accumulate(0, &[1.0, 2.0]);
        matrix.accumulate(0, &[1.0]);
    }

    #[test]
    #[should_panic(expected = "feature count mismatch")]
    fn mismatched_feature_count_panics() {
        let mut a = ImportanceMatrix::new(2);
        let b = ImportanceMatrix::new(3);
        a.merge(&b);
    }
}
