// Per-column standardization to zero mean and unit variance.

use crate::classifier::ForestError;

/// Threshold below which a column's standard deviation is treated as zero.
const STDEV_EPSILON: f64 = 1e-9;

/// Mean and population standard deviation of one feature column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnStats {
    pub mean: f64,
    pub stdev: f64,
}

/// Mean and population standard deviation (N denominator) of `values`.
pub fn compute_column_stats(values: &[f64]) -> ColumnStats {
    if values.is_empty() {
        return ColumnStats {
            mean: 0.0,
            stdev: 0.0,
        };
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    ColumnStats {
        mean,
        stdev: variance.sqrt(),
    }
}

/// Standardize a value. A constant column maps every value to 0.0.
pub fn standardize(value: f64, stats: &ColumnStats) -> f64 {
    if stats.stdev < STDEV_EPSILON {
        return 0.0;
    }
    (value - stats.mean) / stats.stdev
}

/// Column statistics learned from a feature matrix.
#[derive(Debug, Clone, Default)]
pub struct StandardScaler {
    columns: Vec<ColumnStats>,
}

impl StandardScaler {
    /// Learn per-column statistics from `rows`. All rows must have the same
    /// width as the first.
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self, ForestError> {
        let Some(first) = rows.first() else {
            return Err(ForestError::EmptyTrainingSet);
        };
        let width = first.len();
        if let Some((row, bad)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(ForestError::RaggedFeatures {
                row,
                expected: width,
                found: bad.len(),
            });
        }

        let columns = (0..width)
            .map(|col| {
                let values: Vec<f64> = rows.iter().map(|r| r[col]).collect();
                compute_column_stats(&values)
            })
            .collect();
        Ok(Self { columns })
    }

    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(&self.columns)
            .map(|(v, stats)| standardize(*v, stats))
            .collect()
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn population_stats() {
        let stats = compute_column_stats(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((stats.mean - 5.0).abs() < 1e-12);
        assert!((stats.stdev - 2.0).abs() < 1e-12);
    }

    #[test]
    fn empty_slice_gives_zero_stats() {
        let stats = compute_column_stats(&[]);
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.stdev, 0.0);
    }

    #[test]
    fn constant_column_standardizes_to_zero() {
        let scaler = StandardScaler::fit(&[vec![3.0, 1.0], vec![3.0, 3.0]]).unwrap();
        let out = scaler.transform(&[vec![3.0, 1.0], vec![3.0, 3.0]]);
        assert_eq!(out[0][0], 0.0);
        assert_eq!(out[1][0], 0.0);
        assert!((out[0][1] + 1.0).abs() < 1e-12);
        assert!((out[1][1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn transformed_columns_have_zero_mean_unit_variance() {
        let rows = vec![
            vec![1.0, 10.0],
            vec![2.0, 30.0],
            vec![3.0, 20.0],
            vec![6.0, 40.0],
        ];
        let scaler = StandardScaler::fit(&rows).unwrap();
        let out = scaler.transform(&rows);
        for col in 0..2 {
            let values: Vec<f64> = out.iter().map(|r| r[col]).collect();
            let stats = compute_column_stats(&values);
            assert!(stats.mean.abs() < 1e-12);
            assert!((stats.stdev - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn fit_rejects_empty_and_ragged_input() {
        assert_eq!(
            StandardScaler::fit(&[]).unwrap_err(),
            ForestError::EmptyTrainingSet
        );
        assert_eq!(
            StandardScaler::fit(&[vec![1.0, 2.0], vec![1.0]]).unwrap_err(),
            ForestError::RaggedFeatures {
                row: 1,
                expected: 2,
                found: 1
            }
        );
    }
}
