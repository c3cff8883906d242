// Classifier abstraction and the class-probability distribution it produces.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum ForestError {
    #[error("cannot fit on an empty training set")]
    EmptyTrainingSet,

    #[error("feature/label length mismatch: {features} feature rows, {labels} labels")]
    LengthMismatch { features: usize, labels: usize },

    #[error("row {row} has {found} features, expected {expected}")]
    RaggedFeatures {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("model has not been fitted")]
    NotFitted,

    #[error("invalid parameter `{field}`: {message}")]
    InvalidParam {
        field: &'static str,
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Class distribution
// ---------------------------------------------------------------------------

/// Probability mass per class label, ordered by ascending label.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDistribution {
    entries: Vec<(u32, f64)>,
}

impl ClassDistribution {
    /// Pair each class label with its probability. Both slices must be in the
    /// same order; extra entries on either side are ignored.
    pub fn new(classes: &[u32], probabilities: &[f64]) -> Self {
        let entries = classes
            .iter()
            .copied()
            .zip(probabilities.iter().copied())
            .collect();
        Self { entries }
    }

    /// Probability of `label`, or 0.0 for a label the model never saw.
    pub fn probability(&self, label: u32) -> f64 {
        self.entries
            .iter()
            .find(|(c, _)| *c == label)
            .map_or(0.0, |(_, p)| *p)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.entries.iter().copied()
    }

    /// Probability-weighted mean of the class labels: `Σ P(c) · c`.
    pub fn expected_value(&self) -> f64 {
        self.entries.iter().map(|(c, p)| p * f64::from(*c)).sum()
    }
}

// ---------------------------------------------------------------------------
// Classifier trait
// ---------------------------------------------------------------------------

/// A trainable estimator mapping a feature row to a distribution over integer
/// class labels.
pub trait ProbabilisticClassifier {
    /// Train on `features` (one row per sample) and matching `labels`.
    fn fit(&mut self, features: &[Vec<f64>], labels: &[u32]) -> Result<(), ForestError>;

    /// Distinct labels seen during `fit`, ascending.
    fn classes(&self) -> &[u32];

    /// Predicted class distribution for a single feature row.
    fn predict_distribution(&self, features: &[f64]) -> Result<ClassDistribution, ForestError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_value_weights_labels_by_probability() {
        let dist = ClassDistribution::new(&[6, 12, 18], &[0.25, 0.5, 0.25]);
        assert!((dist.expected_value() - 12.0).abs() < 1e-12);
    }

    #[test]
    fn single_class_expected_value_is_the_label() {
        let dist = ClassDistribution::new(&[7], &[1.0]);
        assert!((dist.expected_value() - 7.0).abs() < f64::EPSILON);
        assert_eq!(dist.iter().collect::<Vec<_>>(), vec![(7, 1.0)]);
    }

    #[test]
    fn unseen_label_has_zero_probability() {
        let dist = ClassDistribution::new(&[3, 4], &[0.4, 0.6]);
        assert_eq!(dist.probability(5), 0.0);
        assert!((dist.probability(4) - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_distribution() {
        let dist = ClassDistribution::new(&[], &[]);
        assert_eq!(dist.iter().count(), 0);
        assert_eq!(dist.expected_value(), 0.0);
    }
}
