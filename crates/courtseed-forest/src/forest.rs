// Bootstrap-aggregated random forest of Gini classification trees.
//
// Every tree draws its own seed from a single generator seeded with
// `ForestParams::seed`, so a fixed seed reproduces the same forest.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::classifier::{ClassDistribution, ForestError, ProbabilisticClassifier};
use crate::tree::{DecisionTree, TreeParams};

/// Forest hyperparameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 200,
            max_depth: 6,
            min_samples_leaf: 4,
            seed: 42,
        }
    }
}

impl ForestParams {
    fn validate(&self) -> Result<(), ForestError> {
        let checks: &[(&'static str, usize)] = &[
            ("n_trees", self.n_trees),
            ("max_depth", self.max_depth),
            ("min_samples_leaf", self.min_samples_leaf),
        ];
        for &(field, value) in checks {
            if value == 0 {
                return Err(ForestError::InvalidParam {
                    field,
                    message: "must be > 0".into(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RandomForest {
    params: ForestParams,
    classes: Vec<u32>,
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            classes: Vec::new(),
            n_features: 0,
            trees: Vec::new(),
        }
    }
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(ForestParams::default())
    }
}

/// Candidate features per split: `max(1, floor(sqrt(n_features)))`.
fn sqrt_features(n_features: usize) -> usize {
    ((n_features as f64).sqrt().floor() as usize).max(1)
}

fn check_shape(features: &[Vec<f64>], labels: &[u32]) -> Result<usize, ForestError> {
    if features.is_empty() {
        return Err(ForestError::EmptyTrainingSet);
    }
    if features.len() != labels.len() {
        return Err(ForestError::LengthMismatch {
            features: features.len(),
            labels: labels.len(),
        });
    }
    let width = features[0].len();
    if let Some((row, bad)) = features.iter().enumerate().find(|(_, r)| r.len() != width) {
        return Err(ForestError::RaggedFeatures {
            row,
            expected: width,
            found: bad.len(),
        });
    }
    Ok(width)
}

impl ProbabilisticClassifier for RandomForest {
    fn fit(&mut self, features: &[Vec<f64>], labels: &[u32]) -> Result<(), ForestError> {
        self.params.validate()?;
        let n_features = check_shape(features, labels)?;

        let mut classes = labels.to_vec();
        classes.sort_unstable();
        classes.dedup();
        let class_idx: Vec<usize> = labels
            .iter()
            .map(|label| classes.binary_search(label).unwrap_or_default())
            .collect();

        let tree_params = TreeParams {
            max_depth: self.params.max_depth,
            min_samples_leaf: self.params.min_samples_leaf,
            max_features: sqrt_features(n_features),
        };

        let n = features.len();
        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let trees: Vec<DecisionTree> = (0..self.params.n_trees)
            .map(|_| {
                let mut tree_rng = StdRng::seed_from_u64(rng.gen());
                let sample: Vec<usize> = (0..n).map(|_| tree_rng.gen_range(0..n)).collect();
                DecisionTree::grow(
                    features,
                    &class_idx,
                    classes.len(),
                    sample,
                    &tree_params,
                    &mut tree_rng,
                )
            })
            .collect();

        debug!(
            "fitted {} trees on {} rows x {} features, {} classes (max depth reached: {})",
            trees.len(),
            n,
            n_features,
            classes.len(),
            trees.iter().map(DecisionTree::depth).max().unwrap_or(0)
        );

        self.classes = classes;
        self.n_features = n_features;
        self.trees = trees;
        Ok(())
    }

    fn classes(&self) -> &[u32] {
        &self.classes
    }

    /// Mean of the per-tree leaf distributions.
    fn predict_distribution(&self, features: &[f64]) -> Result<ClassDistribution, ForestError> {
        if self.trees.is_empty() {
            return Err(ForestError::NotFitted);
        }
        if features.len() != self.n_features {
            return Err(ForestError::RaggedFeatures {
                row: 0,
                expected: self.n_features,
                found: features.len(),
            });
        }

        let mut totals = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (total, p) in totals.iter_mut().zip(tree.predict_proba(features)) {
                *total += p;
            }
        }
        let n_trees = self.trees.len() as f64;
        for total in &mut totals {
            *total /= n_trees;
        }
        Ok(ClassDistribution::new(&self.classes, &totals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_params(seed: u64) -> ForestParams {
        ForestParams {
            n_trees: 25,
            max_depth: 4,
            min_samples_leaf: 1,
            seed,
        }
    }

    /// Two well separated clusters labelled 3 and 9.
    fn clustered() -> (Vec<Vec<f64>>, Vec<u32>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..10 {
            features.push(vec![i as f64 * 0.1, 1.0]);
            labels.push(3);
            features.push(vec![10.0 + i as f64 * 0.1, 1.0]);
            labels.push(9);
        }
        (features, labels)
    }

    #[test]
    fn sqrt_feature_count() {
        assert_eq!(sqrt_features(18), 4);
        assert_eq!(sqrt_features(1), 1);
        assert_eq!(sqrt_features(0), 1);
    }

    #[test]
    fn classes_are_sorted_distinct_labels() {
        let (features, _) = clustered();
        let labels: Vec<u32> = (0..20).map(|i| [12, 7, 12, 0][i % 4]).collect();
        let mut forest = RandomForest::new(small_params(1));
        forest.fit(&features, &labels).unwrap();
        assert_eq!(forest.classes(), &[0, 7, 12]);
        assert_eq!(forest.trees.len(), 25);
    }

    #[test]
    fn distributions_sum_to_one() {
        let (features, labels) = clustered();
        let mut forest = RandomForest::new(small_params(5));
        forest.fit(&features, &labels).unwrap();
        for row in &features {
            let dist = forest.predict_distribution(row).unwrap();
            let total: f64 = dist.iter().map(|(_, p)| p).sum();
            assert!((total - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn separated_clusters_are_recognised() {
        let (features, labels) = clustered();
        let mut forest = RandomForest::new(small_params(5));
        forest.fit(&features, &labels).unwrap();

        let low = forest.predict_distribution(&[0.2, 1.0]).unwrap();
        let high = forest.predict_distribution(&[10.5, 1.0]).unwrap();
        assert!(low.probability(3) > 0.5);
        assert!(high.probability(9) > 0.5);
        assert!(low.expected_value() < high.expected_value());
    }

    #[test]
    fn same_seed_reproduces_predictions() {
        let (features, labels) = clustered();
        let mut a = RandomForest::new(small_params(42));
        let mut b = RandomForest::new(small_params(42));
        a.fit(&features, &labels).unwrap();
        b.fit(&features, &labels).unwrap();
        for row in &features {
            assert_eq!(
                a.predict_distribution(row).unwrap(),
                b.predict_distribution(row).unwrap()
            );
        }
    }

    #[test]
    fn single_class_is_certain() {
        let features = vec![vec![1.0], vec![2.0], vec![3.0]];
        let mut forest = RandomForest::new(small_params(0));
        forest.fit(&features, &[6, 6, 6]).unwrap();
        let dist = forest.predict_distribution(&[2.0]).unwrap();
        assert_eq!(dist.iter().count(), 1);
        assert!((dist.probability(6) - 1.0).abs() < f64::EPSILON);
        assert!((dist.expected_value() - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn fit_errors() {
        let mut forest = RandomForest::default();
        assert_eq!(forest.fit(&[], &[]), Err(ForestError::EmptyTrainingSet));
        assert_eq!(
            forest.fit(&[vec![1.0]], &[1, 2]),
            Err(ForestError::LengthMismatch {
                features: 1,
                labels: 2
            })
        );

        let mut zero_trees = RandomForest::new(ForestParams {
            n_trees: 0,
            ..ForestParams::default()
        });
        assert!(matches!(
            zero_trees.fit(&[vec![1.0]], &[1]),
            Err(ForestError::InvalidParam { field: "n_trees", .. })
        ));
    }

    #[test]
    fn predict_before_fit_fails() {
        let forest = RandomForest::default();
        assert_eq!(
            forest.predict_distribution(&[1.0]),
            Err(ForestError::NotFitted)
        );
    }
}
