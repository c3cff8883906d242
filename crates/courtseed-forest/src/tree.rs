// Gini-impurity classification tree grown on a (bootstrap) sample.
//
// Nodes live in a flat arena; splits send `value <= threshold` left.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// Number of non-constant candidate features examined per split.
    pub max_features: usize,
}

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        probabilities: Vec<f64>,
    },
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
    /// Sample-weighted Gini impurity of the two children.
    impurity: f64,
}

#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Grow a tree over `sample`, a list of row indices into `features`
    /// (duplicates allowed). `labels[i]` is the class index of row `i`, in
    /// `0..n_classes`.
    pub fn grow(
        features: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
        mut sample: Vec<usize>,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let n_features = features.first().map_or(0, Vec::len);
        let mut builder = Builder {
            features,
            labels,
            n_classes,
            n_features,
            params,
            rng,
            nodes: Vec::new(),
        };
        builder.build(&mut sample, 0);
        Self {
            nodes: builder.nodes,
        }
    }

    /// Class probabilities of the leaf that `row` falls into.
    pub fn predict_proba(&self, row: &[f64]) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                Node::Leaf { probabilities } => return probabilities,
            }
        }
    }

    /// Length of the longest root-to-leaf path, in edges.
    pub fn depth(&self) -> usize {
        self.depth_from(0)
    }

    fn depth_from(&self, idx: usize) -> usize {
        match &self.nodes[idx] {
            Node::Split { left, right, .. } => {
                1 + self.depth_from(*left).max(self.depth_from(*right))
            }
            Node::Leaf { .. } => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Growth
// ---------------------------------------------------------------------------

struct Builder<'a> {
    features: &'a [Vec<f64>],
    labels: &'a [usize],
    n_classes: usize,
    n_features: usize,
    params: &'a TreeParams,
    rng: &'a mut StdRng,
    nodes: Vec<Node>,
}

impl Builder<'_> {
    /// Recursively grow the subtree for `sample`, returning its node index.
    fn build(&mut self, sample: &mut [usize], depth: usize) -> usize {
        let counts = self.class_counts(sample);
        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        if pure
            || depth >= self.params.max_depth
            || sample.len() < 2 * self.params.min_samples_leaf
        {
            return self.push_leaf(&counts, sample.len());
        }

        let Some(split) = self.best_split(sample, &counts) else {
            return self.push_leaf(&counts, sample.len());
        };

        let features = self.features;
        let mid = partition(sample, |row| {
            features[row][split.feature] <= split.threshold
        });

        let idx = self.nodes.len();
        self.nodes.push(Node::Leaf {
            probabilities: Vec::new(),
        });
        let (left_sample, right_sample) = sample.split_at_mut(mid);
        let left = self.build(left_sample, depth + 1);
        let right = self.build(right_sample, depth + 1);
        self.nodes[idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        idx
    }

    fn class_counts(&self, sample: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes];
        for &row in sample {
            counts[self.labels[row]] += 1;
        }
        counts
    }

    fn push_leaf(&mut self, counts: &[usize], total: usize) -> usize {
        let probabilities = if total == 0 {
            vec![0.0; counts.len()]
        } else {
            counts.iter().map(|&c| c as f64 / total as f64).collect()
        };
        self.nodes.push(Node::Leaf { probabilities });
        self.nodes.len() - 1
    }

    /// Examine features in random order until `max_features` non-constant
    /// ones have been scanned; keep the lowest-impurity valid split.
    fn best_split(&mut self, sample: &[usize], parent_counts: &[usize]) -> Option<Split> {
        let mut order: Vec<usize> = (0..self.n_features).collect();
        order.shuffle(&mut *self.rng);

        let mut best: Option<Split> = None;
        let mut visited = 0;
        let mut values: Vec<(f64, usize)> = Vec::with_capacity(sample.len());

        for feature in order {
            if visited >= self.params.max_features {
                break;
            }
            values.clear();
            values.extend(
                sample
                    .iter()
                    .map(|&row| (self.features[row][feature], self.labels[row])),
            );
            values.sort_by(|a, b| a.0.total_cmp(&b.0));

            let (lo, hi) = (values[0].0, values[values.len() - 1].0);
            if lo == hi {
                continue;
            }
            visited += 1;

            if let Some(candidate) = self.scan_feature(feature, &values, parent_counts) {
                if best.map_or(true, |b| candidate.impurity < b.impurity) {
                    best = Some(candidate);
                }
            }
        }
        best
    }

    /// Sweep the sorted values of one feature, moving one sample at a time
    /// from the right child to the left.
    fn scan_feature(
        &self,
        feature: usize,
        values: &[(f64, usize)],
        parent_counts: &[usize],
    ) -> Option<Split> {
        let n = values.len();
        let min_leaf = self.params.min_samples_leaf;
        let mut left = vec![0usize; self.n_classes];
        let mut right = parent_counts.to_vec();
        let mut best: Option<Split> = None;

        for pos in 0..n - 1 {
            let class = values[pos].1;
            left[class] += 1;
            right[class] -= 1;

            let n_left = pos + 1;
            let n_right = n - n_left;
            if n_right < min_leaf {
                break;
            }
            if n_left < min_leaf || values[pos].0 == values[pos + 1].0 {
                continue;
            }

            let impurity = (n_left as f64 * gini(&left, n_left)
                + n_right as f64 * gini(&right, n_right))
                / n as f64;
            if best.map_or(true, |b| impurity < b.impurity) {
                let (lower, upper) = (values[pos].0, values[pos + 1].0);
                let mut threshold = lower + (upper - lower) / 2.0;
                if threshold >= upper {
                    threshold = lower;
                }
                best = Some(Split {
                    feature,
                    threshold,
                    impurity,
                });
            }
        }
        best
    }
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

/// Move rows satisfying `goes_left` to the front; returns how many did.
fn partition(sample: &mut [usize], goes_left: impl Fn(usize) -> bool) -> usize {
    let mut mid = 0;
    for i in 0..sample.len() {
        if goes_left(sample[i]) {
            sample.swap(i, mid);
            mid += 1;
        }
    }
    mid
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn leaf_count(tree: &DecisionTree) -> usize {
        tree.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    fn params(max_depth: usize, min_samples_leaf: usize) -> TreeParams {
        TreeParams {
            max_depth,
            min_samples_leaf,
            max_features: 1,
        }
    }

    #[test]
    fn gini_of_pure_and_even_nodes() {
        assert_eq!(gini(&[4, 0], 4), 0.0);
        assert!((gini(&[2, 2], 4) - 0.5).abs() < 1e-12);
        assert_eq!(gini(&[0, 0], 0), 0.0);
    }

    #[test]
    fn partition_moves_matching_rows_first() {
        let mut sample = vec![5, 1, 4, 2, 3];
        let mid = partition(&mut sample, |r| r <= 2);
        assert_eq!(mid, 2);
        let mut left = sample[..mid].to_vec();
        left.sort();
        assert_eq!(left, vec![1, 2]);
    }

    #[test]
    fn separable_feature_splits_cleanly() {
        let features: Vec<Vec<f64>> = (0..8).map(|i| vec![i as f64]).collect();
        let labels = vec![0, 0, 0, 0, 1, 1, 1, 1];
        let mut rng = StdRng::seed_from_u64(7);
        let tree = DecisionTree::grow(&features, &labels, 2, (0..8).collect(), &params(6, 1), &mut rng);

        assert_eq!(tree.depth(), 1);
        assert_eq!(leaf_count(&tree), 2);
        assert_eq!(tree.predict_proba(&[1.0]), &[1.0, 0.0]);
        assert_eq!(tree.predict_proba(&[6.0]), &[0.0, 1.0]);
        assert_eq!(tree.predict_proba(&[3.5]), &[1.0, 0.0]);
    }

    #[test]
    fn min_samples_leaf_blocks_small_children() {
        let features: Vec<Vec<f64>> = (0..6).map(|i| vec![i as f64]).collect();
        let labels = vec![1, 0, 0, 0, 0, 0];
        let mut rng = StdRng::seed_from_u64(7);
        let tree = DecisionTree::grow(&features, &labels, 2, (0..6).collect(), &params(6, 4), &mut rng);

        assert_eq!(leaf_count(&tree), 1);
        let proba = tree.predict_proba(&[0.0]);
        assert!((proba[1] - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn max_depth_bounds_growth() {
        let features: Vec<Vec<f64>> = (0..16).map(|i| vec![i as f64]).collect();
        let labels: Vec<usize> = (0..16).map(|i| i % 4).collect();
        let mut rng = StdRng::seed_from_u64(3);
        let tree = DecisionTree::grow(&features, &labels, 4, (0..16).collect(), &params(2, 1), &mut rng);
        assert!(tree.depth() <= 2);
    }

    #[test]
    fn constant_features_produce_single_leaf() {
        let features = vec![vec![1.0, 1.0]; 10];
        let labels = vec![0, 1, 0, 1, 0, 1, 0, 1, 0, 1];
        let mut rng = StdRng::seed_from_u64(11);
        let tree = DecisionTree::grow(
            &features,
            &labels,
            2,
            (0..10).collect(),
            &TreeParams {
                max_depth: 6,
                min_samples_leaf: 1,
                max_features: 2,
            },
            &mut rng,
        );
        assert_eq!(leaf_count(&tree), 1);
        assert_eq!(tree.predict_proba(&[1.0, 1.0]), &[0.5, 0.5]);
    }

    #[test]
    fn duplicated_bootstrap_rows_weight_leaf_probabilities() {
        let features = vec![vec![0.0], vec![0.0]];
        let labels = vec![0, 1];
        let mut rng = StdRng::seed_from_u64(1);
        let tree = DecisionTree::grow(&features, &labels, 2, vec![0, 0, 0, 1], &params(6, 1), &mut rng);
        assert_eq!(tree.predict_proba(&[0.0]), &[0.75, 0.25]);
    }
}
