// Probabilistic multi-class classification: column standardization, Gini
// decision trees, and a bootstrap random forest behind a classifier trait.

pub mod classifier;
pub mod forest;
pub mod scaler;
pub mod tree;

pub use classifier::{ClassDistribution, ForestError, ProbabilisticClassifier};
pub use forest::{ForestParams, RandomForest};
pub use scaler::StandardScaler;
