// Outcome model: standardized player features -> distribution over games won.
//
// The model is fitted and scored on the same player table. `games_won` is
// both an input column and the target label, so the reseed score is a
// smoothed re-estimate of games won rather than an out-of-sample prediction.

use courtseed_forest::{ClassDistribution, ForestError, ProbabilisticClassifier, StandardScaler};
use tracing::{info, warn};

use crate::player_table::{PlayerRow, PlayerTable};

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("cannot fit the outcome model on an empty player table")]
    EmptyTrainingSet,

    #[error("classifier error: {0}")]
    Classifier(#[from] ForestError),
}

/// A player row with its expected games won under the fitted model.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPlayer {
    pub player: PlayerRow,
    pub reseed_score: f64,
}

/// Feature scaler plus a fitted classifier.
#[derive(Debug, Clone)]
pub struct OutcomeModel<C> {
    scaler: StandardScaler,
    classifier: C,
}

impl<C: ProbabilisticClassifier> OutcomeModel<C> {
    /// Standardize the table's feature columns and fit `classifier` on them
    /// with `games_won` as the class label.
    pub fn fit(table: &PlayerTable, mut classifier: C) -> Result<Self, ModelError> {
        if table.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }

        let raw = table.feature_matrix();
        let scaler = StandardScaler::fit(&raw)?;
        let scaled = scaler.transform(&raw);
        classifier.fit(&scaled, &table.labels())?;

        let classes = classifier.classes();
        if classes.len() == 1 {
            warn!(
                "only one games-won class ({}) in {} rows; every reseed score will equal it",
                classes[0],
                table.len()
            );
        } else {
            info!(
                "outcome model fitted on {} rows, {} classes ({}..={})",
                table.len(),
                classes.len(),
                classes.first().copied().unwrap_or_default(),
                classes.last().copied().unwrap_or_default()
            );
        }

        Ok(Self { scaler, classifier })
    }

    pub fn classes(&self) -> &[u32] {
        self.classifier.classes()
    }

    pub fn predict_distribution(&self, row: &PlayerRow) -> Result<ClassDistribution, ModelError> {
        let scaled = self.scaler.transform_row(&row.feature_values());
        Ok(self.classifier.predict_distribution(&scaled)?)
    }

    /// `Σ P(class) · class` for one row.
    pub fn reseed_score(&self, row: &PlayerRow) -> Result<f64, ModelError> {
        Ok(self.predict_distribution(row)?.expected_value())
    }

    /// Score every row of `table`, keeping table order.
    pub fn score(&self, table: PlayerTable) -> Result<Vec<ScoredPlayer>, ModelError> {
        table
            .into_rows()
            .into_iter()
            .map(|player| {
                let reseed_score = self.reseed_score(&player)?;
                Ok(ScoredPlayer {
                    player,
                    reseed_score,
                })
            })
            .collect()
    }
}
