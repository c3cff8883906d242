// Player-level table: two feature rows per match, incomplete rows dropped,
// then the composite serve and pressure features.

use serde::Deserialize;
use tracing::{debug, info};

use crate::dataset::{DatasetError, MatchRecord, MatchTable};
use crate::features::{FeatureExtractor, FeatureVector, FieldDefaults, Role, FEATURE_COUNT};

/// Tournament and round selecting the matches to reseed. Both compare by
/// exact, case-sensitive equality.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MatchFilter {
    pub tourney_name: String,
    pub round: String,
}

impl MatchFilter {
    pub fn new(tourney_name: impl Into<String>, round: impl Into<String>) -> Self {
        Self {
            tourney_name: tourney_name.into(),
            round: round.into(),
        }
    }

    /// The filter's round within its tournament.
    pub fn apply(&self, table: &MatchTable) -> Result<MatchTable, DatasetError> {
        table.tournament(&self.tourney_name)?.round(&self.round)
    }
}

/// A complete feature row plus the composites computed over the table.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRow {
    pub player_name: String,
    pub features: FeatureVector,
    pub serve_dominance: f64,
    pub mental_toughness: f64,
}

impl PlayerRow {
    fn from_complete(features: FeatureVector) -> Option<Self> {
        let player_name = features.player_name.clone()?;
        Some(Self {
            player_name,
            serve_dominance: features.first_serve_win_pct + features.second_serve_win_pct,
            mental_toughness: features.bp_saved_rate - features.df_rate,
            features,
        })
    }

    /// Model inputs in `FEATURE_COLUMNS` order.
    pub fn feature_values(&self) -> [f64; FEATURE_COUNT] {
        let f = &self.features;
        [
            f.seed,
            f.opponent_rank,
            f.relative_rank_diff,
            f64::from(f.games_won),
            f64::from(f.games_lost),
            f.games_diff as f64,
            f.aces,
            f.double_faults,
            f.first_serve_pct,
            f.first_serve_win_pct,
            f.second_serve_win_pct,
            f.bp_saved_rate,
            f.df_rate,
            f.ace_rate,
            f.pressure_score,
            f.domination_score,
            self.serve_dominance,
            self.mental_toughness,
        ]
    }

    /// Target label for the outcome model.
    pub fn games_won(&self) -> u32 {
        self.features.games_won
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerTable {
    rows: Vec<PlayerRow>,
    extracted: usize,
}

impl PlayerTable {
    /// Keep the complete vectors and derive their composite fields.
    pub fn from_features(features: Vec<FeatureVector>) -> Self {
        let extracted = features.len();
        let rows: Vec<PlayerRow> = features
            .into_iter()
            .filter(|fv| {
                let complete = fv.is_complete();
                if !complete {
                    debug!(
                        "dropping incomplete {:?} row for {:?}",
                        fv.role, fv.player_name
                    );
                }
                complete
            })
            .filter_map(PlayerRow::from_complete)
            .collect();
        Self { rows, extracted }
    }

    pub fn rows(&self) -> &[PlayerRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<PlayerRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows produced by extraction, before incomplete ones were dropped.
    pub fn extracted(&self) -> usize {
        self.extracted
    }

    pub fn dropped(&self) -> usize {
        self.extracted - self.rows.len()
    }

    pub fn feature_matrix(&self) -> Vec<Vec<f64>> {
        self.rows.iter().map(|r| r.feature_values().to_vec()).collect()
    }

    pub fn labels(&self) -> Vec<u32> {
        self.rows.iter().map(PlayerRow::games_won).collect()
    }
}

/// Winner row then loser row for every record, in input order.
pub fn extract_rows(records: &[MatchRecord], extractor: &FeatureExtractor) -> Vec<FeatureVector> {
    records
        .iter()
        .flat_map(|record| {
            [
                extractor.extract(record, Role::Winner),
                extractor.extract(record, Role::Loser),
            ]
        })
        .collect()
}

/// Build the player table for the matches selected by `filter`.
pub fn build_player_table(
    table: &MatchTable,
    filter: &MatchFilter,
    defaults: &FieldDefaults,
) -> Result<PlayerTable, DatasetError> {
    let matches = filter.apply(table)?;
    let extractor = FeatureExtractor::new(&matches, defaults);
    let players = PlayerTable::from_features(extract_rows(matches.records(), &extractor));
    info!(
        "{} {}: {} matches -> {} player rows ({} dropped as incomplete)",
        filter.tourney_name,
        filter.round,
        matches.len(),
        players.len(),
        players.dropped()
    );
    Ok(players)
}
