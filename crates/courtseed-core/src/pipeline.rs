// End-to-end reseeding run over one match table snapshot.

use courtseed_forest::{ForestParams, RandomForest};
use tracing::info;

use crate::dataset::{DatasetError, MatchTable};
use crate::features::FieldDefaults;
use crate::model::{ModelError, OutcomeModel};
use crate::player_table::{build_player_table, MatchFilter};
use crate::reseed::{reseed, RankedPlayer};
use crate::update::{update_match_table, UpdateError};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(
        "no complete player rows for {tourney_name} {round}: {matches} matches, \
         {dropped} rows dropped as incomplete"
    )]
    EmptyTrainingSet {
        tourney_name: String,
        round: String,
        matches: usize,
        dropped: usize,
    },

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Update(#[from] UpdateError),
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Players of the filtered round, best first.
    pub ranked: Vec<RankedPlayer>,
    /// The whole tournament (all rounds) with seeds replaced.
    pub updated: MatchTable,
    /// Distinct games-won classes the model was trained on.
    pub classes: Vec<u32>,
    pub matches: usize,
    pub rows_extracted: usize,
    pub rows_dropped: usize,
}

/// Reseed the round selected by `filter` and write the new seeds onto every
/// match of that tournament.
pub fn run(
    table: &MatchTable,
    filter: &MatchFilter,
    params: &ForestParams,
    defaults: &FieldDefaults,
) -> Result<PipelineOutput, PipelineError> {
    let tournament = table.tournament(&filter.tourney_name)?;
    let players = build_player_table(&tournament, filter, defaults)?;
    let matches = players.extracted() / 2;
    let rows_extracted = players.extracted();
    let rows_dropped = players.dropped();

    if players.is_empty() {
        return Err(PipelineError::EmptyTrainingSet {
            tourney_name: filter.tourney_name.clone(),
            round: filter.round.clone(),
            matches,
            dropped: rows_dropped,
        });
    }

    let model = OutcomeModel::fit(&players, RandomForest::new(params.clone()))?;
    let classes = model.classes().to_vec();
    let ranked = reseed(model.score(players)?);
    let updated = update_match_table(&tournament, &ranked)?;

    if let Some(top) = ranked.first() {
        info!(
            "reseeded {} players; top seed {} ({:.3})",
            ranked.len(),
            top.name(),
            top.reseed_score
        );
    }

    Ok(PipelineOutput {
        ranked,
        updated,
        classes,
        matches,
        rows_extracted,
        rows_dropped,
    })
}
