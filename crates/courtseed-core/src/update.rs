// Write new seeds back onto the tournament's match table.

use std::collections::HashMap;

use tracing::info;

use crate::dataset::{DatasetError, MatchTable, LOSER_NAME, LOSER_SEED, WINNER_NAME, WINNER_SEED};
use crate::reseed::RankedPlayer;

#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("player `{0}` appears more than once in the ranking")]
    DuplicatePlayer(String),

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// Name -> new seed, rejecting duplicate names.
fn seed_index(ranked: &[RankedPlayer]) -> Result<HashMap<&str, u32>, UpdateError> {
    let mut index = HashMap::with_capacity(ranked.len());
    for player in ranked {
        if index.insert(player.name(), player.new_seed).is_some() {
            return Err(UpdateError::DuplicatePlayer(player.name().to_string()));
        }
    }
    Ok(index)
}

/// Copy `table`, replacing `winner_seed`/`loser_seed` with the ranked
/// player's `new_seed` wherever `winner_name`/`loser_name` matches exactly.
/// Sides with no ranked player keep their original seed.
pub fn update_match_table(
    table: &MatchTable,
    ranked: &[RankedPlayer],
) -> Result<MatchTable, UpdateError> {
    let index = seed_index(ranked)?;
    let sides = [
        (table.require_column(WINNER_NAME)?, table.require_column(WINNER_SEED)?),
        (table.require_column(LOSER_NAME)?, table.require_column(LOSER_SEED)?),
    ];

    let mut updated_cells = 0usize;
    let records = table
        .records()
        .iter()
        .map(|record| {
            let mut record = record.clone();
            for (name_col, seed_col) in sides {
                let new_seed = record.cell(name_col).and_then(|name| index.get(name)).copied();
                if let Some(seed) = new_seed {
                    record.set_cell(seed_col, seed.to_string());
                    updated_cells += 1;
                }
            }
            record
        })
        .collect();

    info!(
        "updated {} seed cells across {} matches",
        updated_cells,
        table.len()
    );
    Ok(MatchTable::new(table.headers().to_vec(), records))
}
