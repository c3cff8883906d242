// Ordinal reseeding by descending reseed score.

use crate::model::ScoredPlayer;
use crate::player_table::PlayerRow;

#[derive(Debug, Clone, PartialEq)]
pub struct RankedPlayer {
    pub player: PlayerRow,
    pub reseed_score: f64,
    /// 1-based position after sorting by descending score.
    pub new_seed: u32,
}

impl RankedPlayer {
    pub fn name(&self) -> &str {
        &self.player.player_name
    }
}

/// Sort by descending `reseed_score` and number the result from 1. The sort
/// is stable, so equal scores keep their incoming order.
pub fn reseed(mut scored: Vec<ScoredPlayer>) -> Vec<RankedPlayer> {
    scored.sort_by(|a, b| b.reseed_score.total_cmp(&a.reseed_score));
    scored
        .into_iter()
        .zip(1u32..)
        .map(|(s, new_seed)| RankedPlayer {
            player: s.player,
            reseed_score: s.reseed_score,
            new_seed,
        })
        .collect()
}
