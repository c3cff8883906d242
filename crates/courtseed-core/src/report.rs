// Ranking report (JSON) and seed-vs-score curve (CSV) sinks.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use courtseed_forest::ForestParams;
use serde::Serialize;

use crate::dataset::{create_output_file, DatasetError};
use crate::features::Role;
use crate::pipeline::PipelineOutput;
use crate::player_table::MatchFilter;
use crate::reseed::RankedPlayer;

#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
    pub classes: Vec<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedEntry {
    pub new_seed: u32,
    pub player_name: String,
    pub role: Role,
    pub original_seed: f64,
    pub games_won: u32,
    pub games_lost: u32,
    pub reseed_score: f64,
}

impl From<&RankedPlayer> for RankedEntry {
    fn from(ranked: &RankedPlayer) -> Self {
        let f = &ranked.player.features;
        Self {
            new_seed: ranked.new_seed,
            player_name: ranked.player.player_name.clone(),
            role: f.role,
            original_seed: f.seed,
            games_won: f.games_won,
            games_lost: f.games_lost,
            reseed_score: ranked.reseed_score,
        }
    }
}

/// Summary of one reseeding run.
#[derive(Debug, Clone, Serialize)]
pub struct RankingReport {
    pub tourney_name: String,
    pub round: String,
    pub generated_at: DateTime<Utc>,
    pub model: ModelSummary,
    pub matches: usize,
    pub rows_extracted: usize,
    pub rows_dropped: usize,
    pub players: Vec<RankedEntry>,
}

impl RankingReport {
    pub fn new(filter: &MatchFilter, params: &ForestParams, output: &PipelineOutput) -> Self {
        Self {
            tourney_name: filter.tourney_name.clone(),
            round: filter.round.clone(),
            generated_at: Utc::now(),
            model: ModelSummary {
                n_trees: params.n_trees,
                max_depth: params.max_depth,
                min_samples_leaf: params.min_samples_leaf,
                seed: params.seed,
                classes: output.classes.clone(),
            },
            matches: output.matches,
            rows_extracted: output.rows_extracted,
            rows_dropped: output.rows_dropped,
            players: output.ranked.iter().map(RankedEntry::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CurvePoint {
    new_seed: u32,
    reseed_score: f64,
}

// ---------------------------------------------------------------------------
// Writer-based sinks
// ---------------------------------------------------------------------------

pub fn write_report_to_writer<W: Write>(report: &RankingReport, wtr: W) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(wtr, report)
}

pub fn write_curve_to_writer<W: Write>(ranked: &[RankedPlayer], wtr: W) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(wtr);
    for player in ranked {
        writer.serialize(CurvePoint {
            new_seed: player.new_seed,
            reseed_score: player.reseed_score,
        })?;
    }
    writer.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Path-based sinks
// ---------------------------------------------------------------------------

pub fn write_report(report: &RankingReport, path: &Path) -> Result<(), DatasetError> {
    let file = create_output_file(path)?;
    write_report_to_writer(report, file).map_err(|e| DatasetError::Json {
        path: path.display().to_string(),
        source: e,
    })
}

pub fn write_curve(ranked: &[RankedPlayer], path: &Path) -> Result<(), DatasetError> {
    let file = create_output_file(path)?;
    write_curve_to_writer(ranked, file).map_err(|e| DatasetError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}
