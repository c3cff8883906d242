// Library root: the reseeding pipeline from raw match table to updated seeds.
// Re-exports modules so the CLI and integration tests can reach them.

pub mod config;
pub mod dataset;
pub mod features;
pub mod model;
pub mod pipeline;
pub mod player_table;
pub mod report;
pub mod reseed;
pub mod score;
pub mod update;
