// courtseed entry point.
//
// Run sequence:
// 1. Initialize tracing (stderr)
// 2. Load config (auto-copy defaults), apply CLI overrides, validate
// 3. Load the match table
// 4. Run the reseeding pipeline
// 5. Write the updated table, the ranking report and the optional curve

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing::info;

use courtseed_core::config::{self, Config};
use courtseed_core::dataset;
use courtseed_core::pipeline;
use courtseed_core::report::{self, RankingReport};
use courtseed_forest::ForestParams;

/// Reseed a tournament round from match statistics.
#[derive(Debug, Parser)]
#[command(name = "courtseed", version, about)]
struct Cli {
    /// Config file to use instead of config/courtseed.toml.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tournament name, exact match (e.g. "Us Open").
    #[arg(long)]
    tourney: Option<String>,

    /// Round label, exact match (e.g. "R128").
    #[arg(long)]
    round: Option<String>,

    /// Match table CSV.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Where to write the updated tournament CSV.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Random forest seed.
    #[arg(long)]
    seed: Option<u64>,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(tourney) = &self.tourney {
            config.filter.tourney_name = tourney.clone();
        }
        if let Some(round) = &self.round {
            config.filter.round = round.clone();
        }
        if let Some(input) = &self.input {
            config.data_paths.matches = input.display().to_string();
        }
        if let Some(output) = &self.output {
            config.data_paths.output = output.display().to_string();
        }
        if let Some(seed) = self.seed {
            config.model.seed = seed;
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing()?;

    let mut config = match &cli.config {
        Some(path) => config::load_config_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => config::load_config().context("failed to load configuration")?,
    };
    cli.apply(&mut config);
    config::validate(&config).context("invalid configuration after CLI overrides")?;
    info!(
        "Config loaded: {} {}, {} trees, seed {}",
        config.filter.tourney_name, config.filter.round, config.model.n_trees, config.model.seed
    );

    let table = dataset::load_match_table(Path::new(&config.data_paths.matches))
        .context("failed to load match table")?;
    info!(
        "Loaded {} matches from {}",
        table.len(),
        config.data_paths.matches
    );

    let params = ForestParams::from(&config.model);
    let output = pipeline::run(&table, &config.filter, &params, &config.defaults)
        .context("reseeding failed")?;

    let output_path = Path::new(&config.data_paths.output);
    dataset::write_match_table(&output.updated, output_path)
        .context("failed to write updated match table")?;
    info!("Wrote {} matches to {}", output.updated.len(), output_path.display());

    let report_path = Path::new(&config.data_paths.report);
    let ranking = RankingReport::new(&config.filter, &params, &output);
    report::write_report(&ranking, report_path).context("failed to write ranking report")?;
    info!("Wrote ranking report to {}", report_path.display());

    if let Some(curve) = &config.data_paths.curve {
        report::write_curve(&output.ranked, Path::new(curve))
            .context("failed to write reseed curve")?;
        info!("Wrote reseed curve to {}", curve);
    }

    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("courtseed=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
