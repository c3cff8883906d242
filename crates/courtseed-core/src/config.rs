// Configuration loading and parsing (config/courtseed.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use courtseed_forest::ForestParams;

use crate::features::FieldDefaults;
use crate::player_table::MatchFilter;

/// File name of the run configuration inside `config/` and `defaults/`.
pub const CONFIG_FILE: &str = "courtseed.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// courtseed.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub filter: MatchFilter,
    pub model: ModelConfig,
    pub data_paths: DataPaths,
    /// Fallbacks for raw columns missing from the match table.
    #[serde(default)]
    pub defaults: FieldDefaults,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl From<&ModelConfig> for ForestParams {
    fn from(model: &ModelConfig) -> Self {
        ForestParams {
            n_trees: model.n_trees,
            max_depth: model.max_depth,
            min_samples_leaf: model.min_samples_leaf,
            seed: model.seed,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub matches: String,
    pub output: String,
    pub report: String,
    #[serde(default)]
    pub curve: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate a configuration file at an explicit path.
pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    let text = read_file(path)?;
    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    validate(&config)?;
    Ok(config)
}

/// Load and validate `config/courtseed.toml` relative to `base_dir`.
///
/// This does not auto-copy defaults; prefer `load_config()` for that.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    load_config_file(&base_dir.join("config").join(CONFIG_FILE))
}

/// Copy `defaults/courtseed.toml` to `config/courtseed.toml` unless the
/// config file already exists. Returns the path written, if any.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = base_dir.join("config").join(CONFIG_FILE);
    if target.exists() {
        return Ok(None);
    }

    let source = base_dir.join("defaults").join(CONFIG_FILE);
    if !source.is_file() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "neither {} nor {} exists; run from the project root or pass --config",
                target.display(),
                source.display()
            ),
        });
    }

    let copy_err = |e: std::io::Error| ConfigError::DefaultsCopyError {
        message: format!("failed to copy {} to {}: {e}", source.display(), target.display()),
    };
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(copy_err)?;
    }
    std::fs::copy(&source, &target).map_err(copy_err)?;
    info!("created {} from defaults", target.display());
    Ok(Some(target))
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Copies the default config file first if it is missing.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_file(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check a loaded (and possibly CLI-overridden) configuration.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let text_fields: &[(&str, &str)] = &[
        ("filter.tourney_name", config.filter.tourney_name.as_str()),
        ("filter.round", config.filter.round.as_str()),
        ("data_paths.matches", config.data_paths.matches.as_str()),
        ("data_paths.output", config.data_paths.output.as_str()),
        ("data_paths.report", config.data_paths.report.as_str()),
    ];
    for (name, val) in text_fields {
        if val.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must not be empty".into(),
            });
        }
    }

    let model = &config.model;
    let model_fields: &[(&str, usize)] = &[
        ("model.n_trees", model.n_trees),
        ("model.max_depth", model.max_depth),
        ("model.min_samples_leaf", model.min_samples_leaf),
    ];
    for (name, val) in model_fields {
        if *val == 0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must be > 0".into(),
            });
        }
    }

    let d = &config.defaults;
    let default_fields: &[(&str, f64)] = &[
        ("defaults.seed", d.seed),
        ("defaults.rank", d.rank),
        ("defaults.svpt", d.svpt),
        ("defaults.first_in", d.first_in),
        ("defaults.first_won", d.first_won),
        ("defaults.second_won", d.second_won),
        ("defaults.bp_faced", d.bp_faced),
        ("defaults.bp_saved", d.bp_saved),
        ("defaults.ace", d.ace),
        ("defaults.df", d.df),
    ];
    for (name, val) in default_fields {
        if !val.is_finite() {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: format!("must be finite, got {val}"),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SHIPPED_DEFAULTS: &str = include_str!("../../../defaults/courtseed.toml");

    /// Helper: write `content` as config/courtseed.toml under a fresh temp dir.
    fn temp_config(name: &str, content: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(tmp.join("config").join(CONFIG_FILE), content).unwrap();
        tmp
    }

    #[test]
    fn shipped_defaults_load() {
        let tmp = temp_config("courtseed_config_shipped", SHIPPED_DEFAULTS);
        let config = load_config_from(&tmp).expect("should load shipped defaults");

        assert_eq!(config.filter.tourney_name, "Us Open");
        assert_eq!(config.filter.round, "R128");
        assert_eq!(config.model.n_trees, 200);
        assert_eq!(config.model.max_depth, 6);
        assert_eq!(config.model.min_samples_leaf, 4);
        assert_eq!(config.model.seed, 42);
        assert_eq!(config.data_paths.matches, "data/atp_matches_2020.csv");
        assert_eq!(config.data_paths.curve.as_deref(), Some("output/reseed_curve.csv"));
        assert_eq!(config.defaults, FieldDefaults::default());

        let params = ForestParams::from(&config.model);
        assert_eq!(params, ForestParams::default());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn defaults_section_is_optional_and_partial() {
        let content = r#"
[filter]
tourney_name = "Wimbledon"
round = "R64"

[model]
n_trees = 10
max_depth = 3
min_samples_leaf = 2
seed = 7

[data_paths]
matches = "m.csv"
output = "o.csv"
report = "r.json"

[defaults]
seed = 128.0
"#;
        let tmp = temp_config("courtseed_config_partial_defaults", content);
        let config = load_config_from(&tmp).unwrap();
        assert!((config.defaults.seed - 128.0).abs() < f64::EPSILON);
        assert!((config.defaults.rank - 200.0).abs() < f64::EPSILON);
        assert!(config.data_paths.curve.is_none());
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_trees() {
        let content = SHIPPED_DEFAULTS.replace("n_trees = 200", "n_trees = 0");
        let tmp = temp_config("courtseed_config_zero_trees", &content);
        let err = load_config_from(&tmp).unwrap_err();
        match err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "model.n_trees"),
            other => panic!("expected ValidationError, got {:?}", other),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_empty_round() {
        let content = SHIPPED_DEFAULTS.replace("round = \"R128\"", "round = \"\"");
        let tmp = temp_config("courtseed_config_empty_round", &content);
        let err = load_config_from(&tmp).unwrap_err();
        match err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "filter.round"),
            other => panic!("expected ValidationError, got {:?}", other),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let tmp = temp_config("courtseed_config_malformed", "[filter\ntourney_name = ");
        assert!(matches!(
            load_config_from(&tmp),
            Err(ConfigError::ParseError { .. })
        ));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_file_is_reported() {
        let tmp = std::env::temp_dir().join("courtseed_config_missing");
        let _ = fs::remove_dir_all(&tmp);
        assert!(matches!(
            load_config_from(&tmp),
            Err(ConfigError::FileNotFound { .. })
        ));
    }

    #[test]
    fn ensure_config_file_copies_then_preserves() {
        let tmp = std::env::temp_dir().join("courtseed_config_ensure");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::write(tmp.join("defaults").join(CONFIG_FILE), SHIPPED_DEFAULTS).unwrap();

        let target = tmp.join("config").join(CONFIG_FILE);
        assert_eq!(ensure_config_file(&tmp).unwrap(), Some(target.clone()));
        assert_eq!(fs::read_to_string(&target).unwrap(), SHIPPED_DEFAULTS);

        fs::write(&target, "edited").unwrap();
        assert_eq!(ensure_config_file(&tmp).unwrap(), None);
        assert_eq!(fs::read_to_string(&target).unwrap(), "edited");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn existing_config_needs_no_defaults() {
        let tmp = temp_config("courtseed_config_no_defaults", SHIPPED_DEFAULTS);
        assert_eq!(ensure_config_file(&tmp).unwrap(), None);
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_file_without_any_source_fails() {
        let tmp = std::env::temp_dir().join("courtseed_config_no_dirs");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        assert!(matches!(
            ensure_config_file(&tmp),
            Err(ConfigError::DefaultsCopyError { .. })
        ));
        let _ = fs::remove_dir_all(&tmp);
    }
}
