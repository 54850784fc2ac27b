//! Configuration for gridsweep.
//!
//! Uses `figment` for layered configuration: defaults -> user config -> workspace
//! `gridsweep.toml` -> environment. CLI flags are applied on top by the binary.

use crate::backend::FixedHyperparams;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the workspace-level configuration file.
pub const WORKSPACE_CONFIG_FILE: &str = "gridsweep.toml";

/// Top-level sweep configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Source dataset location and column layout.
    #[serde(default)]
    pub dataset: DatasetConfig,
    /// Axis candidate values.
    #[serde(default)]
    pub grid: GridConfig,
    /// Train/test partitioning.
    #[serde(default)]
    pub split: SplitConfig,
    /// Artifact and report locations.
    #[serde(default)]
    pub output: OutputConfig,
    /// External training backend.
    #[serde(default)]
    pub backend: BackendConfig,
    /// Sweep-level behaviour.
    #[serde(default)]
    pub run: RunConfig,
}

impl SweepConfig {
    /// Resolve every relative path against `workspace`.
    pub fn resolve_paths(&mut self, workspace: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = workspace.join(&*p);
            }
        };
        resolve(&mut self.dataset.path);
        resolve(&mut self.output.artifact_dir);
        resolve(&mut self.output.report_path);
        if let Some(scratch) = self.run.scratch_dir.as_mut() {
            resolve(scratch);
        }
    }
}

/// Dataset file configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// CSV file holding the labeled rows (with a header line).
    #[serde(default = "default_dataset_path")]
    pub path: PathBuf,
    /// Column holding the document text.
    #[serde(default = "default_text_column")]
    pub text_column: String,
    /// Column holding the class label.
    #[serde(default = "default_label_column")]
    pub label_column: String,
    /// Field delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: default_dataset_path(),
            text_column: default_text_column(),
            label_column: default_label_column(),
            delimiter: default_delimiter(),
        }
    }
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("data").join("all_data.csv")
}

fn default_text_column() -> String {
    "text".to_string()
}

fn default_label_column() -> String {
    "label".to_string()
}

fn default_delimiter() -> char {
    ','
}

/// Candidate values for each swept axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// Word n-gram orders (outermost loop).
    #[serde(default = "default_ngrams")]
    pub ngrams: Vec<u32>,
    /// Embedding dimensions.
    #[serde(default = "default_dims")]
    pub dims: Vec<u32>,
    /// Learning rates (innermost loop).
    #[serde(default = "default_learning_rates")]
    pub learning_rates: Vec<f64>,
    /// Epoch count shared by every run.
    #[serde(default = "default_epochs")]
    pub epochs: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            ngrams: default_ngrams(),
            dims: default_dims(),
            learning_rates: default_learning_rates(),
            epochs: default_epochs(),
        }
    }
}

fn default_ngrams() -> Vec<u32> {
    vec![1, 2, 3]
}

fn default_dims() -> Vec<u32> {
    vec![20, 300, 700]
}

fn default_learning_rates() -> Vec<f64> {
    vec![0.01, 0.05, 0.1, 0.2]
}

fn default_epochs() -> u32 {
    100
}

/// Train/test split configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Fraction of rows held out for evaluation (0.0-1.0, exclusive of 1.0).
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: default_test_fraction(),
        }
    }
}

fn default_test_fraction() -> f64 {
    0.2
}

/// Output locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Parent directory of the per-run artifact directories.
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,
    /// Final CSV report.
    #[serde(default = "default_report_path")]
    pub report_path: PathBuf,
    /// Prefix of every run identifier.
    #[serde(default = "default_run_prefix")]
    pub run_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            artifact_dir: default_artifact_dir(),
            report_path: default_report_path(),
            run_prefix: default_run_prefix(),
        }
    }
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_report_path() -> PathBuf {
    PathBuf::from("data").join("fasttext_results.csv")
}

fn default_run_prefix() -> String {
    "fasttext".to_string()
}

/// External training backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Path to the `fasttext` executable.
    #[serde(default = "default_fasttext_bin")]
    pub fasttext_bin: PathBuf,
    /// Timeout for a single backend invocation (seconds).
    #[serde(default = "default_backend_timeout")]
    pub timeout_secs: u64,
    /// Hyperparameters held constant across the sweep.
    #[serde(default)]
    pub fixed: FixedHyperparams,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            fasttext_bin: default_fasttext_bin(),
            timeout_secs: default_backend_timeout(),
            fixed: FixedHyperparams::default(),
        }
    }
}

fn default_fasttext_bin() -> PathBuf {
    PathBuf::from("fasttext")
}

fn default_backend_timeout() -> u64 {
    6 * 3600
}

/// Sweep-level behaviour.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    /// Write the rows recorded so far to the report before aborting on error.
    #[serde(default)]
    pub flush_partial_on_abort: bool,
    /// Parent directory for per-run scratch files (system temp dir if unset).
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with `GRIDSWEEP_`, `__` separates tables)
/// 2. Explicit config file, when given
/// 3. Workspace-local config (`<workspace>/gridsweep.toml`)
/// 4. User config (`~/.config/gridsweep/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: &Path,
    config_file: Option<&Path>,
) -> Result<SweepConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(SweepConfig::default()));

    if let Some(dirs) = directories::ProjectDirs::from("dev", "gridsweep", "gridsweep") {
        let user_config = dirs.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    let ws_config = workspace.join(WORKSPACE_CONFIG_FILE);
    if ws_config.exists() {
        figment = figment.merge(Toml::file(&ws_config));
    }

    if let Some(file) = config_file {
        if !file.is_file() {
            return Err(Box::new(figment::Error::from(format!(
                "config file not found: {}",
                file.display()
            ))));
        }
        figment = figment.merge(Toml::file(file));
    }

    // GRIDSWEEP_GRID__EPOCHS, GRIDSWEEP_BACKEND__FASTTEXT_BIN, etc.
    figment = figment.merge(Env::prefixed("GRIDSWEEP_").split("__"));

    let mut config: SweepConfig = figment.extract().map_err(Box::new)?;
    config.resolve_paths(workspace);
    Ok(config)
}
