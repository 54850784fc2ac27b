//! CLI subcommand handlers.

use crate::Overrides;
use gridsweep_core::config::WORKSPACE_CONFIG_FILE;
use gridsweep_core::{Dataset, FastTextCli, SweepConfig, SweepController};
use std::path::Path;
use tracing::info;

/// Apply command-line overrides on top of the loaded configuration.
pub(crate) fn apply_overrides(config: &mut SweepConfig, overrides: &Overrides, workspace: &Path) {
    if let Some(path) = &overrides.dataset {
        config.dataset.path = workspace.join(path);
    }
    if let Some(path) = &overrides.report {
        config.output.report_path = workspace.join(path);
    }
    if let Some(path) = &overrides.artifact_dir {
        config.output.artifact_dir = workspace.join(path);
    }
    if let Some(ngrams) = &overrides.ngrams {
        config.grid.ngrams = ngrams.clone();
    }
    if let Some(dims) = &overrides.dims {
        config.grid.dims = dims.clone();
    }
    if let Some(rates) = &overrides.learning_rates {
        config.grid.learning_rates = rates.clone();
    }
    if let Some(epochs) = overrides.epochs {
        config.grid.epochs = epochs;
    }
}

/// Load the dataset, run every grid point and write the report.
pub(crate) async fn run_sweep(config: &SweepConfig) -> anyhow::Result<()> {
    let backend = FastTextCli::from_config(&config.backend);
    let mut controller = SweepController::from_config(config, backend)?;
    info!(dataset = %config.dataset.path.display(), "Loading dataset");
    let dataset = Dataset::load(&config.dataset)?;

    let report = controller.run(&dataset).await?;

    println!("Report: {}", config.output.report_path.display());
    match report.best_by_f1() {
        Some(best) => println!(
            "Best: {} (precision {:.4}, recall {:.4}, F1 {:.4})",
            best.run_id, best.precision, best.recall, best.f1
        ),
        None => println!("No runs: at least one grid axis is empty."),
    }
    Ok(())
}

/// Print the run identifiers in execution order.
pub(crate) fn print_plan(config: &SweepConfig) -> anyhow::Result<()> {
    let backend = FastTextCli::from_config(&config.backend);
    let controller = SweepController::from_config(config, backend)?;
    let plan = controller.plan()?;
    let total = plan.len();
    for (i, (run_id, _)) in plan.iter().enumerate() {
        println!("{:>4}/{total}  {run_id}", i + 1);
    }
    if total == 0 {
        println!("No runs: at least one grid axis is empty.");
    }
    Ok(())
}

pub(crate) fn show_config(config: &SweepConfig) -> anyhow::Result<()> {
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Write a default `gridsweep.toml` unless one already exists.
pub(crate) fn init_config(workspace: &Path) -> anyhow::Result<()> {
    let config_path = workspace.join(WORKSPACE_CONFIG_FILE);
    if config_path.exists() {
        println!(
            "Configuration file already exists at: {}",
            config_path.display()
        );
        return Ok(());
    }

    let toml_str = toml::to_string_pretty(&SweepConfig::default())?;
    std::fs::write(&config_path, &toml_str)?;
    println!(
        "Created default configuration at: {}",
        config_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_apply_overrides() {
        let mut config = SweepConfig::default();
        let overrides = Overrides {
            dataset: Some(PathBuf::from("corpus.csv")),
            report: Some(PathBuf::from("/abs/report.csv")),
            ngrams: Some(vec![1, 2]),
            dims: Some(vec![20]),
            learning_rates: Some(vec![0.1]),
            epochs: Some(5),
            ..Default::default()
        };

        apply_overrides(&mut config, &overrides, Path::new("/work"));

        assert_eq!(config.dataset.path, PathBuf::from("/work/corpus.csv"));
        assert_eq!(config.output.report_path, PathBuf::from("/abs/report.csv"));
        assert_eq!(config.grid.ngrams, vec![1, 2]);
        assert_eq!(config.grid.dims, vec![20]);
        assert_eq!(config.grid.learning_rates, vec![0.1]);
        assert_eq!(config.grid.epochs, 5);
        assert_eq!(config.output.run_prefix, "fasttext");
    }

    #[test]
    fn test_init_config_writes_loadable_defaults() {
        let dir = TempDir::new().unwrap();
        init_config(dir.path()).unwrap();

        let written = std::fs::read_to_string(dir.path().join(WORKSPACE_CONFIG_FILE)).unwrap();
        let parsed: SweepConfig = toml::from_str(&written).unwrap();
        assert_eq!(parsed.grid.ngrams, vec![1, 2, 3]);
        assert_eq!(parsed.backend.fixed.label_prefix, "__label__");

        // Second call leaves the file alone.
        std::fs::write(dir.path().join(WORKSPACE_CONFIG_FILE), "# custom\n").unwrap();
        init_config(dir.path()).unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join(WORKSPACE_CONFIG_FILE)).unwrap(),
            "# custom\n"
        );
    }

    #[test]
    fn test_print_plan_rejects_bad_grid() {
        let mut config = SweepConfig::default();
        config.grid.ngrams = vec![1, 1];
        assert!(print_plan(&config).is_err());
    }
}
