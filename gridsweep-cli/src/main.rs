//! gridsweep CLI: runs an exhaustive hyperparameter grid sweep.
//!
//! Configuration comes from `gridsweep.toml` in the workspace, `GRIDSWEEP_*`
//! environment variables, and the few path/axis overrides below.

mod commands;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// gridsweep: train and evaluate one fastText model per grid point
#[derive(Parser, Debug)]
#[command(name = "gridsweep", version, about, long_about = None)]
struct Cli {
    /// Workspace directory (relative config paths resolve against it)
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Additional configuration file, merged over the workspace config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(flatten)]
    overrides: Overrides,

    /// Subcommand (defaults to `run`)
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Startup overrides for paths and axis values.
#[derive(clap::Args, Debug, Default, Clone)]
pub(crate) struct Overrides {
    /// Dataset CSV path
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,

    /// Report CSV path
    #[arg(long, global = true)]
    report: Option<PathBuf>,

    /// Directory holding one artifact directory per run
    #[arg(long, global = true)]
    artifact_dir: Option<PathBuf>,

    /// Word n-gram orders, comma separated
    #[arg(long, global = true, value_delimiter = ',')]
    ngrams: Option<Vec<u32>>,

    /// Embedding dimensions, comma separated
    #[arg(long, global = true, value_delimiter = ',')]
    dims: Option<Vec<u32>>,

    /// Learning rates, comma separated
    #[arg(long = "lr", global = true, value_delimiter = ',')]
    learning_rates: Option<Vec<f64>>,

    /// Epochs for every run
    #[arg(long, global = true)]
    epochs: Option<u32>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the sweep and write the report
    Run,
    /// Print the run identifiers the sweep would train, without training
    Plan,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Write a default gridsweep.toml into the workspace
    Init,
    /// Print the fully resolved configuration
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Resolve workspace
    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let log_dir = workspace.join(".gridsweep").join("logs");
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "gridsweep.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let mut config = gridsweep_core::load_config(&workspace, cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
    commands::apply_overrides(&mut config, &cli.overrides, &workspace);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => commands::run_sweep(&config).await,
        Commands::Plan => commands::print_plan(&config),
        Commands::Config { action } => match action {
            ConfigAction::Init => commands::init_config(&workspace),
            ConfigAction::Show => commands::show_config(&config),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_axis_overrides() {
        let cli = Cli::try_parse_from([
            "gridsweep",
            "--ngrams",
            "1,2",
            "--dims",
            "20",
            "--lr",
            "0.1,0.2",
            "--epochs",
            "5",
            "plan",
        ])
        .unwrap();
        assert_eq!(cli.overrides.ngrams, Some(vec![1, 2]));
        assert_eq!(cli.overrides.dims, Some(vec![20]));
        assert_eq!(cli.overrides.learning_rates, Some(vec![0.1, 0.2]));
        assert_eq!(cli.overrides.epochs, Some(5));
        assert!(matches!(cli.command, Some(Commands::Plan)));
    }

    #[test]
    fn test_default_command_is_run() {
        let cli = Cli::try_parse_from(["gridsweep", "-vv"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_config_subcommands() {
        let cli = Cli::try_parse_from(["gridsweep", "config", "show"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigAction::Show
            })
        ));
    }
}
