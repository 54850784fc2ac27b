//! # gridsweep-core: exhaustive hyperparameter sweeps for text classifiers
//!
//! Enumerates a grid of training configurations, trains and evaluates one model
//! per configuration on a fresh random split, and aggregates precision, recall
//! and F1 into a single report.
//!
//! ## Pipeline
//!
//! 1. [`grid::ConfigGrid`]: flat, ordered Cartesian product of the axes
//! 2. [`split::SplitProvider`]: new train/test partition per run
//! 3. [`naming::RunNamer`]: deterministic run id and artifact directory
//! 4. [`step::TrainEvalStep`]: materialize, train, save, test, score
//! 5. [`results::ResultStore`]: ordered result table and CSV report
//!
//! [`controller::SweepController`] composes the pipeline and runs it once.

pub mod backend;
pub mod config;
pub mod controller;
pub mod dataset;
pub mod error;
pub mod grid;
pub mod manifest;
pub mod metrics;
pub mod naming;
pub mod progress;
pub mod results;
pub mod split;
pub mod step;

// Re-exports
pub use backend::{FastTextCli, ModelBackend, TestReport, TrainedModel, TrainingParams};
pub use config::{SweepConfig, load_config};
pub use controller::{SweepController, SweepState};
pub use dataset::{Dataset, LabeledRow};
pub use error::SweepError;
pub use grid::{ConfigGrid, TrainingConfig};
pub use naming::{RunId, RunNamer};
pub use results::{ResultStore, RunResult, SweepReport};
pub use split::{Split, SplitProvider};
