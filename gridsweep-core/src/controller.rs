//! Sweep controller: the single-pass split/train/evaluate/record loop.

use crate::backend::ModelBackend;
use crate::config::{GridConfig, SweepConfig};
use crate::dataset::Dataset;
use crate::error::SweepError;
use crate::grid::{ConfigGrid, TrainingConfig};
use crate::naming::{RunId, RunNamer};
use crate::progress::{LogProgress, SweepObserver};
use crate::results::{ResultStore, SweepReport};
use crate::split::SplitProvider;
use crate::step::TrainEvalStep;
use std::path::PathBuf;
use tracing::{info, warn};

/// Controller lifecycle. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepState {
    Idle,
    Enumerating,
    Running { index: usize, total: usize },
    Finalizing,
    Done,
    Aborted,
}

/// Drives every configuration of the grid through one run, in order.
pub struct SweepController<B> {
    grid: GridConfig,
    splitter: SplitProvider,
    namer: RunNamer,
    step: TrainEvalStep<B>,
    store: ResultStore,
    report_path: Option<PathBuf>,
    flush_partial_on_abort: bool,
    observer: Box<dyn SweepObserver>,
    state: SweepState,
}

impl<B: ModelBackend> SweepController<B> {
    pub fn new(
        grid: GridConfig,
        splitter: SplitProvider,
        namer: RunNamer,
        step: TrainEvalStep<B>,
    ) -> Self {
        Self {
            grid,
            splitter,
            namer,
            step,
            store: ResultStore::new(),
            report_path: None,
            flush_partial_on_abort: false,
            observer: Box::new(LogProgress),
            state: SweepState::Idle,
        }
    }

    /// Wire every component from a loaded configuration.
    pub fn from_config(config: &SweepConfig, backend: B) -> Result<Self, SweepError> {
        let splitter = SplitProvider::new(config.split.test_fraction)?;
        let namer = RunNamer::new(&config.output.run_prefix, &config.output.artifact_dir)?;
        let step = TrainEvalStep::new(backend, config.backend.fixed.clone())
            .with_scratch_root(config.run.scratch_dir.clone());
        Ok(Self::new(config.grid.clone(), splitter, namer, step)
            .with_report_path(Some(config.output.report_path.clone()))
            .with_flush_partial_on_abort(config.run.flush_partial_on_abort))
    }

    pub fn with_report_path(mut self, path: Option<PathBuf>) -> Self {
        self.report_path = path;
        self
    }

    pub fn with_flush_partial_on_abort(mut self, flush: bool) -> Self {
        self.flush_partial_on_abort = flush;
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn SweepObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn state(&self) -> SweepState {
        self.state
    }

    pub fn results(&self) -> &ResultStore {
        &self.store
    }

    /// Identifiers and configurations the sweep would run, without running them.
    pub fn plan(&self) -> Result<Vec<(RunId, TrainingConfig)>, SweepError> {
        let grid = ConfigGrid::from_config(&self.grid)?;
        Ok(grid
            .iter()
            .map(|config| (self.namer.run_id(config), *config))
            .collect())
    }

    /// Run the whole grid once. The first failing run aborts the sweep.
    pub async fn run(&mut self, dataset: &Dataset) -> Result<SweepReport, SweepError> {
        if self.state != SweepState::Idle {
            return Err(SweepError::config("sweep controller has already run"));
        }

        self.state = SweepState::Enumerating;
        let grid = match self.prepare(dataset) {
            Ok(grid) => grid,
            Err(e) => {
                self.state = SweepState::Aborted;
                return Err(e);
            }
        };
        let total = grid.len();
        self.observer.on_sweep_start(total);

        for (index, config) in grid.iter().enumerate() {
            self.state = SweepState::Running { index, total };
            if let Err(e) = self.run_one(index, total, config, dataset).await {
                self.observer.on_abort(index, &self.namer.run_id(config), &e);
                self.state = SweepState::Aborted;
                self.flush_partial();
                return Err(e);
            }
        }

        self.state = SweepState::Finalizing;
        let report = self.store.finalize();
        if let Some(path) = &self.report_path {
            if let Err(e) = report.write_csv(path) {
                warn!(path = %path.display(), error = %e, "Failed to write sweep report");
                self.state = SweepState::Aborted;
                return Err(e);
            }
            info!(path = %path.display(), rows = report.len(), "Wrote sweep report");
        }
        self.observer.on_sweep_end(&report);
        self.state = SweepState::Done;
        Ok(report)
    }

    /// Validate the grid and the split sizes before any run starts.
    fn prepare(&self, dataset: &Dataset) -> Result<ConfigGrid, SweepError> {
        let grid = ConfigGrid::from_config(&self.grid)?;
        if !grid.is_empty() {
            self.splitter.check_sizes(dataset.len())?;
        }
        Ok(grid)
    }

    async fn run_one(
        &mut self,
        index: usize,
        total: usize,
        config: &TrainingConfig,
        dataset: &Dataset,
    ) -> Result<(), SweepError> {
        let split = self.splitter.split(dataset);
        let (run_id, artifacts) = self.namer.ensure_dir(config)?;
        self.observer.on_run_start(index, total, &run_id);

        let result = self
            .step
            .execute(&run_id, config, &split, &artifacts)
            .await?;
        self.store.record(run_id.clone(), result)?;
        self.observer.on_run_complete(index, total, &run_id, &result);
        Ok(())
    }

    fn flush_partial(&self) {
        if !self.flush_partial_on_abort {
            return;
        }
        let Some(path) = &self.report_path else {
            return;
        };
        match self.store.finalize().write_csv(path) {
            Ok(()) => info!(
                path = %path.display(),
                rows = self.store.len(),
                "Wrote partial sweep report"
            ),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to write partial report"),
        }
    }
}
