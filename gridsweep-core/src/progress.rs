//! Sweep progress callbacks.

use crate::error::SweepError;
use crate::naming::RunId;
use crate::results::{RunResult, SweepReport};
use tracing::{error, info};

/// Observer notified by the controller as the sweep advances.
///
/// `index` is zero-based; `total` is the grid size.
pub trait SweepObserver: Send {
    fn on_sweep_start(&mut self, _total: usize) {}

    fn on_run_start(&mut self, _index: usize, _total: usize, _run_id: &RunId) {}

    fn on_run_complete(&mut self, _index: usize, _total: usize, _run_id: &RunId, _result: &RunResult) {
    }

    fn on_abort(&mut self, _index: usize, _run_id: &RunId, _error: &SweepError) {}

    fn on_sweep_end(&mut self, _report: &SweepReport) {}
}

/// Reports progress through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl SweepObserver for LogProgress {
    fn on_sweep_start(&mut self, total: usize) {
        info!(total, "Starting sweep");
    }

    fn on_run_start(&mut self, index: usize, total: usize, run_id: &RunId) {
        info!(index, total, run_id = %run_id, "Running {} out of {} parameter sets", index + 1, total);
    }

    fn on_run_complete(&mut self, _index: usize, _total: usize, run_id: &RunId, result: &RunResult) {
        info!(
            run_id = %run_id,
            "Precision: {:.4}, Recall: {:.4}, F1: {:.4}",
            result.precision,
            result.recall,
            result.f1
        );
    }

    fn on_abort(&mut self, index: usize, run_id: &RunId, err: &SweepError) {
        error!(index, run_id = %run_id, error = %err, "Run failed, aborting sweep");
    }

    fn on_sweep_end(&mut self, report: &SweepReport) {
        match report.best_by_f1() {
            Some(best) => info!(
                runs = report.len(),
                best = %best.run_id,
                f1 = best.f1,
                "Sweep finished"
            ),
            None => info!("Sweep finished with no runs"),
        }
    }
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl SweepObserver for NoProgress {}
