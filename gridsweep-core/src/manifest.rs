//! Per-run manifest written next to the trained model.

use crate::error::SweepError;
use crate::grid::TrainingConfig;
use crate::naming::RunId;
use crate::results::RunResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// JSON record describing how a model in an artifact directory was produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    pub config: TrainingConfig,
    pub model_file: PathBuf,
    pub train_rows: usize,
    pub test_rows: usize,
    pub test_samples: u64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunManifest {
    pub fn load(path: &Path) -> Result<Self, SweepError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write to a `.tmp` sibling, then rename over `path`.
    pub fn save(&self, path: &Path) -> Result<(), SweepError> {
        let content = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, &content)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn result(&self) -> RunResult {
        RunResult {
            precision: self.precision,
            recall: self.recall,
            f1: self.f1,
            samples: self.test_samples,
            config: self.config,
        }
    }
}
