//! Result aggregation and the final sweep report.

use crate::error::SweepError;
use crate::grid::TrainingConfig;
use crate::naming::RunId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Metrics of one completed run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of test samples the backend evaluated.
    pub samples: u64,
    pub config: TrainingConfig,
}

/// Insertion-ordered, append-only table of run results.
#[derive(Debug, Default)]
pub struct ResultStore {
    entries: Vec<(RunId, RunResult)>,
    seen: HashSet<RunId>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a result. Identifiers are never overwritten.
    pub fn record(&mut self, id: RunId, result: RunResult) -> Result<(), SweepError> {
        if !self.seen.insert(id.clone()) {
            return Err(SweepError::DuplicateRun(id.to_string()));
        }
        self.entries.push((id, result));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &RunId) -> Option<&RunResult> {
        self.entries.iter().find(|(k, _)| k == id).map(|(_, r)| r)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RunId, &RunResult)> {
        self.entries.iter().map(|(k, r)| (k, r))
    }

    /// Tabular view of everything recorded, in insertion order.
    pub fn finalize(&self) -> SweepReport {
        SweepReport {
            rows: self
                .entries
                .iter()
                .map(|(id, r)| ReportRow {
                    run_id: id.clone(),
                    precision: r.precision,
                    recall: r.recall,
                    f1: r.f1,
                    dim: r.config.dim,
                    epochs: r.config.epochs,
                    ngrams: r.config.ngrams,
                    lr: r.config.lr,
                })
                .collect(),
        }
    }
}

/// One report line, indexed by run identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub run_id: RunId,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub dim: u32,
    pub epochs: u32,
    pub ngrams: u32,
    pub lr: f64,
}

/// The serialized output of a sweep.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    pub rows: Vec<ReportRow>,
}

impl SweepReport {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row with the highest F1; ties keep the earlier run.
    pub fn best_by_f1(&self) -> Option<&ReportRow> {
        self.rows.iter().fold(None, |best: Option<&ReportRow>, row| match best {
            Some(b) if b.f1 >= row.f1 => Some(b),
            _ => Some(row),
        })
    }

    /// Write the report as CSV with a header line.
    pub fn write_csv(&self, path: &Path) -> Result<(), SweepError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = csv::Writer::from_path(path)?;
        if self.rows.is_empty() {
            writer.write_record([
                "run_id",
                "precision",
                "recall",
                "f1",
                "dim",
                "epochs",
                "ngrams",
                "lr",
            ])?;
        }
        for row in &self.rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::RunNamer;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn result(ngrams: u32, f1: f64) -> (RunId, RunResult) {
        let config = TrainingConfig {
            dim: 20,
            epochs: 5,
            ngrams,
            lr: 0.1,
        };
        let id = RunNamer::new("fasttext", "/data").unwrap().run_id(&config);
        (
            id,
            RunResult {
                precision: f1,
                recall: f1,
                f1,
                samples: 10,
                config,
            },
        )
    }

    #[test]
    fn test_record_preserves_order() {
        let mut store = ResultStore::new();
        for (ngrams, f1) in [(3, 0.3), (1, 0.9), (2, 0.5)] {
            let (id, r) = result(ngrams, f1);
            store.record(id, r).unwrap();
        }
        let report = store.finalize();
        let order: Vec<u32> = report.rows.iter().map(|r| r.ngrams).collect();
        assert_eq!(order, vec![3, 1, 2]);
        assert_eq!(report.best_by_f1().unwrap().ngrams, 1);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut store = ResultStore::new();
        let (id, r) = result(1, 0.5);
        store.record(id.clone(), r).unwrap();
        let err = store.record(id.clone(), r).unwrap_err();
        assert!(matches!(err, SweepError::DuplicateRun(_)));
        assert_eq!(store.len(), 1);
        assert!(store.get(&id).is_some());
    }

    #[test]
    fn test_write_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reports").join("results.csv");
        let mut store = ResultStore::new();
        let (id, r) = result(2, 0.5);
        store.record(id, r).unwrap();

        store.finalize().write_csv(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "run_id,precision,recall,f1,dim,epochs,ngrams,lr\n\
             fasttext_dim_20_epochs_5_ngrams_2_l_0.1,0.5,0.5,0.5,20,5,2,0.1\n"
        );
    }

    #[test]
    fn test_empty_report_has_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.csv");
        ResultStore::new().finalize().write_csv(&path).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "run_id,precision,recall,f1,dim,epochs,ngrams,lr\n"
        );
    }

    #[test]
    fn test_best_by_f1_empty() {
        assert!(SweepReport::default().best_by_f1().is_none());
    }
}
