//! One train/evaluate cycle for a single configuration.

use crate::backend::{FixedHyperparams, ModelBackend, TrainedModel, TrainingParams};
use crate::dataset::LabeledRow;
use crate::error::SweepError;
use crate::grid::TrainingConfig;
use crate::manifest::RunManifest;
use crate::metrics::{f1_score, is_degenerate};
use crate::naming::{RunArtifacts, RunId};
use crate::results::RunResult;
use crate::split::Split;
use chrono::Utc;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{info, warn};

pub const TRAIN_FILE: &str = "train.txt";
pub const TEST_FILE: &str = "test.txt";

/// Materializes a split, trains, saves, tests and scores one run.
pub struct TrainEvalStep<B> {
    backend: B,
    fixed: FixedHyperparams,
    scratch_root: Option<PathBuf>,
}

impl<B: ModelBackend> TrainEvalStep<B> {
    pub fn new(backend: B, fixed: FixedHyperparams) -> Self {
        Self {
            backend,
            fixed,
            scratch_root: None,
        }
    }

    /// Place per-run scratch directories under `root` instead of the system temp dir.
    pub fn with_scratch_root(mut self, root: Option<PathBuf>) -> Self {
        self.scratch_root = root;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn execute(
        &self,
        run_id: &RunId,
        config: &TrainingConfig,
        split: &Split<'_>,
        artifacts: &RunArtifacts,
    ) -> Result<RunResult, SweepError> {
        let started_at = Utc::now();

        // Scratch files live only as long as this run.
        let scratch = self.scratch_dir(run_id)?;
        let train_path = scratch.path().join(TRAIN_FILE);
        let test_path = scratch.path().join(TEST_FILE);
        write_rows(&train_path, &split.train, &self.fixed.label_prefix)?;
        write_rows(&test_path, &split.test, &self.fixed.label_prefix)?;

        info!(run_id = %run_id, train = split.train.len(), test = split.test.len(), "Training");
        let params = TrainingParams::new(*config, &self.fixed);
        let model = self.backend.train(&train_path, &params).await?;
        model.save(&artifacts.model_path).await?;

        info!(run_id = %run_id, "Testing");
        let report = model.test(&test_path).await?;

        if is_degenerate(report.precision, report.recall) {
            warn!(run_id = %run_id, "Precision and recall are both zero, recording F1 as 0");
        }
        let result = RunResult {
            precision: report.precision,
            recall: report.recall,
            f1: f1_score(report.precision, report.recall),
            samples: report.samples,
            config: *config,
        };

        RunManifest {
            run_id: run_id.clone(),
            config: *config,
            model_file: PathBuf::from(
                artifacts
                    .model_path
                    .file_name()
                    .unwrap_or(artifacts.model_path.as_os_str()),
            ),
            train_rows: split.train.len(),
            test_rows: split.test.len(),
            test_samples: report.samples,
            precision: result.precision,
            recall: result.recall,
            f1: result.f1,
            started_at,
            finished_at: Utc::now(),
        }
        .save(&artifacts.manifest_path)?;

        info!(
            run_id = %run_id,
            precision = result.precision,
            recall = result.recall,
            f1 = result.f1,
            "Run complete"
        );
        Ok(result)
    }

    fn scratch_dir(&self, run_id: &RunId) -> Result<TempDir, SweepError> {
        let mut builder = tempfile::Builder::new();
        let prefix = format!("{run_id}-");
        builder.prefix(&prefix);
        let dir = match &self.scratch_root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        Ok(dir)
    }
}

/// One backend input line: `<prefix><label> <text>`.
pub fn format_row(row: &LabeledRow, label_prefix: &str) -> String {
    let label = row.label.split_whitespace().collect::<Vec<_>>().join("_");
    let text = row.text.split_whitespace().collect::<Vec<_>>().join(" ");
    if label.starts_with(label_prefix) {
        format!("{label} {text}")
    } else {
        format!("{label_prefix}{label} {text}")
    }
}

fn write_rows(path: &Path, rows: &[&LabeledRow], label_prefix: &str) -> Result<(), SweepError> {
    let mut writer = BufWriter::new(std::fs::File::create(path)?);
    for row in rows {
        writeln!(writer, "{}", format_row(row, label_prefix))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::TestReport;
    use crate::dataset::Dataset;
    use crate::naming::RunNamer;
    use crate::split::SplitProvider;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records what it was given and reports fixed metrics.
    struct RecordingBackend {
        report: TestReport,
        seen_train: Mutex<Vec<String>>,
    }

    struct RecordingModel {
        report: TestReport,
    }

    #[async_trait]
    impl ModelBackend for RecordingBackend {
        type Model = RecordingModel;

        async fn train(
            &self,
            train_file: &Path,
            _params: &TrainingParams<'_>,
        ) -> Result<RecordingModel, SweepError> {
            let content = std::fs::read_to_string(train_file)?;
            self.seen_train
                .lock()
                .unwrap()
                .extend(content.lines().map(str::to_string));
            Ok(RecordingModel {
                report: self.report,
            })
        }
    }

    #[async_trait]
    impl TrainedModel for RecordingModel {
        async fn save(&self, path: &Path) -> Result<(), SweepError> {
            std::fs::write(path, b"model")?;
            Ok(())
        }

        async fn test(&self, _test_file: &Path) -> Result<TestReport, SweepError> {
            Ok(self.report)
        }
    }

    fn config() -> TrainingConfig {
        TrainingConfig {
            dim: 20,
            epochs: 5,
            ngrams: 1,
            lr: 0.1,
        }
    }

    #[test]
    fn test_format_row() {
        let row = LabeledRow::new("hello\n  world", "positive");
        assert_eq!(format_row(&row, "__label__"), "__label__positive hello world");

        let prefixed = LabeledRow::new("x", "__label__neg");
        assert_eq!(format_row(&prefixed, "__label__"), "__label__neg x");

        let spaced = LabeledRow::new("x", "very good");
        assert_eq!(format_row(&spaced, "__label__"), "__label__very_good x");
    }

    #[tokio::test]
    async fn test_execute_writes_model_and_manifest() {
        let root = TempDir::new().unwrap();
        let dataset = Dataset::from_rows(
            (0..10)
                .map(|i| LabeledRow::new(format!("doc {i}"), "a"))
                .collect(),
        );
        let split = SplitProvider::new(0.2).unwrap().split(&dataset);
        let namer = RunNamer::new("fasttext", root.path()).unwrap();
        let (run_id, artifacts) = namer.ensure_dir(&config()).unwrap();

        let backend = RecordingBackend {
            report: TestReport {
                samples: 2,
                precision: 0.5,
                recall: 1.0,
            },
            seen_train: Mutex::new(Vec::new()),
        };
        let step = TrainEvalStep::new(backend, FixedHyperparams::default())
            .with_scratch_root(Some(root.path().join("scratch")));

        let result = step
            .execute(&run_id, &config(), &split, &artifacts)
            .await
            .unwrap();

        assert!((result.f1 - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(result.samples, 2);
        assert!(artifacts.model_path.exists());
        let manifest = RunManifest::load(&artifacts.manifest_path).unwrap();
        assert_eq!(manifest.train_rows, 8);
        assert_eq!(manifest.test_rows, 2);

        let seen = step.backend().seen_train.lock().unwrap();
        assert_eq!(seen.len(), 8);
        assert!(seen.iter().all(|l| l.starts_with("__label__a doc ")));

        // Scratch directory is removed once the run finishes.
        let leftovers = std::fs::read_dir(root.path().join("scratch")).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_degenerate_metrics_record_zero_f1() {
        let root = TempDir::new().unwrap();
        let dataset = Dataset::from_rows(vec![
            LabeledRow::new("one", "a"),
            LabeledRow::new("two", "b"),
        ]);
        let split = SplitProvider::new(0.5).unwrap().split(&dataset);
        let namer = RunNamer::new("fasttext", root.path()).unwrap();
        let (run_id, artifacts) = namer.ensure_dir(&config()).unwrap();

        let step = TrainEvalStep::new(
            RecordingBackend {
                report: TestReport {
                    samples: 1,
                    precision: 0.0,
                    recall: 0.0,
                },
                seen_train: Mutex::new(Vec::new()),
            },
            FixedHyperparams::default(),
        );
        let result = step
            .execute(&run_id, &config(), &split, &artifacts)
            .await
            .unwrap();
        assert_eq!(result.f1, 0.0);
    }
}
