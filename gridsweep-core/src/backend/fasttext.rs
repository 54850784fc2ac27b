//! `fasttext` executable backend.
//!
//! Drives `fasttext supervised` and `fasttext test` as managed subprocesses,
//! each bounded by a timeout and killed if the future is dropped.

use super::{ModelBackend, TestReport, TrainedModel, TrainingParams};
use crate::config::BackendConfig;
use crate::error::SweepError;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Backend that shells out to the `fasttext` command-line tool.
#[derive(Debug, Clone)]
pub struct FastTextCli {
    binary: PathBuf,
    timeout: Duration,
}

impl FastTextCli {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            timeout: Duration::from_secs(6 * 3600),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(&config.fasttext_bin).with_timeout(Duration::from_secs(config.timeout_secs))
    }

    /// Arguments for `fasttext supervised`.
    pub fn supervised_args(
        train_file: &Path,
        output_prefix: &Path,
        params: &TrainingParams<'_>,
    ) -> Vec<OsString> {
        let c = &params.config;
        let f = params.fixed;
        let mut args: Vec<OsString> = vec![
            "supervised".into(),
            "-input".into(),
            train_file.into(),
            "-output".into(),
            output_prefix.into(),
        ];
        let options: [(&str, String); 17] = [
            ("-lr", c.lr.to_string()),
            ("-dim", c.dim.to_string()),
            ("-ws", f.window_size.to_string()),
            ("-epoch", c.epochs.to_string()),
            ("-minCount", f.min_count.to_string()),
            ("-minCountLabel", f.min_count_label.to_string()),
            ("-minn", f.minn.to_string()),
            ("-maxn", f.maxn.to_string()),
            ("-neg", f.neg.to_string()),
            ("-wordNgrams", c.ngrams.to_string()),
            ("-loss", f.loss.as_str().to_string()),
            ("-bucket", f.bucket.to_string()),
            ("-thread", f.threads.to_string()),
            ("-lrUpdateRate", f.lr_update_rate.to_string()),
            ("-t", f.sampling_threshold.to_string()),
            ("-label", f.label_prefix.clone()),
            ("-verbose", f.verbose.to_string()),
        ];
        for (flag, value) in options {
            args.push(flag.into());
            args.push(value.into());
        }
        args
    }
}

#[async_trait]
impl ModelBackend for FastTextCli {
    type Model = FastTextModel;

    async fn train(
        &self,
        train_file: &Path,
        params: &TrainingParams<'_>,
    ) -> Result<FastTextModel, SweepError> {
        // The model lands next to the training file, inside the run's scratch dir.
        let output_prefix = train_file.with_file_name("model");
        let args = Self::supervised_args(train_file, &output_prefix, params);
        run_fasttext(&self.binary, &args, self.timeout).await?;

        let bin_path = output_prefix.with_extension("bin");
        if !bin_path.exists() {
            return Err(SweepError::backend(format!(
                "fasttext finished but {} was not written",
                bin_path.display()
            )));
        }

        Ok(FastTextModel {
            binary: self.binary.clone(),
            timeout: self.timeout,
            bin_path,
        })
    }
}

/// A trained `.bin` model on disk.
#[derive(Debug, Clone)]
pub struct FastTextModel {
    binary: PathBuf,
    timeout: Duration,
    bin_path: PathBuf,
}

impl FastTextModel {
    pub fn bin_path(&self) -> &Path {
        &self.bin_path
    }
}

#[async_trait]
impl TrainedModel for FastTextModel {
    async fn save(&self, path: &Path) -> Result<(), SweepError> {
        tokio::fs::copy(&self.bin_path, path).await?;
        Ok(())
    }

    async fn test(&self, test_file: &Path) -> Result<TestReport, SweepError> {
        let args: [OsString; 3] = ["test".into(), self.bin_path.clone().into(), test_file.into()];
        let stdout = run_fasttext(&self.binary, &args, self.timeout).await?;
        parse_test_output(&stdout)
    }
}

/// Parse the `N`, `P@1` and `R@1` lines printed by `fasttext test`.
pub fn parse_test_output(stdout: &str) -> Result<TestReport, SweepError> {
    let mut samples = None;
    let mut precision = None;
    let mut recall = None;

    for line in stdout.lines() {
        let mut parts = line.split_whitespace();
        let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        match key {
            "N" => samples = value.parse::<u64>().ok(),
            "P@1" => precision = Some(parse_metric("P@1", value)?),
            "R@1" => recall = Some(parse_metric("R@1", value)?),
            _ => {}
        }
    }

    match (samples, precision, recall) {
        (Some(samples), Some(precision), Some(recall)) => Ok(TestReport {
            samples,
            precision,
            recall,
        }),
        _ => Err(SweepError::backend(format!(
            "unrecognised fasttext test output: {}",
            stdout.trim()
        ))),
    }
}

fn parse_metric(name: &str, value: &str) -> Result<f64, SweepError> {
    let parsed: f64 = value
        .parse()
        .map_err(|_| SweepError::backend(format!("{name} is not a number: {value}")))?;
    if !parsed.is_finite() || !(0.0..=1.0).contains(&parsed) {
        return Err(SweepError::backend(format!("{name} out of range: {value}")));
    }
    Ok(parsed)
}

async fn run_fasttext(
    binary: &Path,
    args: &[OsString],
    timeout: Duration,
) -> Result<String, SweepError> {
    debug!(binary = %binary.display(), args = ?args, "Running fasttext");

    let result = tokio::time::timeout(timeout, async {
        let output = Command::new(binary)
            .args(args)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                SweepError::backend(format!("failed to spawn {}: {e}", binary.display()))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SweepError::backend(format!(
                "fasttext failed (exit {}): {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    })
    .await;

    match result {
        Ok(inner) => inner,
        Err(_) => Err(SweepError::Timeout(format!(
            "fasttext timed out after {}s",
            timeout.as_secs()
        ))),
    }
}
