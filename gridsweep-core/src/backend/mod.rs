//! External model backend: the opaque train/test/save capability.

pub mod fasttext;

pub use fasttext::{FastTextCli, FastTextModel};

use crate::error::SweepError;
use crate::grid::TrainingConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Loss function passed through to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Loss {
    Softmax,
    Ns,
    Hs,
    Ova,
}

impl Loss {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Softmax => "softmax",
            Self::Ns => "ns",
            Self::Hs => "hs",
            Self::Ova => "ova",
        }
    }
}

/// Hyperparameters held constant across every run of a sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedHyperparams {
    /// Negatives sampled per positive.
    #[serde(default = "default_neg")]
    pub neg: u32,
    #[serde(default = "default_loss")]
    pub loss: Loss,
    /// Number of hash buckets for word and char n-grams.
    #[serde(default = "default_bucket")]
    pub bucket: u64,
    #[serde(default = "default_label_prefix")]
    pub label_prefix: String,
    /// Parallelism hint forwarded to the backend.
    #[serde(default = "default_threads")]
    pub threads: u32,
    /// Tokens processed between learning-rate updates.
    #[serde(default = "default_lr_update_rate")]
    pub lr_update_rate: u32,
    #[serde(default = "default_sampling_threshold")]
    pub sampling_threshold: f64,
    #[serde(default = "default_min_count")]
    pub min_count: u32,
    #[serde(default)]
    pub min_count_label: u32,
    /// Minimum char n-gram length (0 disables subwords).
    #[serde(default)]
    pub minn: u32,
    /// Maximum char n-gram length.
    #[serde(default)]
    pub maxn: u32,
    #[serde(default = "default_window_size")]
    pub window_size: u32,
    #[serde(default = "default_verbose")]
    pub verbose: u32,
}

impl Default for FixedHyperparams {
    fn default() -> Self {
        Self {
            neg: default_neg(),
            loss: default_loss(),
            bucket: default_bucket(),
            label_prefix: default_label_prefix(),
            threads: default_threads(),
            lr_update_rate: default_lr_update_rate(),
            sampling_threshold: default_sampling_threshold(),
            min_count: default_min_count(),
            min_count_label: 0,
            minn: 0,
            maxn: 0,
            window_size: default_window_size(),
            verbose: default_verbose(),
        }
    }
}

fn default_neg() -> u32 {
    5
}

fn default_loss() -> Loss {
    Loss::Softmax
}

fn default_bucket() -> u64 {
    2_000_000
}

fn default_label_prefix() -> String {
    "__label__".to_string()
}

fn default_threads() -> u32 {
    12
}

fn default_lr_update_rate() -> u32 {
    100
}

fn default_sampling_threshold() -> f64 {
    1e-4
}

fn default_min_count() -> u32 {
    1
}

fn default_window_size() -> u32 {
    5
}

fn default_verbose() -> u32 {
    2
}

/// Everything the backend needs to train one model.
#[derive(Debug, Clone, Copy)]
pub struct TrainingParams<'a> {
    pub config: TrainingConfig,
    pub fixed: &'a FixedHyperparams,
}

impl<'a> TrainingParams<'a> {
    pub fn new(config: TrainingConfig, fixed: &'a FixedHyperparams) -> Self {
        Self { config, fixed }
    }
}

/// Evaluation output of a trained model on a test file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestReport {
    pub samples: u64,
    pub precision: f64,
    pub recall: f64,
}

/// Trains models from a materialized training file.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    type Model: TrainedModel;

    async fn train(
        &self,
        train_file: &Path,
        params: &TrainingParams<'_>,
    ) -> Result<Self::Model, SweepError>;
}

/// A model produced by [`ModelBackend::train`].
#[async_trait]
pub trait TrainedModel: Send + Sync {
    /// Persist the model to `path`.
    async fn save(&self, path: &Path) -> Result<(), SweepError>;

    /// Evaluate against a materialized test file.
    async fn test(&self, test_file: &Path) -> Result<TestReport, SweepError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_defaults() {
        let fixed = FixedHyperparams::default();
        assert_eq!(fixed.neg, 5);
        assert_eq!(fixed.loss, Loss::Softmax);
        assert_eq!(fixed.bucket, 2_000_000);
        assert_eq!(fixed.label_prefix, "__label__");
        assert_eq!(fixed.threads, 12);
        assert_eq!(fixed.window_size, 5);
    }

    #[test]
    fn test_loss_serde() {
        let loss: Loss = serde_json::from_str("\"ova\"").unwrap();
        assert_eq!(loss, Loss::Ova);
        assert_eq!(loss.as_str(), "ova");
    }
}
