//! Randomized train/test partitioning, drawn fresh for every run.

use crate::dataset::{Dataset, LabeledRow};
use crate::error::SweepError;
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

/// A train/test partition borrowing rows from the shared dataset.
#[derive(Debug, Clone)]
pub struct Split<'a> {
    pub train: Vec<&'a LabeledRow>,
    pub test: Vec<&'a LabeledRow>,
}

/// Produces independent random splits with a fixed test fraction.
#[derive(Debug, Clone, Copy)]
pub struct SplitProvider {
    test_fraction: f64,
}

impl SplitProvider {
    pub fn new(test_fraction: f64) -> Result<Self, SweepError> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(SweepError::config(format!(
                "test fraction {test_fraction} must be in (0, 1)"
            )));
        }
        Ok(Self { test_fraction })
    }

    pub fn test_fraction(&self) -> f64 {
        self.test_fraction
    }

    /// Number of held-out rows for a dataset of `total` rows.
    pub fn test_size(&self, total: usize) -> usize {
        ((total as f64 * self.test_fraction).ceil() as usize).min(total)
    }

    /// Fail unless a dataset of `total` rows leaves both partitions non-empty.
    pub fn check_sizes(&self, total: usize) -> Result<(), SweepError> {
        let n_test = self.test_size(total);
        if n_test == 0 || n_test == total {
            return Err(SweepError::dataset(format!(
                "{total} rows with test fraction {} leave {n_test} test and {} train rows; \
                 both partitions need at least one row",
                self.test_fraction,
                total - n_test
            )));
        }
        Ok(())
    }

    /// Split with the thread-local RNG. No seed, no caching.
    pub fn split<'a>(&self, dataset: &'a Dataset) -> Split<'a> {
        self.split_with(dataset, &mut rand::thread_rng())
    }

    pub fn split_with<'a, R: Rng + ?Sized>(&self, dataset: &'a Dataset, rng: &mut R) -> Split<'a> {
        let rows = dataset.rows();
        let mut indices: Vec<usize> = (0..rows.len()).collect();
        indices.shuffle(rng);

        let n_test = self.test_size(rows.len());
        let test = indices[..n_test].iter().map(|&i| &rows[i]).collect::<Vec<_>>();
        let train = indices[n_test..].iter().map(|&i| &rows[i]).collect::<Vec<_>>();

        debug!(train = train.len(), test = test.len(), "Drew split");
        Split { train, test }
    }
}
