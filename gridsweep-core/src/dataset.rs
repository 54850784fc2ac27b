//! Labeled text dataset, loaded once and shared read-only by every run.

use crate::config::DatasetConfig;
use crate::error::SweepError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// A single (text, label) row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabeledRow {
    pub text: String,
    pub label: String,
}

impl LabeledRow {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}

/// Immutable, ordered collection of labeled rows.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    rows: Vec<LabeledRow>,
}

impl Dataset {
    pub fn from_rows(rows: Vec<LabeledRow>) -> Self {
        Self { rows }
    }

    /// Read a headed CSV file, picking the configured text and label columns.
    pub fn load(config: &DatasetConfig) -> Result<Self, SweepError> {
        Self::load_csv(
            &config.path,
            &config.text_column,
            &config.label_column,
            config.delimiter,
        )
    }

    pub fn load_csv(
        path: &Path,
        text_column: &str,
        label_column: &str,
        delimiter: char,
    ) -> Result<Self, SweepError> {
        let delimiter = u8::try_from(delimiter)
            .map_err(|_| SweepError::config(format!("delimiter {delimiter:?} is not ASCII")))?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .from_path(path)
            .map_err(|e| SweepError::dataset(format!("{}: {e}", path.display())))?;

        let headers = reader.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| {
                    SweepError::dataset(format!("{}: missing column '{name}'", path.display()))
                })
        };
        let text_idx = column(text_column)?;
        let label_idx = column(label_column)?;

        let mut rows = Vec::new();
        let mut skipped = 0usize;
        for record in reader.records() {
            let record = record?;
            let (Some(text), Some(label)) = (record.get(text_idx), record.get(label_idx)) else {
                skipped += 1;
                continue;
            };
            if label.trim().is_empty() {
                skipped += 1;
                continue;
            }
            rows.push(LabeledRow::new(text, label.trim()));
        }
        if skipped > 0 {
            warn!(path = %path.display(), skipped, "Skipped rows without a label");
        }

        if rows.is_empty() {
            return Err(SweepError::dataset(format!(
                "{}: no labeled rows",
                path.display()
            )));
        }

        info!(path = %path.display(), rows = rows.len(), "Loaded dataset");
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[LabeledRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
