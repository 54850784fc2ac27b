//! Grid enumeration: the flat, ordered list of training configurations.

use crate::config::GridConfig;
use crate::error::SweepError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One concrete assignment of a value to every swept axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Embedding dimension.
    pub dim: u32,
    /// Number of training epochs.
    pub epochs: u32,
    /// Word n-gram order.
    pub ngrams: u32,
    /// Learning rate.
    pub lr: f64,
}

/// A single axis value, kept typed so naming can format it losslessly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisValue {
    Int(u32),
    Float(f64),
}

impl fmt::Display for AxisValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            // Shortest round-trip representation, so distinct floats never collide.
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

impl TrainingConfig {
    /// Axis name/value pairs in naming order.
    pub fn axes(&self) -> [(&'static str, AxisValue); 4] {
        [
            ("dim", AxisValue::Int(self.dim)),
            ("epochs", AxisValue::Int(self.epochs)),
            ("ngrams", AxisValue::Int(self.ngrams)),
            ("l", AxisValue::Float(self.lr)),
        ]
    }
}

/// The full Cartesian product of the axis candidate lists.
///
/// Nesting is outer-to-inner: n-gram order, dimension, learning rate.
#[derive(Debug, Clone, Default)]
pub struct ConfigGrid {
    configs: Vec<TrainingConfig>,
}

impl ConfigGrid {
    /// Build the grid. An empty candidate list yields an empty grid, not an error.
    pub fn new(
        ngrams: &[u32],
        dims: &[u32],
        learning_rates: &[f64],
        epochs: u32,
    ) -> Result<Self, SweepError> {
        if epochs == 0 {
            return Err(SweepError::config("epochs must be at least 1"));
        }
        validate_ints("ngrams", ngrams)?;
        validate_ints("dims", dims)?;
        validate_learning_rates(learning_rates)?;

        let mut configs = Vec::with_capacity(ngrams.len() * dims.len() * learning_rates.len());
        for &ngrams in ngrams {
            for &dim in dims {
                for &lr in learning_rates {
                    configs.push(TrainingConfig {
                        dim,
                        epochs,
                        ngrams,
                        lr,
                    });
                }
            }
        }
        Ok(Self { configs })
    }

    pub fn from_config(grid: &GridConfig) -> Result<Self, SweepError> {
        Self::new(&grid.ngrams, &grid.dims, &grid.learning_rates, grid.epochs)
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrainingConfig> {
        self.configs.iter()
    }

    pub fn configs(&self) -> &[TrainingConfig] {
        &self.configs
    }
}

impl<'a> IntoIterator for &'a ConfigGrid {
    type Item = &'a TrainingConfig;
    type IntoIter = std::slice::Iter<'a, TrainingConfig>;

    fn into_iter(self) -> Self::IntoIter {
        self.configs.iter()
    }
}

fn validate_ints(axis: &str, values: &[u32]) -> Result<(), SweepError> {
    if values.contains(&0) {
        return Err(SweepError::config(format!("{axis} values must be positive")));
    }
    for (i, v) in values.iter().enumerate() {
        if values[..i].contains(v) {
            return Err(SweepError::config(format!("duplicate {axis} value {v}")));
        }
    }
    Ok(())
}

fn validate_learning_rates(values: &[f64]) -> Result<(), SweepError> {
    for (i, v) in values.iter().enumerate() {
        if !v.is_finite() || *v <= 0.0 {
            return Err(SweepError::config(format!(
                "learning rate {v} must be finite and positive"
            )));
        }
        if values[..i].iter().any(|prev| prev.to_bits() == v.to_bits()) {
            return Err(SweepError::config(format!("duplicate learning rate {v}")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cartesian_product_size() {
        let grid = ConfigGrid::new(&[1, 2, 3], &[20, 300, 700], &[0.01, 0.05, 0.1, 0.2], 100)
            .unwrap();
        assert_eq!(grid.len(), 36);
    }

    #[test]
    fn test_nested_order() {
        let grid = ConfigGrid::new(&[1, 2], &[20, 300], &[0.1, 0.2], 5).unwrap();
        let order: Vec<(u32, u32, f64)> = grid.iter().map(|c| (c.ngrams, c.dim, c.lr)).collect();
        assert_eq!(
            order,
            vec![
                (1, 20, 0.1),
                (1, 20, 0.2),
                (1, 300, 0.1),
                (1, 300, 0.2),
                (2, 20, 0.1),
                (2, 20, 0.2),
                (2, 300, 0.1),
                (2, 300, 0.2),
            ]
        );
        assert!(grid.iter().all(|c| c.epochs == 5));
    }

    #[test]
    fn test_empty_axis_yields_empty_grid() {
        let grid = ConfigGrid::new(&[1, 2], &[], &[0.1], 5).unwrap();
        assert!(grid.is_empty());
        assert_eq!(grid.iter().count(), 0);
    }

    #[test]
    fn test_rejects_malformed_axes() {
        assert!(ConfigGrid::new(&[0], &[20], &[0.1], 5).is_err());
        assert!(ConfigGrid::new(&[1, 1], &[20], &[0.1], 5).is_err());
        assert!(ConfigGrid::new(&[1], &[20], &[0.1, 0.1], 5).is_err());
        assert!(ConfigGrid::new(&[1], &[20], &[f64::NAN], 5).is_err());
        assert!(ConfigGrid::new(&[1], &[20], &[-0.1], 5).is_err());
        assert!(ConfigGrid::new(&[1], &[20], &[0.1], 0).is_err());
    }

    #[test]
    fn test_axis_display() {
        assert_eq!(AxisValue::Int(300).to_string(), "300");
        assert_eq!(AxisValue::Float(0.05).to_string(), "0.05");
        assert_eq!(AxisValue::Float(1.0).to_string(), "1");
    }
}
