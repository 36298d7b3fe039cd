// External imports
use anyhow::Result;
use serde::{Deserialize, Serialize};

// Internal imports
use crate::constants::{NORMALIZED_HIGH, NORMALIZED_LOW};
use crate::error::PredictorError;

/// Min-max range of a price series, mapping prices into [0.1, 0.9]
///
/// The range is persisted next to the trained model so predictions are
/// denormalized with exactly the bounds the training data was scaled with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationRange {
    pub min: f64,
    pub max: f64,
}

impl NormalizationRange {
    /// Create a range, rejecting bounds that would divide by zero
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() || max <= min {
            return Err(PredictorError::DegenerateRange { min, max }.into());
        }
        Ok(Self { min, max })
    }

    /// Scan a series once and build its range
    ///
    /// # Arguments
    ///
    /// * `values` - Raw prices
    ///
    /// # Returns
    ///
    /// Returns the (min, max) range, or an error for an empty or constant series
    pub fn from_values(values: &[f64]) -> Result<Self> {
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &v| {
                (min.min(v), max.max(v))
            });
        if values.is_empty() {
            return Err(PredictorError::DegenerateRange { min, max }.into());
        }
        Self::new(min, max)
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn normalize(&self, value: f64) -> f64 {
        (value - self.min) / self.span() * (NORMALIZED_HIGH - NORMALIZED_LOW) + NORMALIZED_LOW
    }

    pub fn denormalize(&self, value: f64) -> f64 {
        self.min + (value - NORMALIZED_LOW) * self.span() / (NORMALIZED_HIGH - NORMALIZED_LOW)
    }

    pub fn normalize_all(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.normalize(v)).collect()
    }
}
