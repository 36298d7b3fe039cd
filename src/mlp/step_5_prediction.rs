// External imports
use anyhow::{anyhow, Result};
use burn::tensor::{backend::Backend, Tensor, TensorData};
use serde::{Deserialize, Serialize};
use std::fmt;

// Internal imports
use super::step_1_normalization::NormalizationRange;
use super::step_3_mlp_model_arch::StockMlp;
use crate::constants::{EVALUATION_EXPECTED, EVALUATION_WINDOW};
use crate::error::PredictorError;

/// A window of raw prices and the price that actually followed it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationSample {
    pub window: Vec<f64>,
    pub expected: f64,
}

impl Default for EvaluationSample {
    fn default() -> Self {
        Self {
            window: EVALUATION_WINDOW.to_vec(),
            expected: EVALUATION_EXPECTED,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationReport {
    pub expected: f64,
    pub predicted: f64,
    pub percentage_error: f64,
}

impl EvaluationReport {
    pub fn new(expected: f64, predicted: f64) -> Self {
        Self {
            expected,
            predicted,
            percentage_error: ((expected - predicted) / expected * 100.0).abs(),
        }
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Expected  value  : {:.2}", self.expected)?;
        writeln!(f, "Predicted value  : {:.2}", self.predicted)?;
        write!(f, "Predicted error  : {:.2}%", self.percentage_error)
    }
}

/// Run the network on one normalized window
///
/// # Returns
///
/// Returns the raw (normalized) network output
pub fn predict_normalized<B: Backend>(
    model: &StockMlp<B>,
    window: &[f64],
    device: &B::Device,
) -> Result<f64> {
    if window.len() != model.window_size() {
        return Err(PredictorError::WindowMismatch {
            expected: model.window_size(),
            found: window.len(),
        }
        .into());
    }
    let values: Vec<f32> = window.iter().map(|&v| v as f32).collect();
    let input = Tensor::<B, 2>::from_data(TensorData::new(values, [1, window.len()]), device);

    let output = model
        .forward(input)
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow!("Failed to read network output: {:?}", e))?;
    output
        .first()
        .map(|&v| v as f64)
        .ok_or_else(|| anyhow!("Network produced no output"))
}

/// Predict the next raw price after a window of raw prices
pub fn predict_next<B: Backend>(
    model: &StockMlp<B>,
    range: &NormalizationRange,
    prices: &[f64],
    device: &B::Device,
) -> Result<f64> {
    let normalized = range.normalize_all(prices);
    let output = predict_normalized(model, &normalized, device)?;
    Ok(range.denormalize(output))
}

/// Score a hand-picked sample against its known outcome
pub fn evaluate_sample<B: Backend>(
    model: &StockMlp<B>,
    range: &NormalizationRange,
    sample: &EvaluationSample,
    device: &B::Device,
) -> Result<EvaluationReport> {
    let predicted = predict_next(model, range, &sample.window, device)?;
    Ok(EvaluationReport::new(sample.expected, predicted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mlp::step_3_mlp_model_arch::StockMlpConfig;
    use burn_ndarray::{NdArray, NdArrayDevice};

    #[test]
    fn test_report_percentage_error() {
        let report = EvaluationReport::new(200.0, 190.0);
        assert!((report.percentage_error - 5.0).abs() < 1e-12);

        let report = EvaluationReport::new(200.0, 210.0);
        assert!((report.percentage_error - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_report_lines() {
        let report = EvaluationReport::new(2066.96, 2070.5);
        let text = report.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Expected  value  : 2066.96");
        assert_eq!(lines[1], "Predicted value  : 2070.50");
        assert_eq!(lines[2], "Predicted error  : 0.17%");
    }

    #[test]
    fn test_default_sample() {
        let sample = EvaluationSample::default();
        assert_eq!(sample.window.len(), 10);
        assert_eq!(sample.window[0], 2089.27);
        assert_eq!(sample.expected, 2066.96);
    }

    #[test]
    fn test_prediction_is_denormalized_into_range() -> Result<()> {
        let device = NdArrayDevice::default();
        let model: StockMlp<NdArray> = StockMlpConfig::for_window(10).init(&device);
        let range = NormalizationRange::new(2000.0, 2150.0)?;

        let predicted = predict_next(&model, &range, &EvaluationSample::default().window, &device)?;
        // Sigmoid output in (0, 1) maps to (min - 0.125 * span, max + 0.125 * span)
        assert!(predicted > 2000.0 - 0.125 * 150.0 && predicted < 2150.0 + 0.125 * 150.0);
        Ok(())
    }

    #[test]
    fn test_window_length_must_match_model() {
        let device = NdArrayDevice::default();
        let model: StockMlp<NdArray> = StockMlpConfig::for_window(10).init(&device);

        let err = predict_normalized(&model, &[0.5; 3], &device).expect_err("short window");
        assert!(matches!(
            err.downcast_ref::<PredictorError>(),
            Some(PredictorError::WindowMismatch { expected: 10, found: 3 })
        ));
    }
}
