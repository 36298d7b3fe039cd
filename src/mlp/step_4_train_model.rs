// External imports
use anyhow::{bail, Result};
use burn::optim::momentum::MomentumConfig;
use burn::optim::{GradientsParams, Optimizer, SgdConfig};
use burn::tensor::{backend::Backend, Tensor, TensorData};
use burn_autodiff::Autodiff;
use burn_ndarray::NdArray;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::time::Instant;

// Internal imports
use super::step_2_sliding_window::WindowRow;
use super::step_3_mlp_model_arch::{StockMlp, StockMlpConfig};
use crate::constants;
use crate::error::PredictorError;

pub type TrainingBackend = Autodiff<NdArray<f32>>;

/// Configuration of the back-propagation learning rule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub learning_rate: f64,
    pub max_iterations: usize,
    /// Training stops once the total network error drops below this
    pub max_error: f64,
    /// Largest absolute per-iteration error change that still counts as stalled
    pub min_error_change: f64,
    /// Consecutive stalled iterations tolerated before stopping (0 disables the check)
    pub min_error_change_iterations: usize,
    /// Report progress every this many iterations (0 disables reporting)
    pub progress_interval: usize,
    /// Fraction of the previous weight change added to each update (`None` for plain SGD)
    pub momentum: Option<f64>,
    /// One weight update per iteration over the whole dataset instead of one per row
    pub batch_mode: bool,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: constants::LEARNING_RATE,
            max_iterations: constants::MAX_ITERATIONS,
            max_error: constants::MAX_ERROR,
            min_error_change: constants::MAX_ERROR / 2.0,
            min_error_change_iterations: constants::MIN_ERROR_CHANGE_ITERATIONS,
            progress_interval: constants::PROGRESS_INTERVAL,
            momentum: Some(constants::MOMENTUM),
            batch_mode: false,
            seed: constants::TRAINING_SEED,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.learning_rate.is_nan() || self.learning_rate <= 0.0 {
            bail!("Learning rate must be positive, got {}", self.learning_rate);
        }
        if self.max_iterations == 0 {
            bail!("Max iterations must be at least 1");
        }
        if let Some(momentum) = self.momentum {
            if !(0.0..1.0).contains(&momentum) {
                bail!("Momentum must be in [0, 1), got {}", momentum);
            }
        }
        Ok(())
    }
}

/// Snapshot handed to the progress observer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingProgress {
    pub iteration: usize,
    pub total_error: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    MaxIterations,
    ErrorTargetReached,
    ErrorChangeStalled,
}

/// Outcome of a training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub iterations: usize,
    pub final_error: f64,
    pub stop_reason: StopReason,
    pub training_rows: usize,
    pub training_time_seconds: f64,
}

/// Stack window rows into `[rows, window_size]` inputs and `[rows, 1]` targets
pub fn rows_to_tensors<B: Backend>(
    rows: &[WindowRow],
    window_size: usize,
    device: &B::Device,
) -> Result<(Tensor<B, 2>, Tensor<B, 2>)> {
    if rows.is_empty() {
        return Err(PredictorError::EmptyDataset {
            values: 0,
            window_size,
        }
        .into());
    }

    let mut features = Vec::with_capacity(rows.len() * window_size);
    let mut targets = Vec::with_capacity(rows.len());
    for row in rows {
        if row.features.len() != window_size {
            return Err(PredictorError::RowWidthMismatch {
                expected: window_size + 1,
                found: row.features.len() + 1,
            }
            .into());
        }
        features.extend(row.features.iter().map(|&v| v as f32));
        targets.push(row.label as f32);
    }

    let inputs = Tensor::<B, 2>::from_data(TensorData::new(features, [rows.len(), window_size]), device);
    let labels = Tensor::<B, 2>::from_data(TensorData::new(targets, [rows.len(), 1]), device);
    Ok((inputs, labels))
}

/// Train the network with gradient descent
///
/// Each iteration is one pass over the dataset. The total network error of an
/// iteration is the mean over rows of `0.5 * (output - target)^2`, accumulated
/// while the weights are being updated. Training stops at the first of: the
/// iteration limit, the error target, or `min_error_change_iterations`
/// consecutive iterations whose absolute error change is at most
/// `min_error_change`.
///
/// # Arguments
///
/// * `rows` - Windowed training data
/// * `model_config` - Layer sizes
/// * `config` - Learning rule settings
/// * `device` - Device to place tensors on
/// * `on_progress` - Called every `progress_interval` iterations
///
/// # Returns
///
/// Returns the trained model and a summary of the run
pub fn train_model<F>(
    rows: &[WindowRow],
    model_config: StockMlpConfig,
    config: &TrainingConfig,
    device: &<TrainingBackend as Backend>::Device,
    mut on_progress: F,
) -> Result<(StockMlp<TrainingBackend>, TrainingSummary)>
where
    F: FnMut(TrainingProgress),
{
    config.validate()?;
    let (inputs, targets) = rows_to_tensors::<TrainingBackend>(rows, model_config.window_size, device)?;
    let num_rows = rows.len();
    info!(
        "Training {}-{}-{}-1 network on {} rows",
        model_config.window_size, model_config.first_hidden, model_config.second_hidden, num_rows
    );

    <TrainingBackend as Backend>::seed(config.seed);
    let mut model = model_config.init::<TrainingBackend>(device);

    let momentum = config
        .momentum
        .map(|m| MomentumConfig::new().with_momentum(m).with_dampening(0.0));
    let mut optimizer = SgdConfig::new().with_momentum(momentum).init();

    let started = Instant::now();
    let mut previous_error: Option<f64> = None;
    let mut stalled_iterations = 0;
    let mut iteration = 0;
    let mut total_error;

    let stop_reason = loop {
        iteration += 1;

        if config.batch_mode {
            let diff = model.forward(inputs.clone()) - targets.clone();
            let loss = (diff.clone() * diff).mean().mul_scalar(0.5);
            total_error = loss.clone().into_scalar() as f64;

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optimizer.step(config.learning_rate, model, grads);
        } else {
            let mut error_sum = 0.0;
            for row in 0..num_rows {
                let input = inputs.clone().narrow(0, row, 1);
                let target = targets.clone().narrow(0, row, 1);

                let diff = model.forward(input) - target;
                let loss = (diff.clone() * diff).sum().mul_scalar(0.5);
                error_sum += loss.clone().into_scalar() as f64;

                let grads = GradientsParams::from_grads(loss.backward(), &model);
                model = optimizer.step(config.learning_rate, model, grads);
            }
            total_error = error_sum / num_rows as f64;
        }

        if config.progress_interval > 0 && iteration % config.progress_interval == 0 {
            on_progress(TrainingProgress {
                iteration,
                total_error,
            });
        }

        if total_error < config.max_error {
            break StopReason::ErrorTargetReached;
        }
        if let Some(previous) = previous_error {
            if (previous - total_error).abs() <= config.min_error_change {
                stalled_iterations += 1;
            } else {
                stalled_iterations = 0;
            }
            if config.min_error_change_iterations > 0
                && stalled_iterations >= config.min_error_change_iterations
            {
                break StopReason::ErrorChangeStalled;
            }
        }
        previous_error = Some(total_error);

        if iteration >= config.max_iterations {
            break StopReason::MaxIterations;
        }
    };

    let summary = TrainingSummary {
        iterations: iteration,
        final_error: total_error,
        stop_reason,
        training_rows: num_rows,
        training_time_seconds: started.elapsed().as_secs_f64(),
    };
    debug!("Training summary: {:?}", summary);
    info!(
        "Training stopped after {} iterations ({:?}), total error {:.6}%",
        summary.iterations,
        summary.stop_reason,
        summary.final_error * 100.0
    );

    Ok((model, summary))
}
