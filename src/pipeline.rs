// External crates
use anyhow::{Context, Result};
use burn_ndarray::{NdArray, NdArrayDevice};
use log::info;

// Local modules
use crate::config::PipelineConfig;
use crate::mlp::step_1_normalization::NormalizationRange;
use crate::mlp::step_2_sliding_window::{load_learning_data, prepare_learning_data, PreparedData};
use crate::mlp::step_3_mlp_model_arch::StockMlpConfig;
use crate::mlp::step_4_train_model::{train_model, TrainingProgress, TrainingSummary};
use crate::mlp::step_5_prediction::{evaluate_sample, EvaluationReport};
use crate::mlp::step_6_model_serialization::{
    load_model_with_metadata, save_model_with_metadata, ModelMetadata,
};

pub type InferenceBackend = NdArray<f32>;

/// Normalize the raw prices and write the windowed learning data
pub fn prepare_data(config: &PipelineConfig) -> Result<PreparedData> {
    prepare_learning_data(
        &config.raw_data_path,
        &config.learning_data_path,
        config.window_size,
    )
    .context("Data preparation failed")
}

/// Train on the learning data and save the model together with `range`
///
/// `range` must be the one `prepare_data` produced for the same learning data;
/// it is stored in the model metadata and used to denormalize predictions.
pub fn train_network<F>(
    config: &PipelineConfig,
    range: NormalizationRange,
    on_progress: F,
) -> Result<TrainingSummary>
where
    F: FnMut(TrainingProgress),
{
    let rows = load_learning_data(&config.learning_data_path, config.window_size)
        .context("Failed to load training data")?;

    let device = NdArrayDevice::default();
    let network = StockMlpConfig::for_window(config.window_size);
    let (model, summary) = train_model(&rows, network, &config.training, &device, on_progress)
        .context("Training failed")?;

    let metadata = ModelMetadata::new(network, range, Some(summary.clone()));
    save_model_with_metadata(&model, &metadata, &config.model_path)?;
    Ok(summary)
}

/// Load the saved model and score the configured evaluation sample
pub fn test_network(config: &PipelineConfig) -> Result<EvaluationReport> {
    let device = NdArrayDevice::default();
    let (model, metadata) =
        load_model_with_metadata::<InferenceBackend>(&config.model_path, &device)
            .context("Failed to load trained model")?;
    info!(
        "Loaded model trained at {} (range {} - {})",
        metadata.trained_at, metadata.range.min, metadata.range.max
    );
    evaluate_sample(&model, &metadata.range, &config.evaluation, &device)
}

/// Run prepare → train → test
pub fn run<F>(config: &PipelineConfig, on_progress: F) -> Result<EvaluationReport>
where
    F: FnMut(TrainingProgress),
{
    config.validate()?;
    let prepared = prepare_data(config)?;
    info!(
        "Prepared {} training rows from {} prices",
        prepared.rows_written, prepared.values_read
    );

    info!("Training starting");
    train_network(config, prepared.range, on_progress)?;

    info!("Testing network");
    test_network(config)
}
