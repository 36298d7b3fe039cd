use anyhow::{Context, Result};
use burn::module::Module;
use burn::record::{BinFileRecorder, FullPrecisionSettings};
use burn::tensor::backend::Backend;
use chrono::Local;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::step_1_normalization::NormalizationRange;
use super::step_3_mlp_model_arch::{StockMlp, StockMlpConfig};
use super::step_4_train_model::TrainingSummary;
use crate::constants::{METADATA_EXTENSION, MODEL_EXTENSION};
use crate::error::PredictorError;

/// Everything needed to rebuild and use a saved network besides its weights
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ModelMetadata {
    pub version: String,
    pub trained_at: String,
    pub network: StockMlpConfig,
    pub range: NormalizationRange,
    pub training: Option<TrainingSummary>,
}

impl ModelMetadata {
    pub fn new(
        network: StockMlpConfig,
        range: NormalizationRange,
        training: Option<TrainingSummary>,
    ) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            trained_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            network,
            range,
            training,
        }
    }
}

pub fn model_file(path: impl AsRef<Path>) -> PathBuf {
    path.as_ref().with_extension(MODEL_EXTENSION)
}

pub fn metadata_file(path: impl AsRef<Path>) -> PathBuf {
    path.as_ref().with_extension(METADATA_EXTENSION)
}

/// Save the model weights and metadata, overwriting any previous model at `path`
pub fn save_model_with_metadata<B: Backend>(
    model: &StockMlp<B>,
    metadata: &ModelMetadata,
    path: impl AsRef<Path>,
) -> Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent).context("Failed to create model parent directory")?;
    }
    let model_path = model_file(&path);
    model
        .clone()
        .save_file::<BinFileRecorder<FullPrecisionSettings>, _>(&model_path, &Default::default())
        .context("Failed to save model")?;

    let metadata_path = metadata_file(&path);
    let metadata_json =
        serde_json::to_string_pretty(metadata).context("Failed to serialize metadata")?;
    std::fs::write(&metadata_path, metadata_json).context("Failed to write metadata file")?;

    info!("Model saved to {}", model_path.display());
    Ok(())
}

pub fn load_metadata(path: impl AsRef<Path>) -> Result<ModelMetadata> {
    let metadata_path = metadata_file(&path);
    if !metadata_path.exists() {
        return Err(PredictorError::ModelNotFound(metadata_path).into());
    }
    let metadata_json =
        std::fs::read_to_string(&metadata_path).context("Failed to read metadata file")?;
    serde_json::from_str(&metadata_json).context("Failed to parse metadata")
}

/// Load the model and its metadata; the topology comes from the metadata
pub fn load_model_with_metadata<B: Backend>(
    path: impl AsRef<Path>,
    device: &B::Device,
) -> Result<(StockMlp<B>, ModelMetadata)> {
    let metadata = load_metadata(&path)?;
    let model_path = model_file(&path);
    if !model_path.exists() {
        return Err(PredictorError::ModelNotFound(model_path).into());
    }
    let model = metadata
        .network
        .init::<B>(device)
        .load_file::<BinFileRecorder<FullPrecisionSettings>, _>(&model_path, &Default::default(), device)
        .context("Failed to load model")?;
    Ok((model, metadata))
}

/// Check that both model files exist and the metadata parses
pub fn verify_model(path: impl AsRef<Path>) -> Result<bool> {
    if !model_file(&path).exists() || !metadata_file(&path).exists() {
        return Ok(false);
    }
    load_metadata(&path)?;
    Ok(true)
}
