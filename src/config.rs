use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants;
use crate::error::PredictorError;
use crate::mlp::step_4_train_model::TrainingConfig;
use crate::mlp::step_5_prediction::EvaluationSample;

/// Settings for one prepare → train → test run
///
/// Every field has a default, so a JSON file only needs the keys it overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub raw_data_path: PathBuf,
    pub learning_data_path: PathBuf,
    /// Base path of the model; `.bin` and `.meta.json` are written next to it
    pub model_path: PathBuf,
    pub window_size: usize,
    pub training: TrainingConfig,
    pub evaluation: EvaluationSample,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_data_path: PathBuf::from(constants::RAW_DATA_PATH),
            learning_data_path: PathBuf::from(constants::LEARNING_DATA_PATH),
            model_path: PathBuf::from(constants::MODEL_PATH),
            window_size: constants::WINDOW_SIZE,
            training: TrainingConfig::default(),
            evaluation: EvaluationSample::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(PredictorError::InvalidWindowSize.into());
        }
        if self.evaluation.window.len() != self.window_size {
            return Err(PredictorError::WindowMismatch {
                expected: self.window_size,
                found: self.evaluation.window.len(),
            })
            .context("Evaluation window does not match the configured window size");
        }
        self.training.validate()
    }
}
