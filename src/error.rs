use std::path::PathBuf;
use thiserror::Error;

/// Domain failures of the prepare → train → test pipeline.
///
/// I/O and framework errors are carried through `anyhow` with context; these
/// variants cover the conditions the pipeline checks for itself.
#[derive(Debug, Error)]
pub enum PredictorError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Input file {} is empty", .0.display())]
    EmptyInput(PathBuf),

    #[error("Input file {} has no price column (expected `timestamp,price`)", .0.display())]
    MissingPriceColumn(PathBuf),

    #[error("Row {row}: price field {value} is not a finite number")]
    UnparseableValue { row: usize, value: String },

    #[error("Degenerate normalization range (min = {min}, max = {max}); the series needs at least two distinct values")]
    DegenerateRange { min: f64, max: f64 },

    #[error("Window size must be at least 1")]
    InvalidWindowSize,

    #[error("No training rows: {values} values are not enough for a window of {window_size}")]
    EmptyDataset { values: usize, window_size: usize },

    #[error("Learning data has {found} columns per row, expected {expected}")]
    RowWidthMismatch { expected: usize, found: usize },

    #[error("Model expects a window of {expected} values, got {found}")]
    WindowMismatch { expected: usize, found: usize },

    #[error("No trained model at {}", .0.display())]
    ModelNotFound(PathBuf),
}
