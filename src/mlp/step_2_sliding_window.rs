// External imports
use anyhow::{Context, Result};
use log::{debug, info};
use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

// Internal imports
use super::step_1_normalization::NormalizationRange;
use crate::error::PredictorError;
use crate::util::file_utils::{read_numeric_rows, read_price_series};

/// One supervised example: `window_size` normalized prices and the price that followed
#[derive(Debug, Clone, PartialEq)]
pub struct WindowRow {
    pub features: Vec<f64>,
    pub label: f64,
}

impl WindowRow {
    /// Render the row as `f1,...,fN,label`
    pub fn to_csv_line(&self) -> String {
        self.features
            .iter()
            .chain(std::iter::once(&self.label))
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Result of the data preparation pass
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub range: NormalizationRange,
    pub values_read: usize,
    pub rows_written: usize,
}

/// Fixed-capacity FIFO over a normalized stream
///
/// Holds `window_size + 1` values; every push that fills it yields a row and
/// drops the oldest value, so consecutive rows overlap by `window_size`.
#[derive(Debug)]
pub struct SlidingWindow {
    window_size: usize,
    queue: VecDeque<f64>,
}

impl SlidingWindow {
    pub fn new(window_size: usize) -> Result<Self> {
        if window_size == 0 {
            return Err(PredictorError::InvalidWindowSize.into());
        }
        Ok(Self {
            window_size,
            queue: VecDeque::with_capacity(window_size + 1),
        })
    }

    /// Push a value, returning a row once `window_size + 1` values are queued
    pub fn push(&mut self, value: f64) -> Option<WindowRow> {
        self.queue.push_back(value);
        if self.queue.len() < self.window_size + 1 {
            return None;
        }
        let row = WindowRow {
            features: self.queue.iter().take(self.window_size).copied().collect(),
            label: self.queue[self.window_size],
        };
        self.queue.pop_front();
        Some(row)
    }
}

/// Frame a normalized series as overlapping windows
///
/// # Arguments
///
/// * `values` - Normalized series in time order
/// * `window_size` - Number of inputs per row
///
/// # Returns
///
/// Returns `values.len() - window_size` rows (none if the series is too short)
pub fn build_windows(values: &[f64], window_size: usize) -> Result<Vec<WindowRow>> {
    let mut window = SlidingWindow::new(window_size)?;
    Ok(values.iter().filter_map(|&v| window.push(v)).collect())
}

/// Write window rows to a header-less CSV file, replacing any previous content
pub fn write_learning_data<P: AsRef<Path>>(path: P, rows: &[WindowRow]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let file = File::create(path)
        .with_context(|| format!("Failed to create learning data file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for row in rows {
        writeln!(writer, "{}", row.to_csv_line())?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write learning data file {}", path.display()))?;
    Ok(())
}

/// Normalize a raw price file and write its sliding windows
///
/// # Arguments
///
/// * `raw_path` - Raw `timestamp,price` file
/// * `learning_path` - Destination of the windowed dataset
/// * `window_size` - Number of inputs per row
///
/// # Returns
///
/// Returns the normalization range and row counts
pub fn prepare_learning_data<P: AsRef<Path>, Q: AsRef<Path>>(
    raw_path: P,
    learning_path: Q,
    window_size: usize,
) -> Result<PreparedData> {
    let raw_path = raw_path.as_ref();
    let learning_path = learning_path.as_ref();
    info!("Loading raw prices from {}", raw_path.display());

    let prices = read_price_series(raw_path)?;
    let range = NormalizationRange::from_values(&prices)
        .with_context(|| format!("Cannot normalize {}", raw_path.display()))?;
    debug!("Normalization range: min = {}, max = {}", range.min, range.max);

    let rows = build_windows(&range.normalize_all(&prices), window_size)?;
    write_learning_data(learning_path, &rows)?;
    info!(
        "Wrote {} rows of window {} to {}",
        rows.len(),
        window_size,
        learning_path.display()
    );

    Ok(PreparedData {
        range,
        values_read: prices.len(),
        rows_written: rows.len(),
    })
}

/// Load a windowed dataset written by `prepare_learning_data`
///
/// # Arguments
///
/// * `path` - Learning data file
/// * `window_size` - Number of inputs per row; every row must carry `window_size + 1` fields
///
/// # Returns
///
/// Returns the rows in file order, or an error if there are none
pub fn load_learning_data<P: AsRef<Path>>(path: P, window_size: usize) -> Result<Vec<WindowRow>> {
    let path = path.as_ref();
    if window_size == 0 {
        return Err(PredictorError::InvalidWindowSize.into());
    }
    let is_empty = path.exists() && fs::metadata(path)?.len() == 0;
    if is_empty {
        return Err(PredictorError::EmptyDataset {
            values: 0,
            window_size,
        }
        .into());
    }

    let rows = read_numeric_rows(path, window_size + 1)?
        .into_iter()
        .map(|mut fields| {
            let label = fields.pop().unwrap_or_default();
            WindowRow {
                features: fields,
                label,
            }
        })
        .collect::<Vec<_>>();
    debug!("Loaded {} training rows from {}", rows.len(), path.display());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_sliding_window_emits_after_window_plus_one() -> Result<()> {
        let mut window = SlidingWindow::new(3)?;
        assert!(window.push(0.1).is_none());
        assert!(window.push(0.2).is_none());
        assert!(window.push(0.3).is_none());

        let row = window.push(0.4).expect("fourth value completes the window");
        assert_eq!(row.features, vec![0.1, 0.2, 0.3]);
        assert_eq!(row.label, 0.4);

        let row = window.push(0.5).expect("window advances by one");
        assert_eq!(row.features, vec![0.2, 0.3, 0.4]);
        assert_eq!(row.label, 0.5);
        Ok(())
    }

    #[test]
    fn test_build_windows_row_count_and_order() -> Result<()> {
        let values: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let rows = build_windows(&values, 5)?;
        assert_eq!(rows.len(), values.len() - 5);

        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.features, values[i..i + 5].to_vec());
            assert_eq!(row.label, values[i + 5]);
        }
        Ok(())
    }

    #[test]
    fn test_build_windows_short_series() -> Result<()> {
        assert!(build_windows(&[0.1, 0.2, 0.3], 3)?.is_empty());
        assert!(build_windows(&[], 3)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_zero_window_is_rejected() {
        assert!(SlidingWindow::new(0).is_err());
        assert!(build_windows(&[0.1, 0.2], 0).is_err());
    }

    #[test]
    fn test_csv_line_format() {
        let row = WindowRow {
            features: vec![0.1, 0.25],
            label: 0.9,
        };
        assert_eq!(row.to_csv_line(), "0.1,0.25,0.9");
    }

    #[test]
    fn test_written_rows_load_back() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("learning.csv");
        let values: Vec<f64> = (0..12).map(|i| 0.1 + i as f64 * 0.05).collect();
        let rows = build_windows(&values, 4)?;

        write_learning_data(&path, &rows)?;
        let loaded = load_learning_data(&path, 4)?;
        assert_eq!(loaded, rows);
        Ok(())
    }

    #[test]
    fn test_load_learning_data_empty_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("learning.csv");
        write_learning_data(&path, &[])?;

        let err = load_learning_data(&path, 4).expect_err("empty dataset");
        assert!(matches!(
            err.downcast_ref::<PredictorError>(),
            Some(PredictorError::EmptyDataset { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_load_learning_data_wrong_window() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("learning.csv");
        let rows = build_windows(&[0.1, 0.2, 0.3, 0.4, 0.5], 2)?;
        write_learning_data(&path, &rows)?;

        assert!(load_learning_data(&path, 3).is_err());
        Ok(())
    }

    #[test]
    fn test_prepare_learning_data_too_few_values() -> Result<()> {
        let dir = tempdir()?;
        let raw = dir.path().join("raw.csv");
        let learning = dir.path().join("learning.csv");
        fs::write(&raw, "1,10.0\n2,11.0\n3,12.0\n")?;

        let prepared = prepare_learning_data(&raw, &learning, 3)?;
        assert_eq!(prepared.values_read, 3);
        assert_eq!(prepared.rows_written, 0);
        assert_eq!(fs::read_to_string(&learning)?, "");
        Ok(())
    }
}
