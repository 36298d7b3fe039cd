// External crates
use anyhow::{Context, Result};
use polars::prelude::*;
use std::path::Path;

// Local modules
use crate::error::PredictorError;

/// Read a header-less, comma-delimited file into a DataFrame
///
/// Columns come back as `column_1`, `column_2`, ... The whole file is used for
/// schema inference so a stray text field anywhere turns its column into a
/// string column instead of being silently dropped.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
/// * `truncate_ragged_lines` - Drop trailing fields beyond the first row's width
///
/// # Returns
///
/// Returns the parsed DataFrame, or an error if the file is missing or empty
pub fn read_headerless_csv<P: AsRef<Path>>(
    file_path: P,
    truncate_ragged_lines: bool,
) -> Result<DataFrame> {
    let path = file_path.as_ref();
    if !path.exists() {
        return Err(PredictorError::FileNotFound(path.to_path_buf()).into());
    }
    let is_empty = std::fs::metadata(path)
        .with_context(|| format!("Failed to stat {}", path.display()))?
        .len()
        == 0;
    if is_empty {
        return Err(PredictorError::EmptyInput(path.to_path_buf()).into());
    }

    let df = CsvReadOptions::default()
        .with_has_header(false)
        .with_infer_schema_length(None)
        .map_parse_options(|opts| opts.with_truncate_ragged_lines(truncate_ragged_lines))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("Failed to open {}", path.display()))?
        .finish()
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    if df.height() == 0 {
        return Err(PredictorError::EmptyInput(path.to_path_buf()).into());
    }
    Ok(df)
}

/// Convert one column to finite `f64` values, failing on the first bad row
///
/// Rows are reported 1-based, matching line numbers in the file.
pub fn column_to_f64(column: &Column) -> Result<Vec<f64>> {
    let original = column.as_materialized_series();
    let converted = original
        .cast(&DataType::Float64)
        .with_context(|| format!("Failed to convert column {} to numbers", original.name()))?;

    let mut values = Vec::with_capacity(converted.len());
    for (idx, value) in converted.f64()?.into_iter().enumerate() {
        match value {
            Some(v) if v.is_finite() => values.push(v),
            _ => {
                let raw = original
                    .get(idx)
                    .map(|v| v.to_string())
                    .unwrap_or_else(|_| "<missing>".to_string());
                return Err(PredictorError::UnparseableValue {
                    row: idx + 1,
                    value: raw,
                }
                .into());
            }
        }
    }
    Ok(values)
}

/// Read the price column of a raw `timestamp,price[,...]` file
///
/// Only the second column is used; any trailing columns are ignored.
///
/// # Arguments
///
/// * `file_path` - Path to the raw price file
///
/// # Returns
///
/// Returns the prices in file order
pub fn read_price_series<P: AsRef<Path>>(file_path: P) -> Result<Vec<f64>> {
    let path = file_path.as_ref();
    let df = read_headerless_csv(path, true)?;
    let price = df
        .select_at_idx(1)
        .ok_or_else(|| PredictorError::MissingPriceColumn(path.to_path_buf()))?;
    column_to_f64(price).with_context(|| format!("Invalid price data in {}", path.display()))
}

/// Read a header-less file of numeric rows with a fixed number of columns
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
/// * `width` - Number of fields every row must carry
///
/// # Returns
///
/// Returns the rows in file order
pub fn read_numeric_rows<P: AsRef<Path>>(file_path: P, width: usize) -> Result<Vec<Vec<f64>>> {
    let path = file_path.as_ref();
    let df = read_headerless_csv(path, false)?;
    if df.width() != width {
        return Err(PredictorError::RowWidthMismatch {
            expected: width,
            found: df.width(),
        }
        .into());
    }

    let columns = df
        .get_columns()
        .iter()
        .map(column_to_f64)
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("Invalid numeric data in {}", path.display()))?;

    let rows = (0..df.height())
        .map(|row| columns.iter().map(|column| column[row]).collect())
        .collect();
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_read_price_series_ignores_timestamp_and_trailing_columns() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("raw.csv");
        fs::write(&path, "2015-01-02,2058.2,x\n2015-01-05,2020.58,y\n2015-01-06,2002.61,z\n")?;

        let prices = read_price_series(&path)?;
        assert_eq!(prices, vec![2058.2, 2020.58, 2002.61]);
        Ok(())
    }

    #[test]
    fn test_read_price_series_accepts_integer_prices() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("raw.csv");
        fs::write(&path, "1,100\n2,101\n3,102\n")?;

        assert_eq!(read_price_series(&path)?, vec![100.0, 101.0, 102.0]);
        Ok(())
    }

    #[test]
    fn test_read_price_series_missing_file() {
        let result = read_price_series("does/not/exist.csv");
        let err = result.expect_err("missing file should fail");
        assert!(matches!(
            err.downcast_ref::<PredictorError>(),
            Some(PredictorError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_read_price_series_empty_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("empty.csv");
        fs::write(&path, "")?;

        let err = read_price_series(&path).expect_err("empty file should fail");
        assert!(matches!(
            err.downcast_ref::<PredictorError>(),
            Some(PredictorError::EmptyInput(_))
        ));
        Ok(())
    }

    #[test]
    fn test_read_price_series_unparseable_price() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("bad.csv");
        fs::write(&path, "1,100.5\n2,abc\n3,101.5\n")?;

        let err = read_price_series(&path).expect_err("text price should fail");
        match err.downcast_ref::<PredictorError>() {
            Some(PredictorError::UnparseableValue { row, .. }) => assert_eq!(*row, 2),
            other => panic!("unexpected error: {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_read_price_series_single_column() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("one_col.csv");
        fs::write(&path, "100\n101\n")?;

        let err = read_price_series(&path).expect_err("single column should fail");
        assert!(matches!(
            err.downcast_ref::<PredictorError>(),
            Some(PredictorError::MissingPriceColumn(_))
        ));
        Ok(())
    }

    #[test]
    fn test_read_numeric_rows_checks_width() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("rows.csv");
        fs::write(&path, "0.1,0.2,0.3\n0.2,0.3,0.4\n")?;

        let rows = read_numeric_rows(&path, 3)?;
        assert_eq!(rows, vec![vec![0.1, 0.2, 0.3], vec![0.2, 0.3, 0.4]]);

        let err = read_numeric_rows(&path, 4).expect_err("width mismatch should fail");
        assert!(matches!(
            err.downcast_ref::<PredictorError>(),
            Some(PredictorError::RowWidthMismatch { expected: 4, found: 3 })
        ));
        Ok(())
    }
}
