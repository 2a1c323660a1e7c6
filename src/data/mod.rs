//! Dataset loading and column conventions for the diabetes table.
//!
//! The table follows the Pima layout: eight numeric feature columns
//! followed by a binary `Outcome` label. The label is taken positionally
//! (last column), so renamed tables with the same shape still work.

use std::path::Path;

use ndarray::{Array1, Array2};
use polars::prelude::*;

use crate::error::{DiabevalError, Result};

/// Feature columns where a literal 0 encodes a missing measurement.
pub const SENTINEL_COLUMNS: [&str; 5] = [
    "Glucose",
    "BloodPressure",
    "SkinThickness",
    "Insulin",
    "BMI",
];

/// Default dataset location, overridable via config.
pub const DEFAULT_DATA_PATH: &str = "diabetes.csv";

/// Loads a CSV dataset with a header row.
pub fn load_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    let df = CsvReadOptions::default()
        .with_infer_schema_length(Some(1000))
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    if df.height() == 0 {
        return Err(DiabevalError::DataError(format!(
            "{} contains no rows",
            path.display()
        )));
    }

    Ok(df)
}

/// Extracts one column as contiguous f64 values, casting if needed.
pub fn column_to_f64(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let series = df
        .column(name)
        .map_err(|_| DiabevalError::DataError(format!("column not found: {}", name)))?;
    let series_f64 = series
        .cast(&DataType::Float64)
        .map_err(|e| DiabevalError::DataError(e.to_string()))?;
    let values: Vec<f64> = series_f64
        .f64()
        .map_err(|e| DiabevalError::DataError(e.to_string()))?
        .into_iter()
        .map(|v| v.unwrap_or(0.0))
        .collect();
    Ok(values)
}

/// Extracts named columns into a row-major Array2<f64>.
pub fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|name| column_to_f64(df, name))
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| col_refs[c][r]))
}

/// Splits a table into its feature matrix, label vector, and feature names.
///
/// The label column is the last one by position; everything before it is a
/// feature.
pub fn split_features_labels(df: &DataFrame) -> Result<(Array2<f64>, Array1<f64>, Vec<String>)> {
    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();

    if names.len() < 2 {
        return Err(DiabevalError::DataError(
            "dataset needs at least one feature column and a label column".to_string(),
        ));
    }

    let label_name = names[names.len() - 1].clone();
    let feature_names: Vec<String> = names[..names.len() - 1].to_vec();

    let x = columns_to_array2(df, &feature_names)?;
    let y = Array1::from_vec(column_to_f64(df, &label_name)?);

    Ok((x, y, feature_names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_csv() {
        let file = write_csv("a,b,Outcome\n1,2,0\n3,4,1\n");
        let df = load_csv(file.path()).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 3);
    }

    #[test]
    fn test_load_empty_csv_rejected() {
        let file = write_csv("a,b,Outcome\n");
        assert!(load_csv(file.path()).is_err());
    }

    #[test]
    fn test_split_features_labels() {
        let df = df! {
            "a" => [1.0, 3.0],
            "b" => [2.0, 4.0],
            "Outcome" => [0i64, 1],
        }
        .unwrap();

        let (x, y, names) = split_features_labels(&df).unwrap();
        assert_eq!(x.shape(), &[2, 2]);
        assert_eq!(x[[1, 0]], 3.0);
        assert_eq!(y.to_vec(), vec![0.0, 1.0]);
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_label_is_last_column_by_position() {
        let df = df! {
            "Outcome" => [9.0, 9.0],
            "b" => [2.0, 4.0],
            "last" => [0i64, 1],
        }
        .unwrap();

        let (x, y, _) = split_features_labels(&df).unwrap();
        assert_eq!(x[[0, 0]], 9.0);
        assert_eq!(y.to_vec(), vec![0.0, 1.0]);
    }
}
