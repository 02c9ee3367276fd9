use csv::ReaderBuilder;
use log::info;
use ndarray::{Array2, ArrayView2, Axis};
use std::path::Path;

use crate::error::{Result, TuneError};

/// Numeric table: rows are samples, columns are features
#[derive(Debug, Clone)]
pub struct Dataset {
    values: Array2<f64>,
    columns: Vec<String>,
}

impl Dataset {
    /// Wrap an existing matrix. Columns get positional names (`x0`, `x1`, ...).
    pub fn new(values: Array2<f64>) -> Self {
        let columns = (0..values.ncols()).map(|j| format!("x{}", j)).collect();
        Self { values, columns }
    }

    pub fn with_columns(values: Array2<f64>, columns: Vec<String>) -> Result<Self> {
        if columns.len() != values.ncols() {
            return Err(TuneError::InvalidParameter(format!(
                "{} column names for {} columns",
                columns.len(),
                values.ncols()
            )));
        }
        Ok(Self { values, columns })
    }

    /// Load a CSV file with a header row. Every field has to parse as `f64`.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let n_cols = columns.len();

        let mut flat = Vec::new();
        let mut n_rows = 0;
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            for (column, field) in record.iter().enumerate() {
                let value = field.parse::<f64>().map_err(|_| TuneError::Parse {
                    row,
                    column,
                    value: field.to_string(),
                })?;
                flat.push(value);
            }
            n_rows += 1;
        }

        if n_rows == 0 {
            return Err(TuneError::EmptyDataset);
        }

        let values = Array2::from_shape_vec((n_rows, n_cols), flat)?;
        info!(
            "Loaded {} rows x {} columns from {}",
            n_rows,
            n_cols,
            path.display()
        );

        Self::with_columns(values, columns)
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Copy out the given rows, in the given order
    pub fn select_rows(&self, rows: &[usize]) -> Array2<f64> {
        self.values.select(Axis(0), rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::io::Write;

    #[test]
    fn csv_round_trip_keeps_header_and_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "a, b,c").unwrap();
        writeln!(file, "1.0,2.0,3.0").unwrap();
        writeln!(file, "4.5,-1,0").unwrap();

        let ds = Dataset::from_csv(file.path()).unwrap();
        assert_eq!(ds.columns(), &["a", "b", "c"]);
        assert_eq!(ds.nrows(), 2);
        assert_eq!(ds.view()[[1, 0]], 4.5);
        assert_eq!(ds.view()[[1, 1]], -1.0);
    }

    #[test]
    fn csv_with_text_reports_position() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "a,b").unwrap();
        writeln!(file, "1,2").unwrap();
        writeln!(file, "3,abc").unwrap();

        match Dataset::from_csv(file.path()) {
            Err(TuneError::Parse { row, column, value }) => {
                assert_eq!((row, column), (1, 1));
                assert_eq!(value, "abc");
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn header_only_csv_is_empty() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "a,b").unwrap();
        assert!(matches!(
            Dataset::from_csv(file.path()),
            Err(TuneError::EmptyDataset)
        ));
    }

    #[test]
    fn select_rows_follows_index_order() {
        let ds = Dataset::new(array![[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]);
        let picked = ds.select_rows(&[2, 0]);
        assert_eq!(picked, array![[2.0, 2.0], [0.0, 0.0]]);
        assert_eq!(ds.columns(), &["x0", "x1"]);
    }
}
