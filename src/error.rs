use thiserror::Error;

/// Errors raised by the tuning pipeline
///
/// Nothing is retried: every failure is propagated to the caller unchanged,
/// and one failing grid cell aborts the whole sweep.
#[derive(Debug, Error)]
pub enum TuneError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("need at least two graphs to compute a distance, got {0}")]
    TooFewGraphs(usize),

    #[error("dataset has no rows")]
    EmptyDataset,

    #[error("could not parse {value:?} in row {row}, column {column} as a number")]
    Parse {
        row: usize,
        column: usize,
        value: String,
    },

    #[error("shape mismatch: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("linear algebra failure: {0}")]
    Linalg(#[from] ndarray_linalg::error::LinalgError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TuneError>;
