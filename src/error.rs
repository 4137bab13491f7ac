use thiserror::Error;

#[derive(Debug, Error)]
pub enum StabiloError {
    #[error("Invalid matrix: {0}")]
    InvalidMatrix(String),

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Invalid parameter: {name} = {value} (expected {expected})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StabiloError>;
