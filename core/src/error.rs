use thiserror::Error;

#[derive(Error, Debug)]
pub enum PulseError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Column '{column}' not found (available: {available:?})")]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },

    #[error("Column '{column}' holds non-numeric values")]
    NotNumeric { column: String },

    #[error("Case study '{name}' not found")]
    UnknownCaseStudy { name: String },

    #[error("Invalid boundary file: {0}")]
    InvalidBoundaries(String),
}

pub type PulseResult<T> = Result<T, PulseError>;
