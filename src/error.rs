use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("no data in input file: {}", .0.display())]
    EmptyInput(PathBuf),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("spreadsheet parse error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("malformed input: {0}")]
    Shape(String),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
