// Error type shared by cleaning, loading and reporting.
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while cleaning and aggregating the market datasets.
///
/// Unmapped markets or industries and empty aggregation groups are not
/// represented here: they degrade to fallback labels or absent groups.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input file not found: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("{dataset}: required column `{column}` not present")]
    MissingColumn { dataset: String, column: String },

    #[error("{dataset}: invalid date component at row {row}: {detail}")]
    InvalidDateComponent {
        dataset: String,
        row: usize,
        detail: String,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
