//! Error types for spreadsheet conversion.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop a conversion before any output is written.
///
/// Per-record problems (an unparseable coordinate, an unknown expedition)
/// are not errors: they are logged, counted in the report, and the record
/// falls back to a default.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DataError {
    /// The source spreadsheet does not exist.
    #[error("source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// A column the converter cannot work without is absent from the header row.
    #[error("column '{column}' not found in header row (detected headers: {})", .headers.join(", "))]
    MissingColumn {
        /// The required column name.
        column: String,
        /// Header names as detected after trimming.
        headers: Vec<String>,
    },

    /// The file has no header row at all.
    #[error("{} has no header row", .0.display())]
    MissingHeader(PathBuf),

    /// Reading or writing a file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The file being read or written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The delimited reader rejected the input.
    #[error("failed to read delimited records: {0}")]
    Csv(#[from] csv::Error),

    /// Serializing the output array failed.
    #[error("failed to serialize JSON output: {0}")]
    Json(#[from] serde_json::Error),
}
