//! Errors at the crate's I/O edges.
//!
//! The detection pipeline itself is infallible; only reading samples and writing
//! reports can fail.

/// Failure to read samples from tabular input.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The CSV could not be read or parsed as records.
    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    /// The input file could not be opened.
    #[error("failed to open input: {0}")]
    Io(#[from] std::io::Error),

    /// A required column is not in the header row.
    #[error("missing required column `{0}`")]
    MissingColumn(String),
}

/// Failure to render an itinerary.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("report is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// A field timestamp is outside the representable date range.
    #[error("timestamp {0} cannot be represented as a date")]
    InvalidTimestamp(i64),
}
