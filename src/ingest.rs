//! CSV sample reader.
//!
//! Reads a latitude column, a longitude column and a timestamp column by header
//! name. Timestamps are parsed with one explicit format and taken as UTC; a row
//! whose timestamp or coordinates do not parse is dropped and counted, never
//! defaulted.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord};
use log::{info, warn};
use crate::error::IngestError;
use crate::Sample;

/// Where to find sample fields in the input.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestConfig {
    /// Default: "lat"
    pub latitude_column: String,
    /// Default: "lng"
    pub longitude_column: String,
    /// Default: "Timestamp"
    pub timestamp_column: String,
    /// `chrono` format string for the timestamp column.
    /// Default: "%d-%m-%Y %H.%M" (day first, dotted time)
    pub timestamp_format: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            latitude_column: "lat".to_string(),
            longitude_column: "lng".to_string(),
            timestamp_column: "Timestamp".to_string(),
            timestamp_format: "%d-%m-%Y %H.%M".to_string(),
        }
    }
}

/// Samples read, in file order, and how many rows were dropped.
#[derive(Debug, Clone, Default)]
pub struct IngestOutcome {
    pub samples: Vec<Sample>,
    pub dropped_rows: usize,
}

fn column(headers: &StringRecord, name: &str) -> Result<usize, IngestError> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| IngestError::MissingColumn(name.to_string()))
}

fn parse_row(
    record: &StringRecord,
    lat_col: usize,
    lng_col: usize,
    ts_col: usize,
    format: &str,
) -> Option<Sample> {
    let latitude: f64 = record.get(lat_col)?.trim().parse().ok()?;
    let longitude: f64 = record.get(lng_col)?.trim().parse().ok()?;
    let timestamp = NaiveDateTime::parse_from_str(record.get(ts_col)?.trim(), format)
        .ok()?
        .and_utc()
        .timestamp();
    Some(Sample::new(latitude, longitude, timestamp))
}

/// Read samples from CSV with a header row.
///
/// # Example
/// ```
/// use field_tracker::{read_samples, IngestConfig};
///
/// let data = "lat,lng,Timestamp\n18.52,73.85,01-08-2024 09.30\n18.52,73.85,not a time\n";
/// let outcome = read_samples(data.as_bytes(), &IngestConfig::default()).unwrap();
/// assert_eq!(outcome.samples.len(), 1);
/// assert_eq!(outcome.dropped_rows, 1);
/// ```
pub fn read_samples<R: Read>(reader: R, config: &IngestConfig) -> Result<IngestOutcome, IngestError> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let lat_col = column(&headers, &config.latitude_column)?;
    let lng_col = column(&headers, &config.longitude_column)?;
    let ts_col = column(&headers, &config.timestamp_column)?;

    let mut outcome = IngestOutcome::default();
    for record in rdr.records() {
        let record = record?;
        match parse_row(&record, lat_col, lng_col, ts_col, &config.timestamp_format) {
            Some(sample) => outcome.samples.push(sample),
            None => outcome.dropped_rows += 1,
        }
    }

    if outcome.dropped_rows > 0 {
        warn!(
            "[Ingest] Dropped {} rows with unparseable coordinates or timestamps",
            outcome.dropped_rows
        );
    }
    info!("[Ingest] Read {} samples", outcome.samples.len());

    Ok(outcome)
}

/// Read samples from a CSV file.
pub fn read_samples_from_path<P: AsRef<Path>>(path: P, config: &IngestConfig) -> Result<IngestOutcome, IngestError> {
    let file = File::open(path)?;
    read_samples(file, config)
}
