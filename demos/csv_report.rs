//! Read samples from a CSV file and print the field itinerary as CSV.
//!
//! Run with: cargo run --example csv_report -- samples.csv [itinerary.csv]
//!
//! The input needs `lat`, `lng` and `Timestamp` columns, timestamps formatted
//! like `01-08-2024 09.30`. Without an output path the report goes to stdout.

use std::fs::File;
use std::io;
use std::process::ExitCode;

use field_tracker::{detect_fields, read_samples_from_path, write_itinerary_csv, FieldConfig, IngestConfig};

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let Some(input) = args.next() else {
        eprintln!("usage: csv_report <samples.csv> [itinerary.csv]");
        return ExitCode::FAILURE;
    };

    let outcome = match read_samples_from_path(&input, &IngestConfig::default()) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("{}: {}", input, e);
            return ExitCode::FAILURE;
        }
    };
    eprintln!("Read {} samples ({} rows dropped)", outcome.samples.len(), outcome.dropped_rows);

    let detection = detect_fields(&outcome.samples, &FieldConfig::default());
    eprintln!(
        "{} fields kept, {} below the minimum area",
        detection.itinerary.len(),
        detection.discarded.len()
    );

    let written = match args.next() {
        Some(path) => File::create(&path)
            .map_err(Into::into)
            .and_then(|file| write_itinerary_csv(&detection.itinerary, file)),
        None => write_itinerary_csv(&detection.itinerary, io::stdout().lock()),
    };

    match written {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("failed to write report: {}", e);
            ExitCode::FAILURE
        }
    }
}
