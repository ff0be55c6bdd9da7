//! Flat tabular view of an itinerary.
//!
//! One row per retained field:
//!
//! | Column | Content |
//! |--------|---------|
//! | Field ID | cluster id |
//! | Area (*unit*) | hull area in the itinerary's unit; blank if undefined |
//! | Time (Minutes) | dwell time |
//! | Start Date / End Date | first / last sample, `YYYY-MM-DD HH:MM:SS` UTC |
//! | Travel Distance to Next Field (km) | centroid to centroid; blank on the last row |
//! | Travel Time to Next Field (minutes) | blank on the last row |

use std::io::Write;

use chrono::DateTime;
use csv::WriterBuilder;
use serde::Serialize;
use crate::error::ReportError;
use crate::itinerary::Itinerary;
use crate::units::AreaUnit;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One table row. `None` values (an undefined area, the last row's travel)
/// serialize as empty cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItineraryRow {
    pub field_id: u32,
    pub area: Option<f64>,
    pub dwell_minutes: f64,
    pub start_date: String,
    pub end_date: String,
    pub travel_distance_km: Option<f64>,
    pub travel_time_minutes: Option<f64>,
}

/// Column headers for an itinerary in `unit`.
pub fn headers(unit: AreaUnit) -> [String; 7] {
    [
        "Field ID".to_string(),
        format!("Area ({})", unit.label()),
        "Time (Minutes)".to_string(),
        "Start Date".to_string(),
        "End Date".to_string(),
        "Travel Distance to Next Field (km)".to_string(),
        "Travel Time to Next Field (minutes)".to_string(),
    ]
}

/// Format Unix seconds as a UTC date-time.
pub fn format_timestamp(secs: i64) -> Result<String, ReportError> {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.format(DATE_FORMAT).to_string())
        .ok_or(ReportError::InvalidTimestamp(secs))
}

/// Table rows in itinerary order.
pub fn itinerary_rows(itinerary: &Itinerary) -> Result<Vec<ItineraryRow>, ReportError> {
    itinerary
        .stops
        .iter()
        .map(|stop| {
            Ok(ItineraryRow {
                field_id: stop.field.id,
                area: stop.field.area,
                dwell_minutes: stop.field.dwell_minutes,
                start_date: format_timestamp(stop.field.start_time)?,
                end_date: format_timestamp(stop.field.end_time)?,
                travel_distance_km: stop.next.map(|leg| leg.distance_km),
                travel_time_minutes: stop.next.map(|leg| leg.time_minutes),
            })
        })
        .collect()
}

/// Write the itinerary as CSV with a header row.
pub fn write_itinerary_csv<W: Write>(itinerary: &Itinerary, writer: W) -> Result<(), ReportError> {
    let rows = itinerary_rows(itinerary)?;

    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(headers(itinerary.area_unit))?;
    for row in &rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Render the itinerary as CSV text.
///
/// # Example
/// ```
/// use field_tracker::{itinerary_csv_string, build_itinerary, AreaUnit, FieldOrder};
///
/// let empty = build_itinerary(Vec::new(), FieldOrder::ClusterId, AreaUnit::Guntha);
/// let csv = itinerary_csv_string(&empty).unwrap();
/// assert!(csv.starts_with("Field ID,Area (Gunthas),Time (Minutes)"));
/// ```
pub fn itinerary_csv_string(itinerary: &Itinerary) -> Result<String, ReportError> {
    let mut buf = Vec::new();
    write_itinerary_csv(itinerary, &mut buf)?;
    Ok(String::from_utf8(buf)?)
}
