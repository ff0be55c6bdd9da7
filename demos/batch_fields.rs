//! Example of detecting fields for many machines at once.
//!
//! Run with: cargo run --example batch_fields --features parallel

use field_tracker::{detect_fields_batch, FieldConfig, Sample};
use std::time::Instant;

fn main() {
    println!("Batch Field Detection Example\n");

    // Each machine works a few fields in a row, spread around a village
    let runs: Vec<Vec<Sample>> = (0..32)
        .map(|machine| {
            let base_lat = 18.50 + machine as f64 * 0.01;
            let mut samples = Vec::new();
            for field in 0..4 {
                samples.extend(patch(
                    base_lat + field as f64 * 0.002,
                    73.80 + field as f64 * 0.002,
                    12,
                    1_722_490_000 + field as i64 * 10_000,
                ));
            }
            samples
        })
        .collect();

    let total: usize = runs.iter().map(Vec::len).sum();
    println!("Created {} runs with {} samples\n", runs.len(), total);

    let config = FieldConfig::default();

    let start = Instant::now();
    let detections = detect_fields_batch(&runs, &config);
    let elapsed = start.elapsed();

    println!("Detection completed in {:?}\n", elapsed);

    for (machine, detection) in detections.iter().enumerate().take(4) {
        let area: f64 = detection.itinerary.stops.iter().filter_map(|s| s.field.area).sum();
        println!(
            "Machine {}: {} fields, {:.1} {}, {:.2} km between fields",
            machine,
            detection.itinerary.len(),
            area,
            detection.itinerary.area_unit.label(),
            detection.itinerary.total_travel_km()
        );
    }
    println!("...");

    let fields: usize = detections.iter().map(|d| d.itinerary.len()).sum();
    println!("\nTotal: {} fields across {} machines", fields, detections.len());
}

fn patch(lat: f64, lng: f64, side: usize, t0: i64) -> Vec<Sample> {
    (0..side * side)
        .map(|i| {
            Sample::new(
                lat + (i / side) as f64 * 0.00003,
                lng + (i % side) as f64 * 0.00003,
                t0 + i as i64 * 30,
            )
        })
        .collect()
}
