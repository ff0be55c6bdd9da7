//! Basic example of detecting fields from one machine's GPS samples.
//!
//! Run with: cargo run --example basic_fields

use field_tracker::{detect_fields, FieldConfig, PointClass, Sample};

/// Samples on a grid `rows` x `cols`, `step` degrees apart, one a minute.
fn worked_patch(lat: f64, lng: f64, rows: usize, cols: usize, step: f64, t0: i64) -> Vec<Sample> {
    (0..rows * cols)
        .map(|i| {
            Sample::new(
                lat + (i / cols) as f64 * step,
                lng + (i % cols) as f64 * step,
                t0 + i as i64 * 60,
            )
        })
        .collect()
}

fn main() {
    // A morning near Pune: two fields, a short stop at a gate, and the road between
    let mut samples = worked_patch(18.5200, 73.8500, 12, 12, 0.00003, 1_722_490_000);
    samples.extend(worked_patch(18.5230, 73.8540, 3, 4, 0.00001, 1_722_500_000));
    samples.push(Sample::new(18.5250, 73.8560, 1_722_500_900));
    samples.push(Sample::new(18.5280, 73.8590, 1_722_501_000));
    samples.extend(worked_patch(18.5310, 73.8620, 10, 15, 0.00003, 1_722_501_200));

    let config = FieldConfig::default();

    println!("Field Detection Example\n");
    println!(
        "Config: epsilon={} ({:?}), min_points={}, min_area={} {}\n",
        config.epsilon,
        config.metric,
        config.min_points,
        config.min_area,
        config.area_unit.label()
    );

    let detection = detect_fields(&samples, &config);

    let classes = detection.point_classes();
    let noise = classes.iter().filter(|c| **c == PointClass::Noise).count();
    println!("{} samples, {} noise\n", samples.len(), noise);

    for stop in &detection.itinerary.stops {
        let field = &stop.field;
        println!("Field {}:", field.id);
        println!("   Samples: {}", field.members.len());
        match (field.area, field.area_m2) {
            (Some(area), Some(area_m2)) => println!(
                "   Area: {:.2} {} ({:.0} m²)",
                area,
                detection.itinerary.area_unit.label(),
                area_m2
            ),
            _ => println!("   Area: undefined"),
        }
        println!("   Time: {:.0} min", field.dwell_minutes);
        match stop.next {
            Some(leg) => println!(
                "   Next: field {} in {:.2} km, {:.0} min\n",
                leg.to_field_id, leg.distance_km, leg.time_minutes
            ),
            None => println!("   Last field\n"),
        }
    }

    for field in &detection.discarded {
        match field.area {
            Some(area) => println!(
                "Discarded field {}: {:.2} {} is below the minimum",
                field.id,
                area,
                config.area_unit.label()
            ),
            None => println!("Discarded field {}: area undefined", field.id),
        }
    }
}
