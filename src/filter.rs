//! Minimum-area filter.
//!
//! Dense but tiny clusters are nearly always a machine parked or idling, not a
//! worked field.

use log::{debug, info, warn};
use crate::field::Field;

/// Fields split by the area threshold, each list in input order.
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    pub retained: Vec<Field>,
    pub discarded: Vec<Field>,
}

/// Keep fields whose area (in the run's unit) is at least `min_area`.
///
/// A zero-area field survives only a threshold of zero or less. A field whose
/// area is undefined cannot be shown to meet any threshold and is discarded.
pub fn filter_fields(fields: Vec<Field>, min_area: f64) -> FilterOutcome {
    let (retained, discarded): (Vec<Field>, Vec<Field>) = fields
        .into_iter()
        .partition(|f| f.area.is_some_and(|area| area >= min_area));

    for f in &discarded {
        match f.area {
            Some(area) => debug!("[Filter] Dropping field {} ({:.2} < {:.2})", f.id, area, min_area),
            None => warn!("[Filter] Dropping field {}: area undefined", f.id),
        }
    }
    info!("[Filter] Kept {} fields, dropped {}", retained.len(), discarded.len());

    FilterOutcome { retained, discarded }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GpsPoint, Sample};

    fn field(id: u32, area: f64) -> Field {
        let s = Sample::new(18.52, 73.85, 0);
        Field {
            id,
            members: vec![s],
            hull: vec![s.point()],
            area_m2: Some(area * 101.17),
            area: Some(area),
            centroid: GpsPoint::new(18.52, 73.85),
            start_time: 0,
            end_time: 0,
            dwell_minutes: 0.0,
            degenerate: area == 0.0,
        }
    }

    fn ids(fields: &[Field]) -> Vec<u32> {
        fields.iter().map(|f| f.id).collect()
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let out = filter_fields(vec![field(0, 4.99), field(1, 5.0), field(2, 12.0)], 5.0);
        assert_eq!(ids(&out.retained), vec![1, 2]);
        assert_eq!(ids(&out.discarded), vec![0]);
    }

    #[test]
    fn test_order_preserved() {
        let fields = vec![field(3, 9.0), field(0, 1.0), field(5, 7.0), field(1, 20.0)];
        let out = filter_fields(fields, 5.0);
        assert_eq!(ids(&out.retained), vec![3, 5, 1]);
    }

    #[test]
    fn test_zero_area_dropped_for_any_positive_threshold() {
        for threshold in [1e-12, 0.5, 5.0, 1e6] {
            let out = filter_fields(vec![field(0, 0.0)], threshold);
            assert!(out.retained.is_empty());
        }
    }

    #[test]
    fn test_undefined_area_is_discarded() {
        let mut unknown = field(7, 50.0);
        unknown.area_m2 = None;
        unknown.area = None;
        for threshold in [f64::NEG_INFINITY, 0.0, 5.0] {
            let out = filter_fields(vec![field(0, 9.0), unknown.clone()], threshold);
            assert_eq!(ids(&out.retained), vec![0]);
            assert_eq!(ids(&out.discarded), vec![7]);
        }
    }

    #[test]
    fn test_raising_threshold_never_keeps_more() {
        let fields: Vec<Field> = (0..20).map(|i| field(i, (i * 7 % 13) as f64)).collect();
        let mut previous = usize::MAX;
        for threshold in [0.0, 1.0, 3.0, 5.0, 8.0, 12.0, 13.0] {
            let out = filter_fields(fields.clone(), threshold);
            assert_eq!(out.retained.len() + out.discarded.len(), fields.len());
            assert!(out.retained.len() <= previous);
            assert!(out.retained.iter().all(|f| fields.contains(f)));
            previous = out.retained.len();
        }
    }
}
