//! Fields built from a cluster assignment.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use crate::clustering::{ClusterAssignment, ClusterLabel};
use crate::geometry::field_geometry;
use crate::projection::Projector;
use crate::units::AreaUnit;
use crate::{GpsPoint, Sample};

/// A work area the machine visited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Field {
    /// Cluster id, unique within one detection run
    pub id: u32,
    /// Member samples in arrival order
    pub members: Vec<Sample>,
    /// Convex hull as an open ring. With fewer than three members these are the
    /// members themselves; otherwise repeated positions appear once
    pub hull: Vec<GpsPoint>,
    /// Hull area in square meters; `None` when the projection was undefined
    pub area_m2: Option<f64>,
    /// Hull area in the run's configured unit; `None` when `area_m2` is
    pub area: Option<f64>,
    /// Mean position of all members
    pub centroid: GpsPoint,
    /// Earliest member timestamp (Unix seconds)
    pub start_time: i64,
    /// Latest member timestamp (Unix seconds)
    pub end_time: i64,
    /// `end_time - start_time` in minutes
    pub dwell_minutes: f64,
    /// No polygon could be formed; `area_m2` is `Some(0.0)`
    pub degenerate: bool,
}

impl Field {
    /// Assemble a field from its members. Returns `None` for an empty member list.
    pub fn from_members<P: Projector + ?Sized>(
        id: u32,
        members: Vec<Sample>,
        projector: &P,
        unit: AreaUnit,
    ) -> Option<Self> {
        let points: Vec<GpsPoint> = members.iter().map(Sample::point).collect();
        let geometry = field_geometry(&points, projector)?;
        let start_time = members.iter().map(|s| s.timestamp).min()?;
        let end_time = members.iter().map(|s| s.timestamp).max()?;

        Some(Self {
            id,
            members,
            hull: geometry.hull,
            area_m2: geometry.area_m2,
            area: geometry.area_m2.map(|a| unit.from_square_meters(a)),
            centroid: geometry.centroid,
            start_time,
            end_time,
            dwell_minutes: minutes_between(start_time, end_time),
            degenerate: geometry.degenerate,
        })
    }
}

/// `to - from` in minutes, without overflowing on extreme timestamps.
pub(crate) fn minutes_between(from: i64, to: i64) -> f64 {
    (i128::from(to) - i128::from(from)) as f64 / 60.0
}

/// Build one [`Field`] per cluster id, ascending.
///
/// Noise samples are ignored. Each field keeps its members in input order.
pub fn build_fields<P: Projector + ?Sized>(
    samples: &[Sample],
    assignment: &ClusterAssignment,
    projector: &P,
    unit: AreaUnit,
) -> Vec<Field> {
    let mut groups: Vec<Vec<Sample>> = vec![Vec::new(); assignment.field_count as usize];
    for (sample, label) in samples.iter().zip(assignment.labels.iter()) {
        if let ClusterLabel::Field(id) = label {
            if let Some(group) = groups.get_mut(*id as usize) {
                group.push(*sample);
            }
        }
    }

    groups
        .into_iter()
        .enumerate()
        .filter_map(|(id, members)| {
            let field = Field::from_members(id as u32, members, projector, unit)?;
            match field.area_m2 {
                Some(area_m2) => debug!(
                    "[Fields] Field {}: {} samples, {:.1} m², {:.1} min{}",
                    field.id,
                    field.members.len(),
                    area_m2,
                    field.dwell_minutes,
                    if field.degenerate { " (degenerate)" } else { "" }
                ),
                None => warn!(
                    "[Fields] Field {}: {} samples, area undefined (projection refused the hull)",
                    field.id,
                    field.members.len()
                ),
            }
            Some(field)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::cluster_samples;
    use crate::metric::Metric;
    use crate::projection::Projection;

    #[test]
    fn test_members_keep_arrival_order() {
        // Samples arrive out of time order; members must not be re-sorted
        let times = [500, 100, 900, 300, 700, 200, 800, 400, 600, 0, 1000, 1100];
        let samples: Vec<Sample> = times
            .iter()
            .enumerate()
            .map(|(i, &t)| Sample::new(18.52 + (i % 4) as f64 * 0.00002, 73.85 + (i / 4) as f64 * 0.00002, t))
            .collect();
        let assignment = cluster_samples(&samples, 9.0, 11, &Metric::Haversine);
        let fields = build_fields(&samples, &assignment, &Projection::EqualArea, AreaUnit::Guntha);

        assert_eq!(fields.len(), 1);
        let f = &fields[0];
        assert_eq!(f.members, samples);
        assert_eq!(f.start_time, 0);
        assert_eq!(f.end_time, 1100);
        assert!((f.dwell_minutes - 1100.0 / 60.0).abs() < 1e-9);
        assert!((f.area.unwrap() - f.area_m2.unwrap() / 101.17).abs() < 1e-9);
    }

    #[test]
    fn test_noise_only_builds_nothing() {
        let samples = vec![Sample::new(18.52, 73.85, 0), Sample::new(18.60, 73.90, 60)];
        let assignment = cluster_samples(&samples, 9.0, 11, &Metric::Haversine);
        let fields = build_fields(&samples, &assignment, &Projection::EqualArea, AreaUnit::Guntha);
        assert!(fields.is_empty());
    }

    #[test]
    fn test_two_member_field() {
        let samples = vec![Sample::new(18.52, 73.85, 60), Sample::new(18.52001, 73.85, 0)];
        let f = Field::from_members(7, samples, &Projection::EqualArea, AreaUnit::Guntha).unwrap();
        assert_eq!(f.id, 7);
        assert!(f.degenerate);
        assert_eq!(f.area_m2, Some(0.0));
        assert_eq!(f.area, Some(0.0));
        assert_eq!(f.dwell_minutes, 1.0);
    }

    #[test]
    fn test_extreme_timestamps_do_not_overflow() {
        let samples = vec![
            Sample::new(18.52, 73.85, i64::MIN),
            Sample::new(18.52001, 73.85, i64::MAX),
            Sample::new(18.52, 73.85001, 0),
        ];
        let f = Field::from_members(0, samples, &Projection::EqualArea, AreaUnit::Guntha).unwrap();
        assert_eq!(f.start_time, i64::MIN);
        assert_eq!(f.end_time, i64::MAX);
        assert!((f.dwell_minutes - 2f64.powi(64) / 60.0).abs() / f.dwell_minutes < 1e-12);
        assert!(minutes_between(i64::MAX, i64::MIN) < 0.0);
    }

    #[test]
    fn test_polar_field_keeps_undefined_area() {
        let samples: Vec<Sample> = (0..16)
            .map(|i| Sample::new(89.6 + (i / 4) as f64 * 0.0003, 10.0 + (i % 4) as f64 * 0.0003, i))
            .collect();
        let f = Field::from_members(0, samples, &Projection::EqualArea, AreaUnit::Guntha).unwrap();
        assert!(!f.degenerate);
        assert_eq!(f.area_m2, None);
        assert_eq!(f.area, None);
    }

    #[test]
    fn test_empty_members() {
        assert!(Field::from_members(0, Vec::new(), &Projection::EqualArea, AreaUnit::Guntha).is_none());
    }
}
