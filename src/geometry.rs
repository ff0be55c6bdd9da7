//! Field footprint geometry: convex hull, projected area and center of mass.
//!
//! The hull is built on (lng, lat) coordinates, then only its vertices are
//! projected and measured with the shoelace formula. The centroid is the mean of
//! all member samples, not the centroid of the hull polygon.
//!
//! Members of a field straddling the ±180° meridian are unwrapped to contiguous
//! longitudes before any of this; the reported hull and centroid are wrapped back.
//!
//! Two outcomes without a positive area are kept apart:
//! - *degenerate* (fewer than three distinct members, or collinear ones): the area
//!   is known to be zero, `area_m2 == Some(0.0)`
//! - *undefined* (the projector refused the hull): the area is unknown,
//!   `area_m2 == None`

use geo::{ConvexHull, Coord, MultiPoint, Point, Polygon};
use crate::geo_utils::{compute_bounds, compute_center, distinct_points, unwrap_longitudes, wrap_longitude};
use crate::projection::Projector;
use crate::GpsPoint;

/// Hull area, relative to the bounding box in degree space, below which a hull is
/// treated as a line.
const COLLINEAR_TOLERANCE: f64 = 1e-9;

/// Derived geometry of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldGeometry {
    /// Hull vertices as an open ring, or the distinct member points when no polygon exists
    pub hull: Vec<GpsPoint>,
    /// Projected hull area in square meters: `Some(0.0)` when `degenerate`,
    /// `None` when the projector could not place the hull
    pub area_m2: Option<f64>,
    /// Arithmetic mean of all member coordinates
    pub centroid: GpsPoint,
    /// True when no polygon could be formed
    pub degenerate: bool,
}

/// Convex hull of `points` as an open ring in counter-clockwise order.
///
/// Fewer than three points are returned as they are, repeats included. Three or
/// more points with fewer than three distinct positions give those positions.
pub fn convex_hull(points: &[GpsPoint]) -> Vec<GpsPoint> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let distinct = distinct_points(points);
    if distinct.len() < 3 {
        return distinct;
    }

    let multi = MultiPoint::new(
        distinct
            .iter()
            .map(|p| Point::new(p.longitude, p.latitude))
            .collect(),
    );
    let hull: Polygon = multi.convex_hull();

    let mut ring: Vec<GpsPoint> = hull
        .exterior()
        .coords()
        .map(|c| GpsPoint::new(c.y, c.x))
        .collect();
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}

/// Absolute shoelace area of an open ring.
///
/// Coordinates are taken relative to the first vertex so that large offsets
/// (UTM northings, raw longitudes) do not swamp thin polygons.
pub fn shoelace_area(ring: &[Coord]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let origin = ring[0];
    let twice_area: f64 = (0..ring.len())
        .map(|i| {
            let a = ring[i] - origin;
            let b = ring[(i + 1) % ring.len()] - origin;
            a.x * b.y - b.x * a.y
        })
        .sum();
    twice_area.abs() / 2.0
}

/// Shoelace area of a ring in raw degree units.
fn degree_area(ring: &[GpsPoint]) -> f64 {
    let coords: Vec<Coord> = ring.iter().map(|p| Coord { x: p.longitude, y: p.latitude }).collect();
    shoelace_area(&coords)
}

fn is_collinear(ring: &[GpsPoint]) -> bool {
    if ring.len() < 3 {
        return true;
    }
    let b = compute_bounds(ring);
    let box_area = (b.max_lat - b.min_lat) * (b.max_lng - b.min_lng);
    box_area <= 0.0 || degree_area(ring) <= COLLINEAR_TOLERANCE * box_area
}

/// Compute hull, area and centroid for a field's members.
///
/// Never fails on degenerate input: fewer than three distinct members or collinear
/// members give `area_m2 == Some(0.0)` with `degenerate` set. A projector that
/// returns undefined gives `area_m2 == None`. Returns `None` only for an empty
/// member list.
///
/// # Example
/// ```
/// use field_tracker::GpsPoint;
/// use field_tracker::geometry::field_geometry;
/// use field_tracker::projection::EqualAreaProjector;
///
/// let members = vec![
///     GpsPoint::new(18.5200, 73.8500),
///     GpsPoint::new(18.5200, 73.8510),
///     GpsPoint::new(18.5210, 73.8510),
///     GpsPoint::new(18.5210, 73.8500),
/// ];
/// let geometry = field_geometry(&members, &EqualAreaProjector::new()).unwrap();
/// assert!(!geometry.degenerate);
/// let area = geometry.area_m2.unwrap();
/// assert!(area > 11_000.0 && area < 12_000.0);
/// ```
pub fn field_geometry<P: Projector + ?Sized>(members: &[GpsPoint], projector: &P) -> Option<FieldGeometry> {
    let unwrapped = unwrap_longitudes(members);
    let center = compute_center(&unwrapped)?;
    let centroid = GpsPoint::new(center.latitude, wrap_longitude(center.longitude));
    let ring = convex_hull(&unwrapped);
    let hull: Vec<GpsPoint> = ring
        .iter()
        .map(|p| GpsPoint::new(p.latitude, wrap_longitude(p.longitude)))
        .collect();

    if is_collinear(&ring) {
        return Some(FieldGeometry { hull, area_m2: Some(0.0), centroid, degenerate: true });
    }

    let area_m2 = projector.project(&ring).map(|coords| shoelace_area(&coords));
    Some(FieldGeometry { hull, area_m2, centroid, degenerate: false })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::{EqualAreaProjector, Projection};

    const M_PER_DEG_LAT: f64 = 110_574.0;

    fn offset(origin: GpsPoint, east_m: f64, north_m: f64) -> GpsPoint {
        let lng_m = 111_320.0 * origin.latitude.to_radians().cos();
        GpsPoint::new(origin.latitude + north_m / M_PER_DEG_LAT, origin.longitude + east_m / lng_m)
    }

    #[test]
    fn test_square_area() {
        let o = GpsPoint::new(0.5, 73.85);
        let members: Vec<GpsPoint> = [(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0), (50.0, 50.0)]
            .iter()
            .map(|&(e, n)| offset(o, e, n))
            .collect();
        let g = field_geometry(&members, &EqualAreaProjector::new()).unwrap();
        assert!(!g.degenerate);
        assert_eq!(g.hull.len(), 4);
        let area = g.area_m2.unwrap();
        assert!((area - 10_000.0).abs() < 50.0, "area {}", area);
    }

    #[test]
    fn test_centroid_is_member_mean() {
        // Three points in one corner pull the mean away from the hull center
        let o = GpsPoint::new(18.52, 73.85);
        let members: Vec<GpsPoint> = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (100.0, 0.0), (0.0, 100.0)]
            .iter()
            .map(|&(e, n)| offset(o, e, n))
            .collect();
        let g = field_geometry(&members, &Projection::Utm).unwrap();
        let mean = compute_center(&members).unwrap();
        assert_eq!(g.centroid, mean);
        let area = g.area_m2.unwrap();
        assert!((area - 5_000.0).abs() < 50.0, "area {}", area);
    }

    #[test]
    fn test_two_members_have_no_area() {
        let members = vec![GpsPoint::new(18.52, 73.85), GpsPoint::new(18.53, 73.86)];
        let g = field_geometry(&members, &EqualAreaProjector::new()).unwrap();
        assert!(g.degenerate);
        assert_eq!(g.area_m2, Some(0.0));
        assert_eq!(g.hull, members);
        assert!((g.centroid.latitude - 18.525).abs() < 1e-9);
    }

    #[test]
    fn test_two_identical_members_stay_two_hull_points() {
        let p = GpsPoint::new(18.52, 73.85);
        let g = field_geometry(&[p, p], &EqualAreaProjector::new()).unwrap();
        assert!(g.degenerate);
        assert_eq!(g.hull, vec![p, p]);
    }

    #[test]
    fn test_collinear_members_have_no_area() {
        let members: Vec<GpsPoint> = (0..10).map(|i| GpsPoint::new(18.52 + i as f64 * 0.0001, 73.85)).collect();
        let g = field_geometry(&members, &EqualAreaProjector::new()).unwrap();
        assert!(g.degenerate);
        assert_eq!(g.area_m2, Some(0.0));

        let diagonal: Vec<GpsPoint> = (0..10)
            .map(|i| GpsPoint::new(18.52 + i as f64 * 0.0001, 73.85 + i as f64 * 0.0001))
            .collect();
        let g = field_geometry(&diagonal, &EqualAreaProjector::new()).unwrap();
        assert!(g.degenerate);
        assert_eq!(g.area_m2, Some(0.0));
    }

    #[test]
    fn test_repeated_points_are_one_point() {
        let p = GpsPoint::new(18.52, 73.85);
        let g = field_geometry(&[p, p, p, p, p], &EqualAreaProjector::new()).unwrap();
        assert!(g.degenerate);
        assert_eq!(g.hull, vec![p]);
        assert_eq!(g.centroid, p);
    }

    #[test]
    fn test_undefined_projection_is_not_zero_area() {
        struct Refuses;
        impl Projector for Refuses {
            fn project(&self, _points: &[GpsPoint]) -> Option<Vec<Coord>> {
                None
            }
        }
        let o = GpsPoint::new(18.52, 73.85);
        let members = vec![o, offset(o, 50.0, 0.0), offset(o, 0.0, 50.0)];
        let g = field_geometry(&members, &Refuses).unwrap();
        assert!(!g.degenerate);
        assert_eq!(g.area_m2, None);
    }

    #[test]
    fn test_field_near_pole_has_undefined_area() {
        // The equal-area projection refuses centers this close to the pole
        let members: Vec<GpsPoint> = (0..144)
            .map(|i| GpsPoint::new(89.5 + (i / 12) as f64 * 0.0003, 10.0 + (i % 12) as f64 * 0.0003))
            .collect();
        let g = field_geometry(&members, &EqualAreaProjector::new()).unwrap();
        assert!(!g.degenerate);
        assert_eq!(g.area_m2, None);

        let line: Vec<GpsPoint> = (0..12).map(|i| GpsPoint::new(89.5 + i as f64 * 0.0003, 10.0)).collect();
        let g = field_geometry(&line, &EqualAreaProjector::new()).unwrap();
        assert!(g.degenerate);
        assert_eq!(g.area_m2, Some(0.0));
    }

    #[test]
    fn test_field_across_meridian() {
        // Same 100 m square, once in ordinary longitudes and once straddling ±180
        let square = |o: GpsPoint| -> Vec<GpsPoint> {
            [(-50.0, -50.0), (50.0, -50.0), (50.0, 50.0), (-50.0, 50.0), (10.0, 0.0)]
                .iter()
                .map(|&(e, n)| offset(o, e, n))
                .map(|p| GpsPoint::new(p.latitude, wrap_longitude(p.longitude)))
                .collect()
        };
        let straddling = square(GpsPoint::new(-17.0, 180.0));
        assert!(straddling.iter().any(|p| p.longitude < 0.0));
        let ordinary = square(GpsPoint::new(-17.0, 100.0));

        let g = field_geometry(&straddling, &EqualAreaProjector::new()).unwrap();
        let reference = field_geometry(&ordinary, &EqualAreaProjector::new()).unwrap();

        assert!(!g.degenerate);
        assert_eq!(g.hull.len(), 4);
        assert!(g.hull.iter().all(|p| p.longitude.abs() <= 180.0));
        let (area, expected) = (g.area_m2.unwrap(), reference.area_m2.unwrap());
        assert!((area - expected).abs() / expected < 1e-6, "{} vs {}", area, expected);
        // Mean sits 2 m east of the meridian
        assert!(g.centroid.longitude < -179.9999 && g.centroid.longitude > -180.0);
    }

    #[test]
    fn test_shoelace_unit_square() {
        let ring = [
            Coord { x: 500_000.0, y: 2_000_000.0 },
            Coord { x: 500_001.0, y: 2_000_000.0 },
            Coord { x: 500_001.0, y: 2_000_001.0 },
            Coord { x: 500_000.0, y: 2_000_001.0 },
        ];
        assert!((shoelace_area(&ring) - 1.0).abs() < 1e-9);
        let mut clockwise = ring;
        clockwise.reverse();
        assert!((shoelace_area(&clockwise) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_members() {
        assert!(field_geometry(&[], &EqualAreaProjector::new()).is_none());
    }
}
