//! # Geodetic Projection
//!
//! Projects geographic coordinates of one small region onto a plane in meters, so
//! that shoelace areas and straight-line distances on the output approximate true
//! geodetic values.
//!
//! Two projectors are provided:
//!
//! | Projector | Properties |
//! |-----------|------------|
//! | [`EqualAreaProjector`] | Lambert azimuthal equal-area on the WGS84 ellipsoid, centered on the point set. Areas are exact up to floating point. |
//! | [`UtmProjector`] | Transverse Mercator with UTM constants (Krüger series to n³). Area scale error is below 0.2% inside a zone. |
//!
//! A projector refuses degenerate input (fewer than three distinct points) and
//! returns `None` instead of coordinates: a region with no extent has no meaningful
//! plane, and callers must not confuse that with a region of zero area.

use geo::Coord;
use serde::{Deserialize, Serialize};
use crate::geo_utils::{compute_center, distinct_points};
use crate::GpsPoint;

/// WGS84 semi-major axis in meters.
const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening.
const WGS84_F: f64 = 1.0 / 298.257_223_563;

const UTM_SCALE: f64 = 0.9996;
const UTM_FALSE_EASTING: f64 = 500_000.0;
const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// The azimuthal projection is singular when centered on a pole.
const MAX_CENTER_LATITUDE: f64 = 89.0;

/// Planar projection of a local point set.
pub trait Projector {
    /// Project `points` to planar (x, y) meters, or `None` when the set is degenerate.
    fn project(&self, points: &[GpsPoint]) -> Option<Vec<Coord>>;
}

/// True when a point set has no two-dimensional extent to project.
pub fn is_degenerate(points: &[GpsPoint]) -> bool {
    points.len() < 3 || distinct_points(points).len() < 3
}

fn finite_or_none(coords: Vec<Coord>) -> Option<Vec<Coord>> {
    if coords.iter().all(|c| c.x.is_finite() && c.y.is_finite()) {
        Some(coords)
    } else {
        None
    }
}

// =============================================================================
// Lambert Azimuthal Equal-Area
// =============================================================================

/// Ellipsoidal Lambert azimuthal equal-area projection.
///
/// Centered on the mean of the projected points unless a center is given.
/// Longitudes enter only through trigonometric functions, so points unwrapped past
/// ±180° project the same as their in-range equivalents.
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualAreaProjector {
    pub center: Option<GpsPoint>,
}

impl EqualAreaProjector {
    pub fn new() -> Self {
        Self { center: None }
    }

    pub fn centered_on(center: GpsPoint) -> Self {
        Self { center: Some(center) }
    }
}

/// Authalic latitude helper `q` (Snyder 3-12).
fn authalic_q(sin_phi: f64, e: f64) -> f64 {
    let e2 = e * e;
    let es = e * sin_phi;
    (1.0 - e2) * (sin_phi / (1.0 - es * es) - (1.0 / (2.0 * e)) * ((1.0 - es) / (1.0 + es)).ln())
}

impl Projector for EqualAreaProjector {
    fn project(&self, points: &[GpsPoint]) -> Option<Vec<Coord>> {
        if is_degenerate(points) {
            return None;
        }
        let center = match self.center {
            Some(c) => c,
            None => compute_center(points)?,
        };
        // Longitude may sit just past ±180 for fields unwrapped across the meridian
        if !center.latitude.is_finite()
            || !center.longitude.is_finite()
            || center.latitude.abs() > MAX_CENTER_LATITUDE
        {
            return None;
        }

        let e2 = WGS84_F * (2.0 - WGS84_F);
        let e = e2.sqrt();
        let qp = authalic_q(1.0, e);
        let rq = WGS84_A * (qp / 2.0).sqrt();

        let phi1 = center.latitude.to_radians();
        let lambda0 = center.longitude.to_radians();
        let beta1 = (authalic_q(phi1.sin(), e) / qp).clamp(-1.0, 1.0).asin();
        let m1 = phi1.cos() / (1.0 - e2 * phi1.sin().powi(2)).sqrt();
        let d = WGS84_A * m1 / (rq * beta1.cos());
        let (sin_b1, cos_b1) = beta1.sin_cos();

        let coords = points
            .iter()
            .map(|p| {
                let phi = p.latitude.to_radians();
                let dlambda = p.longitude.to_radians() - lambda0;
                let beta = (authalic_q(phi.sin(), e) / qp).clamp(-1.0, 1.0).asin();
                let (sin_b, cos_b) = beta.sin_cos();
                let b = rq * (2.0 / (1.0 + sin_b1 * sin_b + cos_b1 * cos_b * dlambda.cos())).sqrt();
                Coord {
                    x: b * d * cos_b * dlambda.sin(),
                    y: (b / d) * (cos_b1 * sin_b - sin_b1 * cos_b * dlambda.cos()),
                }
            })
            .collect();

        finite_or_none(coords)
    }
}

// =============================================================================
// Universal Transverse Mercator
// =============================================================================

/// A UTM zone: number 1-60 and hemisphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtmZone {
    pub number: u8,
    pub northern: bool,
}

impl UtmZone {
    /// The standard zone containing `point` (no Norway/Svalbard exceptions).
    pub fn containing(point: &GpsPoint) -> Self {
        let number = (((point.longitude + 180.0) / 6.0).floor() as i32 + 1).clamp(1, 60) as u8;
        Self { number, northern: point.latitude >= 0.0 }
    }

    /// Longitude of the zone's central meridian in degrees.
    pub fn central_meridian(&self) -> f64 {
        f64::from(self.number) * 6.0 - 183.0
    }
}

/// UTM projection in an explicit zone, or the zone containing the points' center.
#[derive(Debug, Clone, Copy, Default)]
pub struct UtmProjector {
    pub zone: Option<UtmZone>,
}

impl UtmProjector {
    pub fn auto() -> Self {
        Self { zone: None }
    }

    pub fn in_zone(zone: UtmZone) -> Self {
        Self { zone: Some(zone) }
    }

    /// Forward transverse Mercator for one point, returning (easting, northing).
    pub fn to_utm(point: &GpsPoint, zone: UtmZone) -> Coord {
        let n = WGS84_F / (2.0 - WGS84_F);
        let n2 = n * n;
        let n3 = n2 * n;
        let big_a = WGS84_A / (1.0 + n) * (1.0 + n2 / 4.0 + n2 * n2 / 64.0);
        let alpha = [
            n / 2.0 - 2.0 / 3.0 * n2 + 5.0 / 16.0 * n3,
            13.0 / 48.0 * n2 - 3.0 / 5.0 * n3,
            61.0 / 240.0 * n3,
        ];
        // First eccentricity expressed through n
        let e = 2.0 * n.sqrt() / (1.0 + n);

        let phi = point.latitude.to_radians();
        let dlambda = (point.longitude - zone.central_meridian()).to_radians();
        let sin_phi = phi.sin();
        let t = (sin_phi.atanh() - e * (e * sin_phi).atanh()).sinh();
        let xi = (t / dlambda.cos()).atan();
        let eta = (dlambda.sin() / (1.0 + t * t).sqrt()).atanh();

        let mut easting = eta;
        let mut northing = xi;
        for (j, a) in alpha.iter().enumerate() {
            let k = 2.0 * (j as f64 + 1.0);
            easting += a * (k * xi).cos() * (k * eta).sinh();
            northing += a * (k * xi).sin() * (k * eta).cosh();
        }

        let false_northing = if zone.northern { 0.0 } else { UTM_FALSE_NORTHING_SOUTH };
        Coord {
            x: UTM_FALSE_EASTING + UTM_SCALE * big_a * easting,
            y: false_northing + UTM_SCALE * big_a * northing,
        }
    }
}

impl Projector for UtmProjector {
    fn project(&self, points: &[GpsPoint]) -> Option<Vec<Coord>> {
        if is_degenerate(points) {
            return None;
        }
        let zone = match self.zone {
            Some(z) => z,
            None => UtmZone::containing(&compute_center(points)?),
        };
        finite_or_none(points.iter().map(|p| Self::to_utm(p, zone)).collect())
    }
}

// =============================================================================
// Configuration Selector
// =============================================================================

/// Projection selection carried in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum Projection {
    /// Lambert azimuthal equal-area centered on each field.
    #[default]
    EqualArea,
    /// UTM in the zone containing each field's center.
    Utm,
    /// UTM in a fixed zone for every field.
    UtmZone { zone: u8, northern: bool },
}

impl Projector for Projection {
    fn project(&self, points: &[GpsPoint]) -> Option<Vec<Coord>> {
        match *self {
            Projection::EqualArea => EqualAreaProjector::new().project(points),
            Projection::Utm => UtmProjector::auto().project(points),
            Projection::UtmZone { zone, northern } => {
                if !(1..=60).contains(&zone) {
                    return None;
                }
                UtmProjector::in_zone(UtmZone { number: zone, northern }).project(points)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Area, GeodesicArea, LineString, Polygon};

    fn square(lat: f64, lng: f64, side_deg: f64) -> Vec<GpsPoint> {
        vec![
            GpsPoint::new(lat, lng),
            GpsPoint::new(lat, lng + side_deg),
            GpsPoint::new(lat + side_deg, lng + side_deg),
            GpsPoint::new(lat + side_deg, lng),
        ]
    }

    fn geodesic_area(points: &[GpsPoint]) -> f64 {
        let ring: Vec<Coord> = points.iter().map(|p| Coord { x: p.longitude, y: p.latitude }).collect();
        Polygon::new(LineString::new(ring), vec![]).geodesic_area_unsigned()
    }

    fn planar_area(coords: Vec<Coord>) -> f64 {
        Polygon::new(LineString::new(coords), vec![]).unsigned_area()
    }

    #[test]
    fn test_equal_area_matches_geodesic_area() {
        for lat in [-33.9, 0.0, 18.52, 52.0, 70.0] {
            let pts = square(lat, 73.85, 0.01);
            let projected = EqualAreaProjector::new().project(&pts).unwrap();
            let expected = geodesic_area(&pts);
            let rel = (planar_area(projected) - expected).abs() / expected;
            assert!(rel < 1e-4, "lat {}: relative error {}", lat, rel);
        }
    }

    #[test]
    fn test_utm_within_one_percent() {
        for (lat, lng) in [(18.52, 73.85), (-23.5, -46.6), (52.0, 13.4)] {
            let pts = square(lat, lng, 0.01);
            let projected = UtmProjector::auto().project(&pts).unwrap();
            let expected = geodesic_area(&pts);
            let rel = (planar_area(projected) - expected).abs() / expected;
            assert!(rel < 0.01, "({}, {}): relative error {}", lat, lng, rel);
        }
    }

    #[test]
    fn test_utm_origin_of_zone() {
        // Equator on the central meridian of zone 43 maps to the false origin
        let zone = UtmZone { number: 43, northern: true };
        let c = UtmProjector::to_utm(&GpsPoint::new(0.0, 75.0), zone);
        assert!((c.x - 500_000.0).abs() < 1e-6);
        assert!(c.y.abs() < 1e-6);
    }

    #[test]
    fn test_zone_selection() {
        let pune = GpsPoint::new(18.52, 73.85);
        assert_eq!(UtmZone::containing(&pune), UtmZone { number: 43, northern: true });
        let sydney = GpsPoint::new(-33.87, 151.21);
        assert_eq!(UtmZone::containing(&sydney), UtmZone { number: 56, northern: false });
        assert_eq!(UtmZone::containing(&GpsPoint::new(0.0, 180.0)).number, 60);
    }

    #[test]
    fn test_degenerate_inputs_are_undefined() {
        let p = GpsPoint::new(18.52, 73.85);
        let q = GpsPoint::new(18.53, 73.86);
        assert!(EqualAreaProjector::new().project(&[]).is_none());
        assert!(EqualAreaProjector::new().project(&[p, q]).is_none());
        assert!(EqualAreaProjector::new().project(&[p, p, p, p]).is_none());
        assert!(UtmProjector::auto().project(&[p, q, q]).is_none());
        assert!(Projection::UtmZone { zone: 0, northern: true }
            .project(&square(18.52, 73.85, 0.01))
            .is_none());
    }

    #[test]
    fn test_unwrapped_longitudes_project_like_in_range_ones() {
        let pts = square(-17.0, 179.995, 0.01);
        assert!(pts.iter().any(|p| p.longitude > 180.0));
        let wrapped: Vec<GpsPoint> = pts
            .iter()
            .map(|p| GpsPoint::new(p.latitude, crate::geo_utils::wrap_longitude(p.longitude)))
            .collect();
        let unwrapped_area = planar_area(EqualAreaProjector::new().project(&pts).unwrap());
        let expected = geodesic_area(&wrapped);
        assert!((unwrapped_area - expected).abs() / expected < 1e-4);
    }

    #[test]
    fn test_center_maps_to_origin() {
        let center = GpsPoint::new(18.52, 73.85);
        let pts = vec![center, GpsPoint::new(18.53, 73.85), GpsPoint::new(18.52, 73.86)];
        let coords = EqualAreaProjector::centered_on(center).project(&pts).unwrap();
        assert!(coords[0].x.abs() < 1e-6 && coords[0].y.abs() < 1e-6);
        // North is +y, east is +x
        assert!(coords[1].y > 1000.0 && coords[1].x.abs() < 1e-6);
        assert!(coords[2].x > 1000.0);
    }
}
