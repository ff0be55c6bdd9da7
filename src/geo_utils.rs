//! # Geographic Utilities
//!
//! Point-level helpers shared by the metrics, the projectors and the itinerary.
//!
//! | Function | Used for |
//! |----------|----------|
//! | [`haversine_distance`] | Clustering neighbourhoods (spherical, fast) |
//! | [`geodesic_distance`] | Reported travel distances (WGS84, Karney) |
//! | [`meters_to_degrees`] | Sizing R-tree search boxes from a meter radius |
//! | [`compute_bounds`] | Collinearity tolerance of a hull |
//! | [`compute_center`] | Field centroid, projection center |
//! | [`distinct_points`] | Detecting hulls with no extent |
//! | [`unwrap_longitudes`] / [`wrap_longitude`] | Field geometry across the ±180° meridian |
//!
//! Inputs are WGS84 latitude/longitude in degrees. Spherical and ellipsoidal
//! distances differ by up to ~0.5%; only the geodesic is ever written to a report.
//!
//! ```rust
//! use field_tracker::{GpsPoint, geo_utils};
//!
//! let gate = GpsPoint::new(18.5204, 73.8567);
//! let field = GpsPoint::new(18.5304, 73.8567);
//!
//! let sphere = geo_utils::haversine_distance(&gate, &field);
//! let ellipsoid = geo_utils::geodesic_distance(&gate, &field);
//! assert!((sphere - ellipsoid).abs() < 0.01 * ellipsoid);
//! ```

use geo::{Distance, Geodesic, Haversine, Point};
use crate::{Bounds, GpsPoint};

/// Meters per degree of longitude at the equator.
const METERS_PER_DEGREE_EQUATOR: f64 = 111_320.0;

/// Floor on `cos(latitude)` so degree spans stay finite near the poles.
const MIN_LATITUDE_COSINE: f64 = 0.1;

#[inline]
fn to_point(p: &GpsPoint) -> Point {
    Point::new(p.longitude, p.latitude)
}

/// Great-circle distance in meters on a sphere of mean Earth radius.
#[inline]
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    Haversine::distance(to_point(p1), to_point(p2))
}

/// Distance in meters along the WGS84 ellipsoid.
///
/// Slower than [`haversine_distance`], but this is the one to use when the number
/// is shown to someone rather than compared against a threshold.
#[inline]
pub fn geodesic_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    Geodesic::distance(to_point(p1), to_point(p2))
}

/// Degrees of longitude spanned by `meters` at `latitude`.
///
/// A longitude degree is never longer than a latitude degree, so the result also
/// bounds the latitude span and works as the half-width of a square search box.
/// Past ~84° the span is capped rather than growing without bound.
#[inline]
pub fn meters_to_degrees(meters: f64, latitude: f64) -> f64 {
    let cos_lat = latitude.to_radians().cos().max(MIN_LATITUDE_COSINE);
    meters / (METERS_PER_DEGREE_EQUATOR * cos_lat)
}

/// Bounding box of a point set.
///
/// Empty input yields an inverted box (`min > max`) that contains nothing.
///
/// ```rust
/// use field_tracker::{GpsPoint, geo_utils};
///
/// let hull = vec![
///     GpsPoint::new(18.5200, 73.8500),
///     GpsPoint::new(18.5210, 73.8512),
///     GpsPoint::new(18.5204, 73.8507),
/// ];
/// let b = geo_utils::compute_bounds(&hull);
/// assert_eq!((b.min_lat, b.max_lng), (18.5200, 73.8512));
/// ```
pub fn compute_bounds(points: &[GpsPoint]) -> Bounds {
    let empty = Bounds {
        min_lat: f64::MAX,
        max_lat: f64::MIN,
        min_lng: f64::MAX,
        max_lng: f64::MIN,
    };
    points.iter().fold(empty, |b, p| Bounds {
        min_lat: b.min_lat.min(p.latitude),
        max_lat: b.max_lat.max(p.latitude),
        min_lng: b.min_lng.min(p.longitude),
        max_lng: b.max_lng.max(p.longitude),
    })
}

/// Arithmetic mean of a point set, or `None` when it is empty.
///
/// This is the samples' center of mass, not the centroid of their hull: a field
/// worked mostly along one edge has its center pulled toward that edge.
/// Sets spanning the ±180° meridian must go through [`unwrap_longitudes`] first.
pub fn compute_center(points: &[GpsPoint]) -> Option<GpsPoint> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (lat, lng) = points
        .iter()
        .fold((0.0, 0.0), |(lat, lng), p| (lat + p.latitude, lng + p.longitude));
    Some(GpsPoint::new(lat / n, lng / n))
}

/// Unique coordinates of a point set, keeping the first occurrence of each.
pub fn distinct_points(points: &[GpsPoint]) -> Vec<GpsPoint> {
    let mut distinct: Vec<GpsPoint> = Vec::with_capacity(points.len());
    for p in points {
        if !distinct.contains(p) {
            distinct.push(*p);
        }
    }
    distinct
}

/// Bring a longitude that has drifted past ±180° back into range.
///
/// Values already in `[-180, 180]` are returned unchanged.
pub fn wrap_longitude(lng: f64) -> f64 {
    if lng > 180.0 {
        lng - 360.0
    } else if lng < -180.0 {
        lng + 360.0
    } else {
        lng
    }
}

/// Shift longitudes by ±360° so that none is more than 180° from the first point.
///
/// A point set straddling the ±180° meridian becomes contiguous (some longitudes
/// leave `[-180, 180]`), so planar hulls and means over it are meaningful. Sets
/// that do not straddle it are returned unchanged.
pub fn unwrap_longitudes(points: &[GpsPoint]) -> Vec<GpsPoint> {
    let Some(reference) = points.first().map(|p| p.longitude) else {
        return Vec::new();
    };
    points
        .iter()
        .map(|p| {
            let d = p.longitude - reference;
            if d > 180.0 {
                GpsPoint::new(p.latitude, p.longitude - 360.0)
            } else if d < -180.0 {
                GpsPoint::new(p.latitude, p.longitude + 360.0)
            } else {
                *p
            }
        })
        .collect()
}
