//! Distance metrics for the density clusterer.
//!
//! The clustering radius is only meaningful together with the metric it is measured
//! in: `0.00008` is a sensible radius in degree space, `9.0` in meters. The
//! [`Metric`] chosen in [`FieldConfig`](crate::FieldConfig) and its `epsilon` must
//! always be changed together.

use serde::{Deserialize, Serialize};
use crate::geo_utils::{geodesic_distance, haversine_distance, meters_to_degrees};
use crate::GpsPoint;

/// Above this latitude a square degree box no longer bounds a metric radius.
const MAX_BOXED_LATITUDE: f64 = 80.0;

/// Slack applied to degree search boxes derived from meter radii.
const SEARCH_BOX_MARGIN: f64 = 1.05;

/// A distance between two GPS points.
///
/// Implementors only need [`distance`](DistanceMetric::distance). The search-radius
/// hint lets the clusterer use its spatial index; without it every neighbourhood
/// query is a full scan.
pub trait DistanceMetric {
    /// Distance between `a` and `b` in this metric's units.
    fn distance(&self, a: &GpsPoint, b: &GpsPoint) -> f64;

    /// Half-width, in degrees, of a lat/lng box around a point at `latitude`
    /// that contains every point within `epsilon` of it.
    fn search_radius_degrees(&self, _epsilon: f64, _latitude: f64) -> Option<f64> {
        None
    }
}

/// Straight-line distance in (lat, lng) degree space.
#[derive(Debug, Clone, Copy, Default)]
pub struct DegreeMetric;

impl DistanceMetric for DegreeMetric {
    fn distance(&self, a: &GpsPoint, b: &GpsPoint) -> f64 {
        let dlat = a.latitude - b.latitude;
        let dlng = a.longitude - b.longitude;
        (dlat * dlat + dlng * dlng).sqrt()
    }

    fn search_radius_degrees(&self, epsilon: f64, _latitude: f64) -> Option<f64> {
        Some(epsilon)
    }
}

/// Great-circle distance in meters.
#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineMetric;

impl DistanceMetric for HaversineMetric {
    fn distance(&self, a: &GpsPoint, b: &GpsPoint) -> f64 {
        haversine_distance(a, b)
    }

    fn search_radius_degrees(&self, epsilon: f64, latitude: f64) -> Option<f64> {
        meter_search_radius(epsilon, latitude)
    }
}

/// WGS84 geodesic distance in meters.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeodesicMetric;

impl DistanceMetric for GeodesicMetric {
    fn distance(&self, a: &GpsPoint, b: &GpsPoint) -> f64 {
        geodesic_distance(a, b)
    }

    fn search_radius_degrees(&self, epsilon: f64, latitude: f64) -> Option<f64> {
        meter_search_radius(epsilon, latitude)
    }
}

fn meter_search_radius(epsilon: f64, latitude: f64) -> Option<f64> {
    if latitude.abs() > MAX_BOXED_LATITUDE {
        return None;
    }
    Some(meters_to_degrees(epsilon, latitude) * SEARCH_BOX_MARGIN)
}

/// Metric selection carried in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum Metric {
    /// Euclidean distance on raw degrees; `epsilon` is in degrees.
    Degrees,
    /// Haversine meters; `epsilon` is in meters.
    #[default]
    Haversine,
    /// Ellipsoidal meters; `epsilon` is in meters.
    Geodesic,
}

impl DistanceMetric for Metric {
    fn distance(&self, a: &GpsPoint, b: &GpsPoint) -> f64 {
        match self {
            Metric::Degrees => DegreeMetric.distance(a, b),
            Metric::Haversine => HaversineMetric.distance(a, b),
            Metric::Geodesic => GeodesicMetric.distance(a, b),
        }
    }

    fn search_radius_degrees(&self, epsilon: f64, latitude: f64) -> Option<f64> {
        match self {
            Metric::Degrees => DegreeMetric.search_radius_degrees(epsilon, latitude),
            Metric::Haversine => HaversineMetric.search_radius_degrees(epsilon, latitude),
            Metric::Geodesic => GeodesicMetric.search_radius_degrees(epsilon, latitude),
        }
    }
}
