//! # Field Tracker
//!
//! Detects the work fields a machine visited from its GPS samples.
//!
//! This library provides:
//! - Density-based clustering of samples into fields and noise
//! - Geodetically correct field areas from projected convex hulls
//! - An itinerary of fields with dwell times and travel between them
//! - Parallel processing of independent sample sets
//!
//! ## Features
//!
//! - **`parallel`** - Enable parallel batch detection with rayon
//! - **`ffi`** - Enable FFI bindings for mobile platforms (iOS/Android)
//! - **`full`** - Enable all features
//!
//! ## Pipeline
//!
//! | Stage | Module |
//! |-------|--------|
//! | Samples → field / noise labels | [`clustering`] |
//! | Labels → fields with hull, area, centroid, time span | [`field`], [`geometry`], [`projection`] |
//! | Fields → fields above the minimum area | [`filter`] |
//! | Fields → ordered stops with travel legs | [`itinerary`] |
//! | Itinerary → flat table / CSV | [`report`] |
//!
//! ## Quick Start
//!
//! ```rust
//! use field_tracker::{detect_fields, FieldConfig, Sample};
//!
//! // A machine working a ~30 m x 30 m patch, one sample a minute
//! let samples: Vec<Sample> = (0..100)
//!     .map(|i| Sample::new(
//!         18.5200 + (i / 10) as f64 * 0.00003,
//!         73.8500 + (i % 10) as f64 * 0.00003,
//!         1_700_000_000 + i * 60,
//!     ))
//!     .collect();
//!
//! let detection = detect_fields(&samples, &FieldConfig::default());
//! assert_eq!(detection.itinerary.len(), 1);
//!
//! let field = &detection.itinerary.stops[0].field;
//! let gunthas = field.area.unwrap_or_default();
//! println!("Field {}: {:.1} gunthas, {:.0} min", field.id, gunthas, field.dwell_minutes);
//! ```

use std::time::Instant;

use log::info;
use serde::{Deserialize, Serialize};

pub mod geo_utils;
pub mod metric;
pub mod projection;
pub mod units;

pub mod clustering;
pub mod geometry;
pub mod field;
pub mod filter;
pub mod itinerary;

pub mod error;
pub mod ingest;
pub mod report;

pub use clustering::{cluster_samples, ClusterAssignment, ClusterLabel, InputIssue};
pub use error::{IngestError, ReportError};
pub use field::{build_fields, Field};
pub use filter::{filter_fields, FilterOutcome};
pub use geometry::{field_geometry, FieldGeometry};
pub use ingest::{read_samples, read_samples_from_path, IngestConfig, IngestOutcome};
pub use itinerary::{build_itinerary, FieldOrder, Itinerary, ItineraryStop, TravelLeg};
pub use metric::{DistanceMetric, Metric};
pub use projection::{Projection, Projector};
pub use report::{itinerary_csv_string, itinerary_rows, write_itinerary_csv, ItineraryRow};
pub use units::{AreaUnit, SQUARE_METERS_PER_GUNTHA};

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("FieldTrackerRust")
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
fn init_logging() {
    // No-op on non-Android platforms
}

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use field_tracker::GpsPoint;
/// let point = GpsPoint::new(18.5204, 73.8567); // Pune
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// One position report from the tracked machine.
///
/// Timestamps are Unix seconds (UTC). Samples need not arrive in time order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Sample {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: i64,
}

impl Sample {
    /// Create a new sample.
    pub fn new(latitude: f64, longitude: f64, timestamp: i64) -> Self {
        Self { latitude, longitude, timestamp }
    }

    /// The sample's position.
    pub fn point(&self) -> GpsPoint {
        GpsPoint::new(self.latitude, self.longitude)
    }
}

/// Bounding box of a set of points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

// ============================================================================
// Configuration
// ============================================================================

/// Default clustering radius for [`Metric::Haversine`], close to the historical
/// 0.00008° radius at low latitudes.
pub const DEFAULT_EPSILON_METERS: f64 = 9.0;

/// Historical clustering radius for [`Metric::Degrees`].
pub const LEGACY_EPSILON_DEGREES: f64 = 0.00008;

/// Default minimum neighbourhood size for a core sample, itself included.
pub const DEFAULT_MIN_POINTS: u32 = 11;

/// Default minimum field area, in the configured [`AreaUnit`].
pub const DEFAULT_MIN_AREA: f64 = 5.0;

/// UTM zone the historical area computation was fixed to (43N).
pub const LEGACY_UTM_ZONE: u8 = 43;

/// Configuration for field detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct FieldConfig {
    /// Neighbourhood radius, in the units of `metric`.
    /// Default: 9.0 meters
    pub epsilon: f64,

    /// Samples (including itself) a sample needs within `epsilon` to seed a field.
    /// Default: 11
    pub min_points: u32,

    /// Distance used for neighbourhoods. Changing it requires recalibrating `epsilon`.
    /// Default: Haversine
    pub metric: Metric,

    /// Projection used to measure hull areas.
    /// Default: EqualArea
    pub projection: Projection,

    /// Unit for `min_area` and reported areas.
    /// Default: Guntha
    pub area_unit: AreaUnit,

    /// Fields smaller than this, in `area_unit`, are discarded.
    /// Default: 5.0 (~506 m²)
    pub min_area: f64,

    /// Order of fields in the itinerary, which decides what "next field" means.
    /// Default: ClusterId
    pub order: FieldOrder,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON_METERS,
            min_points: DEFAULT_MIN_POINTS,
            metric: Metric::Haversine,
            projection: Projection::EqualArea,
            area_unit: AreaUnit::Guntha,
            min_area: DEFAULT_MIN_AREA,
            order: FieldOrder::ClusterId,
        }
    }
}

impl FieldConfig {
    /// The historical settings: degree-space radius of 0.00008°, 11 points,
    /// areas measured in UTM zone 43N, 5 guntha minimum, cluster-id order.
    pub fn legacy() -> Self {
        Self {
            epsilon: LEGACY_EPSILON_DEGREES,
            min_points: DEFAULT_MIN_POINTS,
            metric: Metric::Degrees,
            projection: Projection::UtmZone { zone: LEGACY_UTM_ZONE, northern: true },
            area_unit: AreaUnit::Guntha,
            min_area: DEFAULT_MIN_AREA,
            order: FieldOrder::ClusterId,
        }
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// How a sample should be shown on a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointClass {
    /// Member of a field that made it into the itinerary
    Field(u32),
    /// Member of a field removed by the area filter
    Discarded(u32),
    Noise,
}

/// Everything one detection run produces.
#[derive(Debug, Clone)]
pub struct FieldDetection {
    /// Clusterer output, one label per input sample
    pub assignment: ClusterAssignment,
    /// Retained fields in configured order, with travel legs
    pub itinerary: Itinerary,
    /// Fields below the minimum area, ascending id
    pub discarded: Vec<Field>,
}

impl FieldDetection {
    /// Ids of the fields in the itinerary, in itinerary order.
    pub fn retained_ids(&self) -> Vec<u32> {
        self.itinerary.stops.iter().map(|s| s.field.id).collect()
    }

    /// Per-sample classification for rendering, in input order.
    pub fn point_classes(&self) -> Vec<PointClass> {
        let retained = self.retained_ids();
        self.assignment
            .labels
            .iter()
            .map(|label| match label {
                ClusterLabel::Field(id) if retained.contains(id) => PointClass::Field(*id),
                ClusterLabel::Field(id) => PointClass::Discarded(*id),
                ClusterLabel::Noise => PointClass::Noise,
            })
            .collect()
    }
}

/// Run the full pipeline on one batch of samples.
///
/// Stages run strictly in sequence: clustering, field geometry, area filter,
/// itinerary. Degenerate input never fails the run; it yields fewer (or no) fields.
pub fn detect_fields(samples: &[Sample], config: &FieldConfig) -> FieldDetection {
    let start = Instant::now();

    let assignment = cluster_samples(samples, config.epsilon, config.min_points, &config.metric);
    let fields = build_fields(samples, &assignment, &config.projection, config.area_unit);
    let FilterOutcome { retained, discarded } = filter_fields(fields, config.min_area);
    let itinerary = build_itinerary(retained, config.order, config.area_unit);

    info!(
        "[FieldTracker] {} samples -> {} fields ({} retained, {} discarded) in {:?}",
        samples.len(),
        assignment.field_count,
        itinerary.len(),
        discarded.len(),
        start.elapsed()
    );

    FieldDetection { assignment, itinerary, discarded }
}

/// Run the pipeline on several independent sample sets (machines, days...).
///
/// Results are in input order. With the `parallel` feature the runs execute
/// concurrently; they share nothing but the configuration.
pub fn detect_fields_batch(runs: &[Vec<Sample>], config: &FieldConfig) -> Vec<FieldDetection> {
    #[cfg(feature = "parallel")]
    let detections = {
        use rayon::prelude::*;
        runs.par_iter().map(|samples| detect_fields(samples, config)).collect()
    };

    #[cfg(not(feature = "parallel"))]
    let detections = runs.iter().map(|samples| detect_fields(samples, config)).collect();

    detections
}

// ============================================================================
// FFI Exports (only when feature enabled)
// ============================================================================

#[cfg(feature = "ffi")]
mod ffi {
    use super::*;
    use log::{info, warn};

    /// Detection result in FFI-friendly form.
    #[derive(Debug, Clone, uniffi::Record)]
    pub struct FfiFieldDetection {
        /// Field id per input sample, -1 for noise
        pub labels: Vec<i32>,
        pub itinerary: Itinerary,
        pub discarded_field_ids: Vec<u32>,
    }

    impl From<FieldDetection> for FfiFieldDetection {
        fn from(detection: FieldDetection) -> Self {
            Self {
                labels: detection.assignment.to_raw_labels(),
                discarded_field_ids: detection.discarded.iter().map(|f| f.id).collect(),
                itinerary: detection.itinerary,
            }
        }
    }

    /// Detect fields from samples.
    #[uniffi::export]
    pub fn ffi_detect_fields(samples: Vec<Sample>, config: FieldConfig) -> FfiFieldDetection {
        init_logging();
        info!("[FieldTrackerRust] detect_fields called with {} samples", samples.len());
        detect_fields(&samples, &config).into()
    }

    /// Detect fields from flat buffers (zero-copy from JS TypedArray).
    /// `coords` is [lat1, lng1, lat2, lng2, ...], one timestamp per coordinate pair.
    #[uniffi::export]
    pub fn ffi_detect_fields_from_flat(
        coords: Vec<f64>,
        timestamps: Vec<i64>,
        config: FieldConfig,
    ) -> FfiFieldDetection {
        init_logging();
        if coords.len() != timestamps.len() * 2 {
            warn!(
                "[FieldTrackerRust] {} coordinates for {} timestamps; extra values ignored",
                coords.len(),
                timestamps.len()
            );
        }
        let samples: Vec<Sample> = coords
            .chunks_exact(2)
            .zip(timestamps.iter())
            .map(|(chunk, &t)| Sample::new(chunk[0], chunk[1], t))
            .collect();
        info!("[FieldTrackerRust] FLAT detect_fields called with {} samples", samples.len());
        detect_fields(&samples, &config).into()
    }

    /// Detect fields for many independent sample sets in one call.
    #[uniffi::export]
    pub fn ffi_detect_fields_batch(runs: Vec<Vec<Sample>>, config: FieldConfig) -> Vec<FfiFieldDetection> {
        init_logging();
        info!("[FieldTrackerRust] BATCH detect_fields called with {} runs", runs.len());

        let start = std::time::Instant::now();
        let results: Vec<FfiFieldDetection> = detect_fields_batch(&runs, &config)
            .into_iter()
            .map(FfiFieldDetection::from)
            .collect();
        info!("[FieldTrackerRust] Batch of {} runs done in {:?}", results.len(), start.elapsed());

        results
    }

    /// Render an itinerary as CSV text, or `None` if it cannot be represented.
    #[uniffi::export]
    pub fn ffi_itinerary_csv(itinerary: Itinerary) -> Option<String> {
        init_logging();
        match itinerary_csv_string(&itinerary) {
            Ok(csv) => Some(csv),
            Err(e) => {
                warn!("[FieldTrackerRust] Failed to render itinerary: {}", e);
                None
            }
        }
    }

    /// Get default configuration.
    #[uniffi::export]
    pub fn default_field_config() -> FieldConfig {
        init_logging();
        FieldConfig::default()
    }

    /// Get the historical configuration.
    #[uniffi::export]
    pub fn legacy_field_config() -> FieldConfig {
        FieldConfig::legacy()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// A dense square patch of `side` x `side` samples, ~3.3 m apart
    fn patch(lat: f64, lng: f64, side: usize, t0: i64) -> Vec<Sample> {
        (0..side * side)
            .map(|i| {
                Sample::new(
                    lat + (i / side) as f64 * 0.00003,
                    lng + (i % side) as f64 * 0.00003,
                    t0 + i as i64 * 60,
                )
            })
            .collect()
    }

    #[test]
    fn test_gps_point_validation() {
        assert!(GpsPoint::new(18.5204, 73.8567).is_valid());
        assert!(!GpsPoint::new(91.0, 0.0).is_valid());
        assert!(!GpsPoint::new(0.0, 181.0).is_valid());
        assert!(!GpsPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_detect_two_fields() {
        let mut samples = patch(18.52, 73.85, 10, 0);
        samples.extend(patch(18.53, 73.86, 10, 10_000));
        let detection = detect_fields(&samples, &FieldConfig::default());

        assert_eq!(detection.retained_ids(), vec![0, 1]);
        assert!(detection.discarded.is_empty());
        assert!(detection.itinerary.stops[0].next.is_some());
        assert!(detection.itinerary.stops[1].next.is_none());
    }

    #[test]
    fn test_point_classes() {
        // A large patch, a patch too small to keep and one stray sample
        let mut samples = patch(18.52, 73.85, 10, 0);
        let small: Vec<Sample> = (0..12)
            .map(|i| Sample::new(18.54 + (i % 4) as f64 * 0.00001, 73.87 + (i / 4) as f64 * 0.00001, 20_000 + i))
            .collect();
        samples.extend(small);
        samples.push(Sample::new(18.60, 73.95, 30_000));

        let detection = detect_fields(&samples, &FieldConfig::default());
        let classes = detection.point_classes();

        assert_eq!(classes.len(), samples.len());
        assert_eq!(classes[0], PointClass::Field(0));
        assert_eq!(classes[100], PointClass::Discarded(1));
        assert_eq!(classes[112], PointClass::Noise);
        assert_eq!(detection.discarded.len(), 1);
    }

    #[test]
    fn test_legacy_config_finds_same_fields() {
        let mut samples = patch(18.52, 73.85, 10, 0);
        samples.extend(patch(18.53, 73.86, 10, 10_000));
        let modern = detect_fields(&samples, &FieldConfig::default());
        let legacy = detect_fields(&samples, &FieldConfig::legacy());

        assert_eq!(modern.retained_ids(), legacy.retained_ids());
        for (a, b) in modern.itinerary.stops.iter().zip(legacy.itinerary.stops.iter()) {
            let (a, b) = (a.field.area_m2.unwrap(), b.field.area_m2.unwrap());
            let rel = (a - b).abs() / a;
            assert!(rel < 0.01, "areas differ by {}", rel);
        }
    }

    #[test]
    fn test_batch_matches_individual_runs() {
        let runs = vec![
            patch(18.52, 73.85, 10, 0),
            Vec::new(),
            patch(-23.55, -46.63, 6, 5_000),
        ];
        let config = FieldConfig::default();
        let batch = detect_fields_batch(&runs, &config);
        assert_eq!(batch.len(), 3);
        for (run, detection) in runs.iter().zip(batch.iter()) {
            let single = detect_fields(run, &config);
            assert_eq!(single.assignment, detection.assignment);
            assert_eq!(single.retained_ids(), detection.retained_ids());
        }
        assert!(batch[1].itinerary.is_empty());
    }
}
