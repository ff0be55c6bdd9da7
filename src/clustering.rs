//! # Density-Based Field Clustering
//!
//! Partitions samples into fields and noise using density reachability (DBSCAN).
//!
//! ## Algorithm
//! 1. Index every valid sample in an R-tree keyed on (lng, lat)
//! 2. Count each sample's `epsilon` neighbourhood (itself included), using the
//!    metric's search box to prune candidates. Boxes that cross the ±180°
//!    meridian are repeated on the other side
//! 3. Samples with at least `min_points` neighbours are core points
//! 4. Visit samples in input order; each unlabelled core point seeds a new field,
//!    which grows through a stack of neighbours. Core neighbours keep expanding,
//!    non-core neighbours join the field but do not expand it
//! 5. Everything left unlabelled is noise
//!
//! Neighbourhoods are queried again during expansion instead of being kept from
//! step 2. That costs a second index query per core sample but keeps memory
//! linear: a machine parked for hours produces thousands of samples that are all
//! each other's neighbours.
//!
//! ## Ordering
//! A border sample within `epsilon` of core points of two different fields joins
//! whichever field reaches it first. Because seeds are visited in input order and
//! neighbourhoods are expanded in index order, the result is deterministic for a
//! given input order but can change if the input is reordered. Field ids are
//! assigned in order of their lowest-index core point, starting at 0.

use rstar::{RTree, RTreeObject, AABB};
use log::{debug, info, warn};
use crate::metric::DistanceMetric;
use crate::{GpsPoint, Sample};

/// Classification of a single sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClusterLabel {
    Field(u32),
    Noise,
}

impl ClusterLabel {
    pub fn field_id(&self) -> Option<u32> {
        match self {
            ClusterLabel::Field(id) => Some(*id),
            ClusterLabel::Noise => None,
        }
    }

    pub fn is_noise(&self) -> bool {
        matches!(self, ClusterLabel::Noise)
    }
}

/// Why a clustering run produced no fields without examining density.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputIssue {
    /// Fewer valid samples than `min_points`; no sample can be a core point.
    TooFewSamples { count: usize, min_points: u32 },
    /// Every valid sample has the same coordinates; there is no spatial extent.
    IdenticalCoordinates,
}

/// One label per input sample, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterAssignment {
    pub labels: Vec<ClusterLabel>,
    /// Number of distinct fields; ids run `0..field_count`.
    pub field_count: u32,
    pub issue: Option<InputIssue>,
}

impl ClusterAssignment {
    fn all_noise(len: usize, issue: Option<InputIssue>) -> Self {
        Self {
            labels: vec![ClusterLabel::Noise; len],
            field_count: 0,
            issue,
        }
    }

    pub fn noise_count(&self) -> usize {
        self.labels.iter().filter(|l| l.is_noise()).count()
    }

    /// Indices of the samples assigned to `field_id`, ascending.
    pub fn members_of(&self, field_id: u32) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, l)| **l == ClusterLabel::Field(field_id))
            .map(|(i, _)| i)
            .collect()
    }

    /// Flat encoding: the field id, or `-1` for noise.
    pub fn to_raw_labels(&self) -> Vec<i32> {
        self.labels
            .iter()
            .map(|l| match l {
                ClusterLabel::Field(id) => *id as i32,
                ClusterLabel::Noise => -1,
            })
            .collect()
    }
}

// =============================================================================
// R-tree Indexed Point for Neighbourhood Queries
// =============================================================================

/// A sample position with its input index for R-tree queries
#[derive(Debug, Clone, Copy)]
struct IndexedPoint {
    idx: usize,
    lat: f64,
    lng: f64,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.lng, self.lat])
    }
}

/// Epsilon-neighbourhood queries over the valid samples.
///
/// Neighbourhoods are computed on demand and never stored together, so memory
/// stays linear even when thousands of samples sit inside one radius.
struct NeighbourIndex<'a, M: DistanceMetric + ?Sized> {
    points: &'a [GpsPoint],
    valid: &'a [usize],
    rtree: RTree<IndexedPoint>,
    epsilon: f64,
    metric: &'a M,
}

impl<'a, M: DistanceMetric + ?Sized> NeighbourIndex<'a, M> {
    fn new(points: &'a [GpsPoint], valid: &'a [usize], epsilon: f64, metric: &'a M) -> Self {
        let indexed: Vec<IndexedPoint> = valid
            .iter()
            .map(|&idx| IndexedPoint { idx, lat: points[idx].latitude, lng: points[idx].longitude })
            .collect();
        Self { points, valid, rtree: RTree::bulk_load(indexed), epsilon, metric }
    }

    /// Neighbourhood of sample `i` (itself included), indices ascending.
    fn neighbours(&self, i: usize) -> Vec<usize> {
        let p = &self.points[i];
        let within = |j: usize| self.metric.distance(p, &self.points[j]) <= self.epsilon;

        let mut neighbours: Vec<usize> = match self.metric.search_radius_degrees(self.epsilon, p.latitude) {
            Some(r) => {
                let mut found = Vec::new();
                for shift in search_shifts(p.longitude, r) {
                    let lng = p.longitude + shift;
                    let search = AABB::from_corners([lng - r, p.latitude - r], [lng + r, p.latitude + r]);
                    found.extend(
                        self.rtree
                            .locate_in_envelope(&search)
                            .map(|q| q.idx)
                            .filter(|&j| within(j)),
                    );
                }
                found
            }
            None => self.valid.iter().copied().filter(|&j| within(j)).collect(),
        };
        neighbours.sort_unstable();
        neighbours.dedup();
        neighbours
    }
}

/// Longitude offsets at which to repeat a search box of half-width `r` around
/// `lng` so that it also covers the far side of the ±180° meridian.
fn search_shifts(lng: f64, r: f64) -> Vec<f64> {
    let mut shifts = vec![0.0];
    if lng + r > 180.0 {
        shifts.push(-360.0);
    }
    if lng - r < -180.0 {
        shifts.push(360.0);
    }
    shifts
}

/// Cluster samples into fields and noise.
///
/// `epsilon` is in the units of `metric`. `min_points` counts the sample itself;
/// `0` is treated as `1`.
///
/// Samples with invalid coordinates are labelled noise and take no part in the
/// density computation. Inputs with fewer valid samples than `min_points`, or whose
/// valid samples all share one coordinate, are labelled entirely noise and the
/// reason is reported in [`ClusterAssignment::issue`].
///
/// # Example
/// ```
/// use field_tracker::{Sample, Metric};
/// use field_tracker::clustering::{cluster_samples, ClusterLabel};
///
/// // Twelve samples within a few meters of each other, one far away
/// let mut samples: Vec<Sample> = (0..12)
///     .map(|i| Sample::new(18.52 + (i % 4) as f64 * 0.00002, 73.85 + (i / 4) as f64 * 0.00002, i))
///     .collect();
/// samples.push(Sample::new(18.60, 73.90, 12));
///
/// let assignment = cluster_samples(&samples, 9.0, 11, &Metric::Haversine);
/// assert_eq!(assignment.field_count, 1);
/// assert_eq!(assignment.labels[0], ClusterLabel::Field(0));
/// assert_eq!(assignment.labels[12], ClusterLabel::Noise);
/// ```
pub fn cluster_samples<M: DistanceMetric + ?Sized>(
    samples: &[Sample],
    epsilon: f64,
    min_points: u32,
    metric: &M,
) -> ClusterAssignment {
    let min_points = min_points.max(1);
    let points: Vec<GpsPoint> = samples.iter().map(Sample::point).collect();
    let valid: Vec<usize> = (0..points.len()).filter(|&i| points[i].is_valid()).collect();

    if valid.len() < points.len() {
        warn!(
            "[Clustering] {} of {} samples have invalid coordinates, labelled noise",
            points.len() - valid.len(),
            points.len()
        );
    }

    if valid.len() < min_points as usize {
        info!(
            "[Clustering] {} valid samples, fewer than min_points={}; no fields",
            valid.len(),
            min_points
        );
        return ClusterAssignment::all_noise(
            points.len(),
            Some(InputIssue::TooFewSamples { count: valid.len(), min_points }),
        );
    }

    let first = points[valid[0]];
    if valid.iter().all(|&i| points[i] == first) {
        info!("[Clustering] All {} valid samples share one coordinate; no fields", valid.len());
        return ClusterAssignment::all_noise(points.len(), Some(InputIssue::IdenticalCoordinates));
    }

    let index = NeighbourIndex::new(&points, &valid, epsilon, metric);
    let mut is_core = vec![false; points.len()];
    for &i in &valid {
        is_core[i] = index.neighbours(i).len() >= min_points as usize;
    }

    let mut labels = vec![ClusterLabel::Noise; points.len()];
    let mut next_id: u32 = 0;
    let mut stack: Vec<usize> = Vec::new();

    for seed in 0..points.len() {
        if !labels[seed].is_noise() || !is_core[seed] {
            continue;
        }

        // Samples are labelled when pushed, so each enters the stack at most once
        let field = ClusterLabel::Field(next_id);
        labels[seed] = field;
        stack.push(seed);
        while let Some(i) = stack.pop() {
            if !is_core[i] {
                continue;
            }
            for j in index.neighbours(i) {
                if labels[j].is_noise() {
                    labels[j] = field;
                    stack.push(j);
                }
            }
        }

        debug!("[Clustering] Field {} seeded at sample {}", next_id, seed);
        next_id += 1;
    }

    let assignment = ClusterAssignment { labels, field_count: next_id, issue: None };
    info!(
        "[Clustering] {} samples -> {} fields, {} noise",
        points.len(),
        assignment.field_count,
        assignment.noise_count()
    );
    assignment
}
