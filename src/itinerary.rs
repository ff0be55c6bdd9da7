//! # Itinerary
//!
//! Orders retained fields and measures the travel between consecutive ones.
//!
//! ## Ordering
//! Cluster ids follow the input order of each field's first core sample, which is
//! not necessarily the order the fields were worked in. [`FieldOrder`] makes the
//! choice explicit:
//! - `ClusterId` (default): ascending id
//! - `StartTime`: ascending first-sample time, ties broken by id
//!
//! ## Travel metrics
//! For every field except the last:
//! - `distance_km`: geodesic distance between the two fields' centroids
//! - `time_minutes`: next start minus this end. Reported as computed; a negative
//!   value means the ordering does not match the clock (see
//!   [`Itinerary::has_time_inversions`])
//! - `handoff_distance_km`: geodesic distance from this field's last-arriving
//!   sample to the next field's first-arriving sample
//!
//! The last field has no leg.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use crate::field::{minutes_between, Field};
use crate::geo_utils::geodesic_distance;
use crate::units::AreaUnit;
use crate::Sample;

/// Which sequence "next field" refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum FieldOrder {
    #[default]
    ClusterId,
    StartTime,
}

/// Travel from one field to the next.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct TravelLeg {
    /// Id of the field travelled to
    pub to_field_id: u32,
    /// Centroid-to-centroid geodesic distance
    pub distance_km: f64,
    /// Next field's start minus this field's end; may be negative
    pub time_minutes: f64,
    /// Last sample of this field to first sample of the next, by arrival order
    pub handoff_distance_km: f64,
}

/// A field in the itinerary and the leg leaving it, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct ItineraryStop {
    pub field: Field,
    pub next: Option<TravelLeg>,
}

/// Retained fields in order, with travel legs between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Itinerary {
    pub stops: Vec<ItineraryStop>,
    /// Unit of each field's `area`
    pub area_unit: AreaUnit,
    pub order: FieldOrder,
}

impl Itinerary {
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// The legs that exist, in order; always `len() - 1` of them for a non-empty itinerary.
    pub fn legs(&self) -> impl Iterator<Item = &TravelLeg> {
        self.stops.iter().filter_map(|s| s.next.as_ref())
    }

    /// True when some leg has negative travel time.
    pub fn has_time_inversions(&self) -> bool {
        self.legs().any(|leg| leg.time_minutes < 0.0)
    }

    /// Sum of centroid-to-centroid distances.
    pub fn total_travel_km(&self) -> f64 {
        self.legs().map(|leg| leg.distance_km).sum()
    }
}

fn first_arrival(field: &Field) -> Option<&Sample> {
    field.members.first()
}

fn last_arrival(field: &Field) -> Option<&Sample> {
    field.members.last()
}

fn leg_between(from: &Field, to: &Field) -> TravelLeg {
    let distance_km = geodesic_distance(&from.centroid, &to.centroid) / 1000.0;
    let handoff_distance_km = match (last_arrival(from), first_arrival(to)) {
        (Some(a), Some(b)) => geodesic_distance(&a.point(), &b.point()) / 1000.0,
        _ => distance_km,
    };
    TravelLeg {
        to_field_id: to.id,
        distance_km,
        time_minutes: minutes_between(from.end_time, to.start_time),
        handoff_distance_km,
    }
}

/// Order `fields` and attach a travel leg to every field but the last.
pub fn build_itinerary(mut fields: Vec<Field>, order: FieldOrder, area_unit: AreaUnit) -> Itinerary {
    match order {
        FieldOrder::ClusterId => fields.sort_by_key(|f| f.id),
        FieldOrder::StartTime => fields.sort_by_key(|f| (f.start_time, f.id)),
    }

    let legs: Vec<Option<TravelLeg>> = (0..fields.len())
        .map(|i| fields.get(i + 1).map(|next| leg_between(&fields[i], next)))
        .collect();

    let stops: Vec<ItineraryStop> = fields
        .into_iter()
        .zip(legs)
        .map(|(field, next)| ItineraryStop { field, next })
        .collect();

    let itinerary = Itinerary { stops, area_unit, order };

    if itinerary.has_time_inversions() {
        warn!(
            "[Itinerary] Negative travel time between fields in {:?} order; fields were not worked in this order",
            order
        );
    }
    info!(
        "[Itinerary] {} stops, {:.2} km travelled between fields",
        itinerary.len(),
        itinerary.total_travel_km()
    );

    itinerary
}
