//! Area units for reporting field sizes.
//!
//! Geometry is always computed in square meters; the unit only applies when a
//! field's area is compared against the minimum-area threshold or written to a report.

use serde::{Deserialize, Serialize};

/// One guntha, the land measure field areas are reported in by default.
pub const SQUARE_METERS_PER_GUNTHA: f64 = 101.17;

/// One hectare.
pub const SQUARE_METERS_PER_HECTARE: f64 = 10_000.0;

/// One international acre.
pub const SQUARE_METERS_PER_ACRE: f64 = 4_046.856_422_4;

/// Unit used for field areas in thresholds and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum AreaUnit {
    #[default]
    Guntha,
    Hectare,
    Acre,
    SquareMeters,
}

impl AreaUnit {
    /// Size of one unit in square meters.
    pub fn square_meters(self) -> f64 {
        match self {
            AreaUnit::Guntha => SQUARE_METERS_PER_GUNTHA,
            AreaUnit::Hectare => SQUARE_METERS_PER_HECTARE,
            AreaUnit::Acre => SQUARE_METERS_PER_ACRE,
            AreaUnit::SquareMeters => 1.0,
        }
    }

    /// Convert an area in square meters to this unit.
    ///
    /// ```
    /// use field_tracker::AreaUnit;
    ///
    /// let gunthas = AreaUnit::Guntha.from_square_meters(1011.7);
    /// assert!((gunthas - 10.0).abs() < 1e-9);
    /// ```
    pub fn from_square_meters(self, area_m2: f64) -> f64 {
        area_m2 / self.square_meters()
    }

    /// Convert an area in this unit back to square meters.
    pub fn to_square_meters(self, area: f64) -> f64 {
        area * self.square_meters()
    }

    /// Plural name used in report column headers.
    pub fn label(self) -> &'static str {
        match self {
            AreaUnit::Guntha => "Gunthas",
            AreaUnit::Hectare => "Hectares",
            AreaUnit::Acre => "Acres",
            AreaUnit::SquareMeters => "Square Meters",
        }
    }
}
