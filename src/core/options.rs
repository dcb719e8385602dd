//! Configuration for isochrone computations
//!
//! `IsochroneOptions` is resolved once by the caller and only read by the core.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::{unknown_name, Error, Result};

/// Mean earth radius in meters, shared by every haversine computation
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Maximum coordinates per matrix request when the options do not name one
///
/// OSRM takes coordinates in the URL path; 2 500 coordinates rendered with six
/// decimals stay below the 64 KiB URI limit of the HTTP stack.
pub const DEFAULT_BATCH_SIZE: usize = 2500;

/// Length units accepted for `radius` and `cell_size`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    Meters,
    #[default]
    Kilometers,
    Miles,
    #[serde(alias = "nautical-miles")]
    NauticalMiles,
    Feet,
    Yards,
    Inches,
    Centimeters,
    Millimeters,
    Degrees,
    Radians,
}

impl LengthUnit {
    const NAMES: [&'static str; 11] = [
        "meters",
        "kilometers",
        "miles",
        "nauticalmiles",
        "feet",
        "yards",
        "inches",
        "centimeters",
        "millimeters",
        "degrees",
        "radians",
    ];

    /// Convert a length in this unit to meters on the earth's surface
    pub fn to_meters(self, length: f64) -> f64 {
        match self {
            LengthUnit::Meters => length,
            LengthUnit::Kilometers => length * 1000.0,
            LengthUnit::Miles => length * 1609.344,
            LengthUnit::NauticalMiles => length * 1852.0,
            LengthUnit::Feet => length / 3.28084,
            LengthUnit::Yards => length / 1.0936,
            LengthUnit::Inches => length / 39.37,
            LengthUnit::Centimeters => length / 100.0,
            LengthUnit::Millimeters => length / 1000.0,
            LengthUnit::Degrees => length.to_radians() * EARTH_RADIUS_M,
            LengthUnit::Radians => length * EARTH_RADIUS_M,
        }
    }
}

impl FromStr for LengthUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "meters" | "metres" => Ok(LengthUnit::Meters),
            "kilometers" | "kilometres" => Ok(LengthUnit::Kilometers),
            "miles" => Ok(LengthUnit::Miles),
            "nauticalmiles" | "nautical-miles" => Ok(LengthUnit::NauticalMiles),
            "feet" => Ok(LengthUnit::Feet),
            "yards" => Ok(LengthUnit::Yards),
            "inches" => Ok(LengthUnit::Inches),
            "centimeters" | "centimetres" => Ok(LengthUnit::Centimeters),
            "millimeters" | "millimetres" => Ok(LengthUnit::Millimeters),
            "degrees" => Ok(LengthUnit::Degrees),
            "radians" => Ok(LengthUnit::Radians),
            _ => Err(unknown_name("unit", s, &Self::NAMES)),
        }
    }
}

/// Routing profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    #[default]
    Car,
    Bicycle,
    Foot,
}

impl Profile {
    pub const NAMES: [&'static str; 3] = ["car", "bicycle", "foot"];

    /// Path segment used by the OSRM table service
    pub fn as_str(self) -> &'static str {
        match self {
            Profile::Car => "car",
            Profile::Bicycle => "bicycle",
            Profile::Foot => "foot",
        }
    }

    /// Costing model used by the Valhalla isochrone service
    pub fn valhalla_costing(self) -> &'static str {
        match self {
            Profile::Car => "auto",
            Profile::Bicycle => "bicycle",
            Profile::Foot => "pedestrian",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "car" => Ok(Profile::Car),
            "bicycle" => Ok(Profile::Bicycle),
            "foot" => Ok(Profile::Foot),
            _ => Err(unknown_name("profile", s, &Self::NAMES)),
        }
    }
}

/// Routing provider, which also selects the strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OSRM table service, matrix strategy
    Osrm,
    /// Valhalla isochrone service, contour strategy
    #[default]
    Valhalla,
}

impl ProviderKind {
    pub const NAMES: [&'static str; 2] = ["osrm", "valhalla"];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Osrm => "osrm",
            ProviderKind::Valhalla => "valhalla",
        }
    }

    /// Endpoint used when the options do not name one
    pub fn default_endpoint(self) -> &'static str {
        match self {
            ProviderKind::Osrm => "http://127.0.0.1:5000/table/v1/",
            ProviderKind::Valhalla => "http://127.0.0.1:8002/isochrone",
        }
    }

    /// Environment variable that carries the provider's data date
    pub fn data_date_env(self) -> &'static str {
        match self {
            ProviderKind::Osrm => "OSRM_DATA_DATE",
            ProviderKind::Valhalla => "VALHALLA_DATA_DATE",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "osrm" => Ok(ProviderKind::Osrm),
            "valhalla" => Ok(ProviderKind::Valhalla),
            _ => Err(unknown_name("provider", s, &Self::NAMES)),
        }
    }
}

/// Options for an isochrone computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IsochroneOptions {
    /// Distance from the origin to the edge of the probe grid
    pub radius: f64,

    /// Distance between neighbouring grid points
    pub cell_size: f64,

    /// Unit of `radius` and `cell_size`
    pub unit: LengthUnit,

    /// Travel-time thresholds in minutes
    pub intervals: Vec<f64>,

    /// Relative concavity of the hull (larger is more convex)
    pub concavity: f64,

    /// Hull edges shorter than this are not refined further
    pub length_threshold: f64,

    /// Make the bands mutually exclusive
    pub deintersect: bool,

    pub profile: Profile,

    pub provider: ProviderKind,

    /// Provider address, `provider.default_endpoint()` when absent
    pub endpoint: Option<String>,

    /// Coordinates per matrix request, `DEFAULT_BATCH_SIZE` when absent
    pub batch_size: Option<usize>,
}

impl Default for IsochroneOptions {
    fn default() -> Self {
        Self {
            radius: 0.0,
            cell_size: 0.1,
            unit: LengthUnit::default(),
            intervals: Vec::new(),
            concavity: 2.0,
            length_threshold: 0.0,
            deintersect: false,
            profile: Profile::default(),
            provider: ProviderKind::default(),
            endpoint: None,
            batch_size: None,
        }
    }
}

impl IsochroneOptions {
    /// Provider endpoint with the provider default applied
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.provider.default_endpoint())
    }

    /// Matrix batch size with the default applied
    pub fn batch_size(&self) -> usize {
        self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE)
    }

    /// Intervals sorted ascending with duplicates removed
    pub fn sorted_intervals(&self) -> Vec<f64> {
        let mut intervals = self.intervals.clone();
        intervals.sort_by(f64::total_cmp);
        intervals.dedup();
        intervals
    }

    /// Check the options before any network activity
    pub fn validate(&self) -> Result<()> {
        if self.intervals.is_empty() {
            return Err(Error::InvalidInput(
                "Could not determine isochrone intervals".to_string(),
            ));
        }
        for interval in &self.intervals {
            if !interval.is_finite() || *interval <= 0.0 {
                return Err(Error::InvalidInput(format!(
                    "Invalid \"intervals\" value => {interval}. Must contain positive numbers."
                )));
            }
        }

        if self.provider == ProviderKind::Osrm {
            self.validate_grid()?;
        }

        Ok(())
    }

    /// Check the settings only the matrix strategy uses
    pub fn validate_grid(&self) -> Result<()> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "Invalid \"radius\" value => {}. It must be greater than 0.",
                self.radius
            )));
        }
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "Invalid \"cell_size\" value => {}. It must be greater than 0.",
                self.cell_size
            )));
        }
        if !self.concavity.is_finite() || self.concavity <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "Invalid \"concavity\" value => {}",
                self.concavity
            )));
        }
        if !self.length_threshold.is_finite() || self.length_threshold < 0.0 {
            return Err(Error::InvalidInput(format!(
                "Invalid \"lengthThreshold\" value => {}",
                self.length_threshold
            )));
        }
        // the origin takes one slot of every request
        if let Some(size) = self.batch_size.filter(|&size| size < 2) {
            return Err(Error::InvalidInput(format!(
                "Invalid \"batchSize\" value => {size}. It must be at least 2."
            )));
        }

        Ok(())
    }
}
