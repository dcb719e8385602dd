//! JSON input shared by the command line tool and the HTTP server
//!
//! ```json
//! {
//!   "origin": { "type": "Point", "coordinates": [8.8071646, 53.0758196] },
//!   "intervals": [{ "interval": 1 }, { "interval": 3 }, 5],
//!   "provider": "osrm",
//!   "radius": 5,
//!   "cellSize": 0.2,
//!   "deintersect": true
//! }
//! ```

use geo::Point;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::core::error::{Error, Result};
use crate::core::options::IsochroneOptions;

/// Assumed top speed when the radius is derived, in km/h
const MAX_SPEED_KMH: f64 = 120.0;

/// GeoJSON point
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct OriginPoint {
    #[serde(rename = "type", default = "point_type")]
    #[schema(example = "Point")]
    pub kind: String,
    /// [longitude, latitude]
    #[schema(value_type = Vec<f64>, example = json!([8.8071646, 53.0758196]))]
    pub coordinates: Vec<Value>,
}

fn point_type() -> String {
    "Point".to_string()
}

impl OriginPoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { kind: point_type(), coordinates: vec![lon.into(), lat.into()] }
    }

    fn to_point(&self) -> Result<Point<f64>> {
        if self.coordinates.len() != 2 {
            return Err(Error::InvalidInput(
                "Invalid \"origin\" value. Must contain 2 elements.".to_string(),
            ));
        }
        match (self.coordinates[0].as_f64(), self.coordinates[1].as_f64()) {
            (Some(lon), Some(lat)) => Ok(Point::new(lon, lat)),
            _ => Err(Error::InvalidInput(
                "Invalid \"origin\" value. Must contain 2 numbers.".to_string(),
            )),
        }
    }
}

/// An interval in minutes, bare or wrapped as `{ "interval": n }`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum IntervalEntry {
    Minutes(f64),
    Wrapped { interval: f64 },
}

impl IntervalEntry {
    pub fn minutes(self) -> f64 {
        match self {
            IntervalEntry::Minutes(minutes) | IntervalEntry::Wrapped { interval: minutes } => minutes,
        }
    }
}

/// Isochrone request as sent by clients
///
/// Every field but `origin` and `intervals` is optional and falls back to
/// `IsochroneOptions::default()`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IsochroneRequest {
    pub origin: Option<OriginPoint>,

    #[serde(default)]
    pub intervals: Vec<IntervalEntry>,

    /// Grid radius; zero or negative derives it from the largest interval
    #[schema(example = 5.0)]
    pub radius: Option<f64>,

    #[schema(example = 0.1)]
    pub cell_size: Option<f64>,

    #[serde(alias = "units")]
    #[schema(example = "kilometers")]
    pub unit: Option<String>,

    pub concavity: Option<f64>,

    pub length_threshold: Option<f64>,

    pub deintersect: Option<bool>,

    #[schema(example = "car")]
    pub profile: Option<String>,

    #[schema(example = "valhalla")]
    pub provider: Option<String>,

    pub endpoint: Option<String>,

    pub batch_size: Option<usize>,
}

impl IsochroneRequest {
    /// Interval minutes in request order
    pub fn interval_minutes(&self) -> Vec<f64> {
        self.intervals.iter().map(|entry| entry.minutes()).collect()
    }

    /// Validate and apply defaults
    pub fn resolve(&self) -> Result<(Point<f64>, IsochroneOptions)> {
        let defaults = IsochroneOptions::default();

        let intervals = self.interval_minutes();
        if intervals.is_empty() {
            return Err(Error::InvalidInput(
                "Could not determine isochrone intervals".to_string(),
            ));
        }

        let origin = self
            .origin
            .as_ref()
            .ok_or_else(|| Error::InvalidInput("Missing required parameter \"origin\"".to_string()))?
            .to_point()?;

        let radius = match self.radius {
            Some(radius) if radius > 0.0 => radius,
            _ => {
                let max_minutes = intervals.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                MAX_SPEED_KMH / 60.0 * max_minutes
            }
        };

        let options = IsochroneOptions {
            radius,
            cell_size: self.cell_size.unwrap_or(defaults.cell_size),
            unit: self.unit.as_deref().map(str::parse).transpose()?.unwrap_or(defaults.unit),
            intervals,
            concavity: self.concavity.unwrap_or(defaults.concavity),
            length_threshold: self.length_threshold.unwrap_or(defaults.length_threshold),
            deintersect: self.deintersect.unwrap_or(defaults.deintersect),
            profile: self.profile.as_deref().map(str::parse).transpose()?.unwrap_or(defaults.profile),
            provider: self.provider.as_deref().map(str::parse).transpose()?.unwrap_or(defaults.provider),
            endpoint: self.endpoint.clone(),
            batch_size: self.batch_size,
        };
        options.validate()?;

        Ok((origin, options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::options::{LengthUnit, Profile, ProviderKind};
    use serde_json::json;

    #[test]
    fn test_resolve_defaults() {
        let request: IsochroneRequest = serde_json::from_value(json!({
            "origin": { "type": "Point", "coordinates": [8.8071646, 53.0758196] },
            "intervals": [{ "interval": 10 }, { "interval": 20 }]
        }))
        .unwrap();

        let (origin, options) = request.resolve().unwrap();
        assert_eq!(origin, Point::new(8.8071646, 53.0758196));
        assert_eq!(options.intervals, vec![10.0, 20.0]);
        // 120 km/h for 20 minutes
        assert_eq!(options.radius, 40.0);
        assert_eq!(options.cell_size, 0.1);
        assert_eq!(options.unit, LengthUnit::Kilometers);
        assert_eq!(options.profile, Profile::Car);
        assert_eq!(options.provider, ProviderKind::Valhalla);
        assert!(!options.deintersect);
    }

    #[test]
    fn test_resolve_overrides() {
        let request: IsochroneRequest = serde_json::from_value(json!({
            "origin": { "type": "Point", "coordinates": [8.8, 53.07] },
            "intervals": [1, 3, { "interval": 5 }],
            "radius": 5,
            "cellSize": 0.2,
            "units": "miles",
            "lengthThreshold": 0.5,
            "deintersect": true,
            "profile": "foot",
            "provider": "osrm",
            "endpoint": "http://osrm:5000/table/v1/",
            "batchSize": 1000
        }))
        .unwrap();

        let (_, options) = request.resolve().unwrap();
        assert_eq!(options.intervals, vec![1.0, 3.0, 5.0]);
        assert_eq!(options.radius, 5.0);
        assert_eq!(options.cell_size, 0.2);
        assert_eq!(options.unit, LengthUnit::Miles);
        assert_eq!(options.length_threshold, 0.5);
        assert!(options.deintersect);
        assert_eq!(options.profile, Profile::Foot);
        assert_eq!(options.provider, ProviderKind::Osrm);
        assert_eq!(options.endpoint(), "http://osrm:5000/table/v1/");
        assert_eq!(options.batch_size(), 1000);
    }

    #[test]
    fn test_negative_radius_is_derived() {
        let request = IsochroneRequest {
            origin: Some(OriginPoint::new(8.8, 53.07)),
            intervals: vec![IntervalEntry::Minutes(3.0)],
            radius: Some(-1.0),
            ..Default::default()
        };
        let (_, options) = request.resolve().unwrap();
        assert_eq!(options.radius, 6.0);
    }

    #[test]
    fn test_resolve_errors() {
        let missing_origin = IsochroneRequest {
            intervals: vec![IntervalEntry::Minutes(3.0)],
            ..Default::default()
        };
        let err = missing_origin.resolve().unwrap_err();
        assert!(err.to_string().contains("Missing required parameter \"origin\""));

        let no_intervals = IsochroneRequest { origin: Some(OriginPoint::new(8.8, 53.07)), ..Default::default() };
        assert!(no_intervals.resolve().unwrap_err().is_client_error());

        let bad_coordinates: IsochroneRequest = serde_json::from_value(json!({
            "origin": { "type": "Point", "coordinates": ["8.8", 53.07] },
            "intervals": [5]
        }))
        .unwrap();
        assert!(bad_coordinates.resolve().unwrap_err().to_string().contains("Must contain 2 numbers"));

        let typo = IsochroneRequest {
            origin: Some(OriginPoint::new(8.8, 53.07)),
            intervals: vec![IntervalEntry::Minutes(3.0)],
            profile: Some("bicyle".to_string()),
            ..Default::default()
        };
        assert!(typo.resolve().unwrap_err().to_string().contains("Did you mean 'bicycle'?"));

        let negative = IsochroneRequest {
            origin: Some(OriginPoint::new(8.8, 53.07)),
            intervals: vec![IntervalEntry::Minutes(-3.0)],
            ..Default::default()
        };
        assert!(negative.resolve().is_err());
    }
}
