//! One-to-many travel-time matrices from an OSRM-compatible table service
//!
//! The wire format is OSRM's `table/v1` response. `RoutingMatrix` is used both
//! for a single request and for the merged result of a batch.

use std::future::Future;

use geo::{Coord, Point};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};
use crate::core::http::{get_json, GLOBAL_CLIENT};
use crate::core::options::Profile;

/// Provider success code
pub const CODE_OK: &str = "Ok";

/// A snapped source or destination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Snapped location [lon, lat]
    pub location: [f64; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Distance from the requested coordinate to the snapped one, in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl Waypoint {
    pub fn coord(&self) -> Coord<f64> {
        Coord { x: self.location[0], y: self.location[1] }
    }
}

/// Travel-time matrix as returned by the table service
///
/// `destinations[i]` and `durations[0][i]` describe the same point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingMatrix {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub sources: Vec<Waypoint>,
    #[serde(default)]
    pub destinations: Vec<Waypoint>,
    /// Row-major durations in seconds, `None` where unreachable
    #[serde(default)]
    pub durations: Vec<Vec<Option<f64>>>,
}

impl RoutingMatrix {
    pub fn is_ok(&self) -> bool {
        self.code == CODE_OK
    }

    /// Durations from the single source, aligned with `destinations`
    pub fn travel_times(&self) -> &[Option<f64>] {
        self.durations.first().map(Vec::as_slice).unwrap_or(&[])
    }
}

/// One table request: the origin as source 0 followed by a slice of destinations
#[derive(Debug, Clone, Copy)]
pub struct TableRequest<'a> {
    pub profile: Profile,
    pub origin: Point<f64>,
    pub destinations: &'a [Coord<f64>],
}

/// A provider of one-to-many travel times
///
/// Implemented over HTTP by [`OsrmClient`]; tests and in-process routers can
/// implement it directly.
pub trait TableService {
    /// Travel times from `request.origin` to itself and every destination
    fn table(&self, request: TableRequest<'_>) -> impl Future<Output = Result<RoutingMatrix>> + Send;
}

/// Check that the origin can be sent to the table service
pub fn validate_origin(origin: Point<f64>) -> Result<()> {
    if !origin.x().is_finite() || !origin.y().is_finite() {
        return Err(Error::InvalidInput(
            "The origin has an invalid type for the coordinates.".to_string(),
        ));
    }
    if !is_signed_decimal(&origin.x().to_string()) {
        return Err(Error::InvalidInput(
            "The longitude of the origin is invalid.".to_string(),
        ));
    }
    if !(-90.0..=90.0).contains(&origin.y()) {
        return Err(Error::InvalidInput(
            "The latitude of the origin is out of range.".to_string(),
        ));
    }
    Ok(())
}

/// `-?\d{1,3}(\.\d+)?`
fn is_signed_decimal(text: &str) -> bool {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };
    let integer_ok = (1..=3).contains(&integer.len()) && integer.bytes().all(|b| b.is_ascii_digit());
    let fraction_ok = fraction.map_or(true, |f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()));
    integer_ok && fraction_ok
}

/// `lon,lat` with six decimals (about 0.1 m)
fn format_coordinate(c: Coord<f64>) -> String {
    format!("{:.6},{:.6}", c.x, c.y)
}

/// HTTP client for an OSRM table service
#[derive(Debug, Clone)]
pub struct OsrmClient {
    endpoint: String,
    client: Client,
}

impl OsrmClient {
    /// Client for an endpoint such as `http://127.0.0.1:5000/table/v1/`
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(endpoint, GLOBAL_CLIENT.clone())
    }

    pub fn with_client(endpoint: impl Into<String>, client: Client) -> Self {
        let mut endpoint = endpoint.into();
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }
        Self { endpoint, client }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// `{endpoint}{profile}/{origin};{destinations}?sources=0`
    pub fn table_url(&self, request: &TableRequest<'_>) -> String {
        let mut url = format!(
            "{}{}/{}",
            self.endpoint,
            request.profile,
            format_coordinate(request.origin.0)
        );
        for destination in request.destinations {
            url.push(';');
            url.push_str(&format_coordinate(*destination));
        }
        url.push_str("?sources=0");
        url
    }
}

impl TableService for OsrmClient {
    async fn table(&self, request: TableRequest<'_>) -> Result<RoutingMatrix> {
        validate_origin(request.origin)?;
        let url = self.table_url(&request);
        log::trace!("GET {} ({} destinations)", self.endpoint, request.destinations.len());
        get_json(self.client.get(url)).await
    }
}
