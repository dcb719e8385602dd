//! Provider-native isochrone contours from a Valhalla-compatible service

use std::future::Future;

use geo::{Geometry as GeoGeometry, MultiPolygon, Point};
use geojson::FeatureCollection;
use reqwest::Client;
use serde_json::json;

use crate::core::assemble::{time_value, IsochroneFeature, TIME_PROPERTY};
use crate::core::error::{Error, Result};
use crate::core::http::{get_json, GLOBAL_CLIENT};
use crate::core::options::Profile;

/// Property Valhalla uses for the contour's minutes
const CONTOUR_PROPERTY: &str = "contour";

/// One contour request
#[derive(Debug, Clone, Copy)]
pub struct ContourRequest<'a> {
    pub profile: Profile,
    pub origin: Point<f64>,
    /// Minutes, one contour each
    pub intervals: &'a [f64],
}

/// A provider of isochrone polygons
pub trait ContourService {
    fn contours(&self, request: ContourRequest<'_>) -> impl Future<Output = Result<FeatureCollection>> + Send;
}

/// HTTP client for a Valhalla `isochrone` endpoint
#[derive(Debug, Clone)]
pub struct ValhallaClient {
    endpoint: String,
    client: Client,
}

impl ValhallaClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(endpoint, GLOBAL_CLIENT.clone())
    }

    pub fn with_client(endpoint: impl Into<String>, client: Client) -> Self {
        Self { endpoint: endpoint.into(), client }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The `json` query value
    pub fn query(request: &ContourRequest<'_>) -> serde_json::Value {
        let contours: Vec<_> = request
            .intervals
            .iter()
            .map(|&minutes| json!({ "time": time_value(minutes) }))
            .collect();
        json!({
            "locations": [{ "lat": request.origin.y(), "lon": request.origin.x() }],
            "costing": request.profile.valhalla_costing(),
            "contours": contours,
            "polygons": true,
        })
    }
}

impl ContourService for ValhallaClient {
    async fn contours(&self, request: ContourRequest<'_>) -> Result<FeatureCollection> {
        let query = Self::query(&request).to_string();
        log::trace!("GET {}?json={}", self.endpoint, query);
        get_json(self.client.get(&self.endpoint).query(&[("json", query)])).await
    }
}

/// Keep the areal features of a contour response
///
/// Provider properties are kept; `time` is taken from `contour` when absent.
/// A feature with neither is a malformed response.
pub fn contour_features(collection: FeatureCollection) -> Result<Vec<IsochroneFeature>> {
    let mut features = Vec::with_capacity(collection.features.len());
    for feature in collection.features {
        let Some(geometry) = feature.geometry else {
            continue;
        };
        let geometry = GeoGeometry::<f64>::try_from(geometry)
            .map_err(|e| Error::MalformedResponse(format!("invalid contour geometry: {e}")))?;
        let geometry = match geometry {
            GeoGeometry::Polygon(polygon) => MultiPolygon(vec![polygon]),
            GeoGeometry::MultiPolygon(multi) => multi,
            other => {
                log::debug!("skipping non-areal contour geometry {other:?}");
                continue;
            }
        };

        let mut properties = feature.properties.unwrap_or_default();
        if !properties.contains_key(TIME_PROPERTY) {
            let contour = properties
                .get(CONTOUR_PROPERTY)
                .and_then(serde_json::Value::as_f64)
                .ok_or_else(|| {
                    Error::MalformedResponse("contour feature without a time".to_string())
                })?;
            properties.insert(TIME_PROPERTY.to_string(), time_value(contour));
        }

        features.push(IsochroneFeature { geometry, properties });
    }
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn bremen() -> Point<f64> {
        Point::new(8.8071646, 53.0758196)
    }

    fn response() -> serde_json::Value {
        json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": { "contour": 10, "metric": "time", "color": "#bf4040" },
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[8.80, 53.07], [8.82, 53.07], [8.82, 53.09], [8.80, 53.07]]]
                    }
                },
                {
                    "type": "Feature",
                    "properties": { "contour": 5 },
                    "geometry": { "type": "LineString", "coordinates": [[8.80, 53.07], [8.81, 53.08]] }
                },
                {
                    "type": "Feature",
                    "properties": { "contour": 5 },
                    "geometry": {
                        "type": "MultiPolygon",
                        "coordinates": [[[[8.805, 53.075], [8.81, 53.075], [8.81, 53.08], [8.805, 53.075]]]]
                    }
                }
            ]
        })
    }

    #[test]
    fn test_query() {
        let intervals = [5.0, 10.0];
        let query = ValhallaClient::query(&ContourRequest {
            profile: Profile::Foot,
            origin: bremen(),
            intervals: &intervals,
        });
        assert_eq!(
            query,
            json!({
                "locations": [{ "lat": 53.0758196, "lon": 8.8071646 }],
                "costing": "pedestrian",
                "contours": [{ "time": 5 }, { "time": 10 }],
                "polygons": true
            })
        );
    }

    #[test]
    fn test_contour_features() {
        let collection: FeatureCollection = serde_json::from_value(response()).unwrap();
        let features = contour_features(collection).unwrap();

        assert_eq!(features.len(), 2);
        assert_eq!(features[0].time(), Some(10.0));
        assert_eq!(features[0].properties["metric"], "time");
        assert_eq!(features[1].time(), Some(5.0));
        assert_eq!(features[1].geometry.0.len(), 1);
    }

    #[test]
    fn test_contour_without_time() {
        let collection: FeatureCollection = serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {},
                "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]] }
            }]
        }))
        .unwrap();
        assert!(matches!(contour_features(collection), Err(Error::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_contours_request() {
        let server = MockServer::start().await;
        let intervals = [10.0];
        let request = ContourRequest { profile: Profile::Car, origin: bremen(), intervals: &intervals };
        let expected_query = ValhallaClient::query(&request).to_string();

        Mock::given(method("GET"))
            .and(path("/isochrone"))
            .and(query_param("json", expected_query.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(response()))
            .expect(1)
            .mount(&server)
            .await;

        let client = ValhallaClient::new(format!("{}/isochrone", server.uri()));
        let collection = client.contours(request).await.unwrap();
        assert_eq!(collection.features.len(), 3);
    }

    #[tokio::test]
    async fn test_contours_bad_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error_code": 171})))
            .mount(&server)
            .await;

        let client = ValhallaClient::new(format!("{}/isochrone", server.uri()));
        let err = client
            .contours(ContourRequest { profile: Profile::Car, origin: bremen(), intervals: &[5.0] })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::HttpStatus { status: 400, .. }));
    }
}
