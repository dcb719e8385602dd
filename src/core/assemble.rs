//! Isochrone features and their GeoJSON emission

use geo::orient::{Direction, Orient};
use geo::MultiPolygon;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};

/// Property holding the interval in minutes
pub const TIME_PROPERTY: &str = "time";

/// One isochrone band
#[derive(Debug, Clone, PartialEq)]
pub struct IsochroneFeature {
    pub geometry: MultiPolygon<f64>,
    pub properties: JsonObject,
}

impl IsochroneFeature {
    /// Feature whose only property is `time`
    pub fn new(time: f64, geometry: MultiPolygon<f64>) -> Self {
        let mut properties = JsonObject::new();
        properties.insert(TIME_PROPERTY.to_string(), time_value(time));
        Self { geometry, properties }
    }

    /// The band's interval in minutes
    pub fn time(&self) -> Option<f64> {
        self.properties.get(TIME_PROPERTY).and_then(serde_json::Value::as_f64)
    }
}

/// Whole minutes are emitted as integers
pub(crate) fn time_value(time: f64) -> serde_json::Value {
    if time.fract() == 0.0 && time.abs() < 9_007_199_254_740_992.0 {
        serde_json::Value::from(time as i64)
    } else {
        serde_json::Value::from(time)
    }
}

/// Largest interval first, the order the deintersector and renderers expect
///
/// Features without a `time` keep their relative position at the end.
pub fn sort_outermost_first(features: &mut [IsochroneFeature]) {
    features.sort_by(|a, b| match (a.time(), b.time()) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

/// Wrap features into a collection with right-hand-rule winding
///
/// Exterior rings become counter-clockwise and holes clockwise. A single
/// polygon is written as `Polygon`, anything else as `MultiPolygon`.
pub fn to_feature_collection(features: Vec<IsochroneFeature>) -> FeatureCollection {
    let features = features
        .into_iter()
        .map(|feature| {
            let oriented = feature.geometry.orient(Direction::Default);
            let value = match oriented.0.as_slice() {
                [polygon] => Value::from(polygon),
                _ => Value::from(&oriented),
            };
            Feature {
                bbox: None,
                geometry: Some(Geometry::new(value)),
                id: None,
                properties: Some(feature.properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
