//! Isochrone computation

use geo::Point;
use geojson::FeatureCollection;

use crate::core::assemble::{sort_outermost_first, to_feature_collection};
use crate::core::batch::ProgressCallback;
use crate::core::classify::group_by_interval;
use crate::core::contour::{ContourService, ValhallaClient};
use crate::core::deintersect::deintersect;
use crate::core::error::{Error, Result};
use crate::core::hull::{build_hulls, HullOptions};
use crate::core::matrix::{validate_origin, OsrmClient, TableService};
use crate::core::options::IsochroneOptions;
use crate::core::provider::{RoutingProvider, RoutingResult};

/// Isochrone engine over a routing provider
///
/// Matrix providers go through grid, batched table requests, interval bands
/// and concave hulls; contour providers return polygons directly. Both paths
/// end with optional deintersection and right-hand-rule GeoJSON output,
/// largest interval first.
pub struct Isochrone<T = OsrmClient, C = ValhallaClient> {
    provider: RoutingProvider<T, C>,
}

impl Isochrone {
    /// Engine for the HTTP provider named in the options
    pub fn from_options(options: &IsochroneOptions) -> Self {
        Self::new(RoutingProvider::from_options(options))
    }
}

impl<T: TableService, C: ContourService> Isochrone<T, C> {
    pub fn new(provider: RoutingProvider<T, C>) -> Self {
        Self { provider }
    }

    /// Report matrix request progress as (completed, total)
    pub fn with_progress(self, progress: ProgressCallback) -> Self {
        Self { provider: self.provider.with_progress(progress) }
    }

    pub fn provider(&self) -> &RoutingProvider<T, C> {
        &self.provider
    }

    /// Compute the isochrones for `origin`
    ///
    /// Options and origin are checked before any request is made.
    pub async fn compute(&self, origin: Point<f64>, options: &IsochroneOptions) -> Result<FeatureCollection> {
        options.validate()?;
        validate_origin(origin)?;

        let mut features = match self.provider.resolve(origin, options).await? {
            RoutingResult::Matrix(matrix) => {
                if !matrix.is_ok() {
                    return Err(Error::Provider { code: matrix.code, message: matrix.message });
                }
                let bands = group_by_interval(&matrix, &options.sorted_intervals());
                let mut features = build_hulls(
                    &bands,
                    HullOptions {
                        concavity: options.concavity,
                        length_threshold: options.length_threshold,
                    },
                )?;
                features.reverse();
                features
            }
            RoutingResult::Contours(mut features) => {
                sort_outermost_first(&mut features);
                features
            }
        };

        if options.deintersect && features.len() > 1 {
            features = deintersect(features);
        }

        log::debug!("{} isochrone feature(s)", features.len());
        Ok(to_feature_collection(features))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::contour::ContourRequest;
    use crate::core::matrix::{RoutingMatrix, TableRequest};
    use crate::core::options::ProviderKind;
    use crate::core::provider::{ContourStrategy, MatrixStrategy};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Reports a provider failure on every call
    #[derive(Default)]
    struct FailingTable {
        calls: AtomicUsize,
    }

    impl TableService for FailingTable {
        async fn table(&self, _request: TableRequest<'_>) -> Result<RoutingMatrix> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(RoutingMatrix {
                code: "TooBig".to_string(),
                message: Some("Too many table coordinates".to_string()),
                sources: Vec::new(),
                destinations: Vec::new(),
                durations: Vec::new(),
            })
        }
    }

    struct NestedContours;

    impl ContourService for NestedContours {
        async fn contours(&self, _request: ContourRequest<'_>) -> Result<FeatureCollection> {
            // Valhalla lists the smallest contour last, this one lists it first
            Ok(serde_json::from_value(serde_json::json!({
                "type": "FeatureCollection",
                "features": [
                    {
                        "type": "Feature",
                        "properties": { "contour": 5 },
                        "geometry": { "type": "Polygon", "coordinates": [[[4, 4], [6, 4], [6, 6], [4, 6], [4, 4]]] }
                    },
                    {
                        "type": "Feature",
                        "properties": { "contour": 10 },
                        "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]]] }
                    }
                ]
            }))
            .unwrap())
        }
    }

    fn osrm_options() -> IsochroneOptions {
        IsochroneOptions {
            radius: 1.0,
            cell_size: 0.5,
            intervals: vec![1.0],
            provider: ProviderKind::Osrm,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_provider_code_is_error() {
        let engine: Isochrone<FailingTable, NestedContours> =
            Isochrone::new(RoutingProvider::Matrix(MatrixStrategy::new(FailingTable::default())));
        let err = engine.compute(Point::new(8.8, 53.07), &osrm_options()).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Routing provider returned code 'TooBig': Too many table coordinates"
        );
        match err {
            Error::Provider { code, message } => {
                assert_eq!(code, "TooBig");
                assert_eq!(message.as_deref(), Some("Too many table coordinates"));
            }
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_validation_before_requests() {
        let table = FailingTable::default();
        let engine: Isochrone<FailingTable, NestedContours> =
            Isochrone::new(RoutingProvider::Matrix(MatrixStrategy::new(table)));

        let no_intervals = IsochroneOptions { intervals: vec![], ..osrm_options() };
        assert!(engine.compute(Point::new(8.8, 53.07), &no_intervals).await.unwrap_err().is_client_error());

        let bad_origin = engine.compute(Point::new(8.8, 95.0), &osrm_options()).await;
        assert!(bad_origin.unwrap_err().is_client_error());

        match engine.provider() {
            RoutingProvider::Matrix(strategy) => assert_eq!(strategy.service.calls.load(Ordering::SeqCst), 0),
            RoutingProvider::Contour(_) => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_contours_outermost_first_and_deintersected() {
        let engine: Isochrone<FailingTable, NestedContours> =
            Isochrone::new(RoutingProvider::Contour(ContourStrategy::new(NestedContours)));
        let options = IsochroneOptions { intervals: vec![5.0, 10.0], deintersect: true, ..Default::default() };

        let collection = engine.compute(Point::new(5.0, 5.0), &options).await.unwrap();
        let times: Vec<_> = collection
            .features
            .iter()
            .map(|f| f.properties.as_ref().unwrap()["time"].as_f64().unwrap())
            .collect();
        assert_eq!(times, vec![10.0, 5.0]);

        // the outer band has the inner one cut out
        let outer: geo::Polygon<f64> = collection.features[0].geometry.clone().unwrap().value.try_into().unwrap();
        assert_eq!(outer.interiors().len(), 1);
    }
}
