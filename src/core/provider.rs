//! Routing provider dispatch
//!
//! A provider is either a travel-time matrix service, queried over a probe
//! grid, or a contour service that draws the isochrones itself.

use geo::{Coord, Point};

use crate::core::assemble::IsochroneFeature;
use crate::core::batch::{fetch_matrix, ProgressCallback};
use crate::core::contour::{contour_features, ContourRequest, ContourService, ValhallaClient};
use crate::core::error::Result;
use crate::core::grid::build_grid;
use crate::core::matrix::{OsrmClient, RoutingMatrix, TableService};
use crate::core::options::{IsochroneOptions, ProviderKind};

/// Grid plus batched table requests
pub struct MatrixStrategy<T> {
    pub service: T,
    pub progress: Option<ProgressCallback>,
}

impl<T: TableService> MatrixStrategy<T> {
    pub fn new(service: T) -> Self {
        Self { service, progress: None }
    }

    /// Report (completed, total) after each merged request
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    async fn resolve(&self, origin: Point<f64>, options: &IsochroneOptions) -> Result<RoutingMatrix> {
        options.validate_grid()?;
        let grid = build_grid(origin, options.radius, options.cell_size, options.unit);

        let mut coordinates: Vec<Coord<f64>> = Vec::with_capacity(grid.len() + 1);
        coordinates.push(origin.0);
        coordinates.extend(grid);

        fetch_matrix(
            &self.service,
            options.profile,
            &coordinates,
            options.batch_size(),
            self.progress.as_ref(),
        )
        .await
    }
}

/// A single contour request for all intervals
pub struct ContourStrategy<C> {
    pub service: C,
}

impl<C: ContourService> ContourStrategy<C> {
    pub fn new(service: C) -> Self {
        Self { service }
    }

    async fn resolve(&self, origin: Point<f64>, options: &IsochroneOptions) -> Result<Vec<IsochroneFeature>> {
        let intervals = options.sorted_intervals();
        let collection = self
            .service
            .contours(ContourRequest {
                profile: options.profile,
                origin,
                intervals: &intervals,
            })
            .await?;
        contour_features(collection)
    }
}

/// What a provider hands back to the engine
#[derive(Debug, Clone, PartialEq)]
pub enum RoutingResult {
    /// Merged travel times, still to be classified and hulled
    Matrix(RoutingMatrix),
    /// Finished polygons from the provider
    Contours(Vec<IsochroneFeature>),
}

/// Provider selected by `ProviderKind`
pub enum RoutingProvider<T = OsrmClient, C = ValhallaClient> {
    Matrix(MatrixStrategy<T>),
    Contour(ContourStrategy<C>),
}

impl RoutingProvider {
    /// HTTP provider for `options.provider` at `options.endpoint()`
    pub fn from_options(options: &IsochroneOptions) -> Self {
        let endpoint = options.endpoint();
        match options.provider {
            ProviderKind::Osrm => RoutingProvider::Matrix(MatrixStrategy::new(OsrmClient::new(endpoint))),
            ProviderKind::Valhalla => {
                RoutingProvider::Contour(ContourStrategy::new(ValhallaClient::new(endpoint)))
            }
        }
    }
}

impl<T: TableService, C: ContourService> RoutingProvider<T, C> {
    /// Query the provider for `origin`
    pub async fn resolve(&self, origin: Point<f64>, options: &IsochroneOptions) -> Result<RoutingResult> {
        match self {
            RoutingProvider::Matrix(strategy) => strategy.resolve(origin, options).await.map(RoutingResult::Matrix),
            RoutingProvider::Contour(strategy) => {
                strategy.resolve(origin, options).await.map(RoutingResult::Contours)
            }
        }
    }

    /// Attach a progress callback; contour providers make a single request and ignore it
    pub fn with_progress(self, progress: ProgressCallback) -> Self {
        match self {
            RoutingProvider::Matrix(strategy) => RoutingProvider::Matrix(strategy.with_progress(progress)),
            contour => contour,
        }
    }

    pub fn is_matrix(&self) -> bool {
        matches!(self, RoutingProvider::Matrix(_))
    }
}
