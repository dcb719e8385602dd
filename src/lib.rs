//! # Isochrone Library
//!
//! Computes isochrones, the areas reachable from an origin within given travel
//! times, as a GeoJSON FeatureCollection.
//!
//! ## Features
//!
//! - **Two providers**: OSRM travel-time matrices over a probe grid, or
//!   Valhalla's native isochrone contours
//! - **Request batching**: large grids are split into sequential table requests
//!   and merged back in order
//! - **Concave hulls**: one polygon per interval band
//! - **Deintersection**: optional mutually exclusive bands
//! - **Pluggable backends**: any `TableService` or `ContourService`
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use isochrone::{IsochroneOptions, ProviderKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = IsochroneOptions {
//!         radius: 5.0,
//!         cell_size: 0.2,
//!         intervals: vec![1.0, 3.0, 5.0],
//!         provider: ProviderKind::Osrm,
//!         deintersect: true,
//!         ..Default::default()
//!     };
//!
//!     let collection = isochrone::isochrone(geo::Point::new(8.8071646, 53.0758196), &options).await?;
//!     println!("{}", collection.features.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Custom Providers
//!
//! ```rust,no_run
//! use isochrone::{Isochrone, IsochroneOptions, OsrmClient, RoutingProvider, ValhallaClient};
//! use isochrone::core::provider::MatrixStrategy;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let provider: RoutingProvider<OsrmClient, ValhallaClient> =
//!     RoutingProvider::Matrix(MatrixStrategy::new(OsrmClient::new("http://osrm:5000/table/v1/")));
//! let engine = Isochrone::new(provider).with_progress(std::sync::Arc::new(|done, total| {
//!     eprintln!("{done}/{total} requests");
//! }));
//! # let options = IsochroneOptions::default();
//! let collection = engine.compute(geo::Point::new(8.8, 53.07), &options).await?;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod request;
pub mod server;

// Re-export core types that users might need
pub use crate::core::batch::ProgressCallback;
pub use crate::core::contour::{ContourService, ValhallaClient};
pub use crate::core::engine::Isochrone;
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::matrix::{OsrmClient, RoutingMatrix, TableService};
pub use crate::core::options::{IsochroneOptions, LengthUnit, Profile, ProviderKind};
pub use crate::core::provider::{RoutingProvider, RoutingResult};
pub use crate::request::IsochroneRequest;

/// Compute isochrones with the HTTP provider named in the options
///
/// # Examples
/// ```rust,no_run
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let options = isochrone::IsochroneOptions {
///     intervals: vec![10.0, 20.0],
///     ..Default::default()
/// };
/// let collection = isochrone::isochrone(geo::Point::new(13.38, 52.52), &options).await?;
/// # Ok(())
/// # }
/// ```
pub async fn isochrone(origin: geo::Point<f64>, options: &IsochroneOptions) -> Result<geojson::FeatureCollection> {
    Isochrone::from_options(options).compute(origin, options).await
}
