//! Core library modules for isochrone
//!
//! Grid construction, provider access, batching, classification, hull
//! building, deintersection and GeoJSON assembly.

pub mod assemble;
pub mod batch;
pub mod classify;
pub mod contour;
pub mod deintersect;
pub mod engine;
pub mod error;
pub mod grid;
pub(crate) mod http;
pub mod hull;
pub mod matrix;
pub mod options;
pub mod provider;

// Re-export main types for internal use
pub use engine::Isochrone;
pub use provider::{RoutingProvider, RoutingResult};
