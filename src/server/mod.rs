//! HTTP server for isochrone computations
//!
//! - `GET /api/providers/list`: supported providers
//! - `GET /api/status`: data date, load average and task counters
//! - `GET /api/`: isochrones from query parameters
//! - `POST /api/`: isochrones from an `IsochroneRequest` body
//! - `GET /health`, `GET /api-docs/openapi.json`

pub mod api;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

pub use api::build_router;
pub use state::{ServerState, TaskCounter, TaskGuard, API_TIMEOUT};

/// Port used when neither `--port` nor `PORT` is set
pub const DEFAULT_PORT: u16 = 3457;

/// Serve the API until the process is stopped
pub async fn run_server(state: ServerState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = build_router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("isochrone server listening on http://{}", listener.local_addr()?);
    tracing::info!("OpenAPI document at http://{}/api-docs/openapi.json", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
