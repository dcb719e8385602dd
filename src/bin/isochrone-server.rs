//! # Isochrone server
//!
//! HTTP front end for the isochrone library.

use std::net::{Ipv4Addr, SocketAddr};

use anyhow::Context;
use clap::Parser;
use isochrone::server::{run_server, ServerState, DEFAULT_PORT};
use isochrone::ProviderKind;

#[derive(Parser)]
#[command(name = "isochrone-server")]
#[command(about = "HTTP API for isochrone computations")]
#[command(version)]
struct Cli {
    /// http-port to listen on (falls back to $PORT, then 3457)
    #[arg(short, long)]
    port: Option<u16>,

    /// OSRM table service, e.g. http://127.0.0.1:5000/table/v1/
    #[arg(long)]
    osrm_endpoint: Option<String>,

    /// Valhalla isochrone service, e.g. http://127.0.0.1:8002/isochrone
    #[arg(long)]
    valhalla_endpoint: Option<String>,
}

fn resolve_port(flag: Option<u16>) -> anyhow::Result<u16> {
    if let Some(port) = flag {
        return Ok(port);
    }
    match std::env::var("PORT") {
        Ok(value) => value
            .parse()
            .with_context(|| format!("Invalid PORT environment variable: {value}")),
        Err(_) => Ok(DEFAULT_PORT),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive("info".parse()?)
                .from_env_lossy(),
        )
        .try_init();

    let cli = Cli::parse();
    let port = resolve_port(cli.port)?;

    let mut state = ServerState::new();
    if let Some(endpoint) = cli.osrm_endpoint {
        state = state.with_endpoint(ProviderKind::Osrm, endpoint);
    }
    if let Some(endpoint) = cli.valhalla_endpoint {
        state = state.with_endpoint(ProviderKind::Valhalla, endpoint);
    }

    run_server(state, SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))).await
}
