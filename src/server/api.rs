//! HTTP API handlers with Axum and Utoipa

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::{OpenApi, ToSchema};

use crate::core::options::ProviderKind;
use crate::request::{IntervalEntry, IsochroneRequest, OriginPoint};

use super::state::{load_average, ServerState};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(list_providers, status, get_isochrone, post_isochrone, health),
    components(schemas(IsochroneRequest, OriginPoint, IntervalEntry, ProvidersResponse, ErrorResponse)),
    info(
        title = "Isochrone API",
        description = "Isochrone polygons from OSRM travel-time matrices or Valhalla contours"
    )
)]
struct ApiDoc;

/// Build the Axum router
pub fn build_router(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api-docs/openapi.json", get(openapi))
        .route("/api/providers/list", get(list_providers))
        .route("/api/status", get(status))
        .route("/api/", get(get_isochrone).post(post_isochrone))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============ Errors ============

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// HTTP status code
    #[schema(example = 400)]
    pub code: u16,
    /// HTTP reason phrase
    #[schema(example = "Bad Request")]
    pub status: String,
    pub message: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = ErrorResponse {
        code: status.as_u16(),
        status: status.canonical_reason().unwrap_or_default().to_string(),
        message: message.into(),
    };
    (status, Json(body)).into_response()
}

fn bad_request(message: impl Into<String>) -> Response {
    error_response(StatusCode::BAD_REQUEST, message)
}

// ============ Providers ============

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProvidersResponse {
    #[schema(example = json!(["osrm", "valhalla"]))]
    pub providers: Vec<String>,
    #[schema(example = "valhalla")]
    pub default: String,
}

/// List the supported routing providers
#[utoipa::path(
    get,
    path = "/api/providers/list",
    responses((status = 200, description = "Supported providers", body = ProvidersResponse)),
    tag = "isochrone"
)]
async fn list_providers() -> Json<ProvidersResponse> {
    Json(ProvidersResponse {
        providers: ProviderKind::NAMES.iter().map(|name| name.to_string()).collect(),
        default: ProviderKind::default().to_string(),
    })
}

// ============ Status ============

#[derive(Debug, Deserialize)]
struct StatusQuery {
    provider: Option<String>,
}

/// Provider data date, machine load and task counters
#[utoipa::path(
    get,
    path = "/api/status",
    params(("provider" = Option<String>, Query, description = "osrm or valhalla")),
    responses(
        (status = 200, description = "Service status"),
        (status = 400, description = "Unknown provider", body = ErrorResponse)
    ),
    tag = "isochrone"
)]
async fn status(State(state): State<Arc<ServerState>>, Query(query): Query<StatusQuery>) -> Response {
    let provider = match query.provider.as_deref().map(str::parse::<ProviderKind>).transpose() {
        Ok(provider) => provider.unwrap_or_default(),
        Err(e) => return bad_request(e.to_string()),
    };

    let mut data = serde_json::Map::new();
    if let Ok(date) = std::env::var(provider.data_date_env()) {
        data.insert("date".to_string(), date.into());
    }

    Json(serde_json::json!({
        "data": data,
        "machine": { "load-average": load_average() },
        "service": {
            "running-tasks": state.tasks.running(),
            "total-tasks": state.tasks.total(),
        }
    }))
    .into_response()
}

// ============ Isochrone ============

/// Compute isochrones from query parameters
#[utoipa::path(
    get,
    path = "/api/",
    params(
        ("latitude" = f64, Query, description = "Origin latitude"),
        ("longitude" = f64, Query, description = "Origin longitude"),
        ("intervals" = String, Query, description = "Comma separated minutes, e.g. 1,3,5"),
        ("cell_size" = Option<f64>, Query, description = "Grid spacing in kilometers"),
        ("radius" = Option<f64>, Query, description = "Grid radius in kilometers, -1 derives it"),
        ("deintersect" = Option<String>, Query, description = "1, true, yes, on or empty to enable"),
        ("provider" = Option<String>, Query, description = "osrm or valhalla"),
        ("profile" = Option<String>, Query, description = "car, bicycle or foot"),
    ),
    responses(
        (status = 200, description = "GeoJSON FeatureCollection, largest interval first"),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 500, description = "Provider or geometry failure", body = ErrorResponse),
        (status = 504, description = "Computation exceeded the deadline", body = ErrorResponse)
    ),
    tag = "isochrone"
)]
async fn get_isochrone(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    match parse_query(&query) {
        Ok(request) => run(&state, request).await,
        Err(message) => bad_request(message),
    }
}

/// Compute isochrones from a JSON body
#[utoipa::path(
    post,
    path = "/api/",
    request_body = IsochroneRequest,
    responses(
        (status = 200, description = "GeoJSON FeatureCollection, largest interval first"),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Provider or geometry failure", body = ErrorResponse),
        (status = 504, description = "Computation exceeded the deadline", body = ErrorResponse)
    ),
    tag = "isochrone"
)]
async fn post_isochrone(State(state): State<Arc<ServerState>>, body: Bytes) -> Response {
    match serde_json::from_slice::<IsochroneRequest>(&body) {
        Ok(request) => run(&state, request).await,
        Err(e) => bad_request(format!("Invalid request body: {e}")),
    }
}

/// Resolve, count and compute one request
async fn run(state: &ServerState, request: IsochroneRequest) -> Response {
    let (origin, mut options) = match request.resolve() {
        Ok(resolved) => resolved,
        Err(e) => return bad_request(e.to_string()),
    };
    // clients choose the provider, never its address
    options.endpoint = state.endpoint(options.provider).map(str::to_string);

    let _task = state.tasks.start();
    match tokio::time::timeout(state.deadline, crate::isochrone(origin, &options)).await {
        Ok(Ok(collection)) => Json(collection).into_response(),
        Ok(Err(e)) if e.is_client_error() => bad_request(e.to_string()),
        Ok(Err(e)) => {
            tracing::warn!("isochrone computation failed: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
        Err(_) => {
            tracing::warn!("isochrone computation exceeded {:?}", state.deadline);
            error_response(
                StatusCode::GATEWAY_TIMEOUT,
                format!("Computation exceeded {} seconds", state.deadline.as_secs()),
            )
        }
    }
}

/// Query parameters into a request, with the messages clients expect
pub fn parse_query(query: &HashMap<String, String>) -> Result<IsochroneRequest, String> {
    let param = |name: &str| query.get(name).map(String::as_str).filter(|v| !v.is_empty());

    let latitude = param("latitude").ok_or("Missing required parameter \"latitude\"")?;
    let longitude = param("longitude").ok_or("Missing required parameter \"longitude\"")?;
    let latitude: f64 = latitude
        .trim()
        .parse()
        .map_err(|_| format!("Invalid \"latitude\" value => {latitude}"))?;
    let longitude: f64 = longitude
        .trim()
        .parse()
        .map_err(|_| format!("Invalid \"longitude\" value => {longitude}"))?;

    let deintersect = matches!(
        query.get("deintersect").map(String::as_str),
        Some("1" | "true" | "yes" | "on" | "")
    );

    let cell_size = match param("cell_size") {
        Some(raw) => {
            let cell_size: f64 = raw
                .trim()
                .parse()
                .map_err(|_| format!("Invalid \"cell_size\" value => {raw}"))?;
            if cell_size <= 0.0 {
                return Err(format!(
                    "Invalid \"cell_size\" value => {cell_size}. It must be greater than 0."
                ));
            }
            cell_size
        }
        None => 0.1,
    };

    let radius = match param("radius") {
        Some(raw) => {
            let radius: f64 = raw
                .trim()
                .parse()
                .map_err(|_| format!("Invalid \"radius\" value => {raw}"))?;
            if radius < -1.0 {
                return Err(format!(
                    "Invalid \"radius\" value => {radius}. It must be greater than 0."
                ));
            }
            radius
        }
        None => -1.0,
    };

    let raw_intervals = param("intervals").ok_or("Missing required parameter \"intervals\"")?;
    let intervals = raw_intervals
        .split(',')
        .enumerate()
        .map(|(i, raw)| {
            raw.trim()
                .parse::<f64>()
                .map(|interval| IntervalEntry::Wrapped { interval })
                .map_err(|_| format!("invalid interval[{}] => {raw}", i + 1))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(IsochroneRequest {
        origin: Some(OriginPoint::new(longitude, latitude)),
        intervals,
        radius: Some(radius),
        cell_size: Some(cell_size),
        deintersect: Some(deintersect),
        provider: param("provider").map(str::to_string),
        profile: param("profile").map(str::to_string),
        ..Default::default()
    })
}

// ============ Health ============

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Server is healthy"))
)]
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn openapi() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
