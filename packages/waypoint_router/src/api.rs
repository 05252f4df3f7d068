//! HTTP interface for the service. Every route endpoint funnels into the
//! same pipeline, differing only in the options passed to it.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tokio::task::JoinError;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::common::config::{RouteOptions, ServiceConfig, UserRouteOptions};
use crate::common::error::RoutingError;
use crate::loading::petgraph::GraphStore;
use crate::pipeline::{RouteResponse, compute_route};
use crate::routing::strategy::RouteStrategy;

/// Shared, read-only state handed to every request
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<GraphStore>,
    pub config: Arc<ServiceConfig>,
}

/// Failures which can end a request
#[derive(Debug)]
pub enum ApiError {
    Routing(RoutingError),
    Worker(JoinError),
}

impl From<RoutingError> for ApiError {
    fn from(err: RoutingError) -> Self {
        ApiError::Routing(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Routing(RoutingError::MalformedInput(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Routing(RoutingError::MalformedInput(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, msg) = match self {
            ApiError::Routing(err) => {
                if err.is_internal() {
                    error!(error = %err, "internal routing failure");
                } else {
                    warn!(error = %err, "route request rejected");
                }
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            ApiError::Worker(err) => {
                error!(error = %err, "route worker did not complete");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "route computation was interrupted".to_string(),
                )
            }
        };

        (code, Json(json!({ "error": msg }))).into_response()
    }
}

/// Build the router with every endpoint, plus CORS and request tracing
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/healthcheck", get(health_check))
        .route("/route", post(get_route))
        .route("/route/optimal", post(get_optimal_route))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    let msg = "Service is running";

    let json_response = json!({
        "status": "success",
        "message": msg
    });

    Json(json_response)
}

/// Routing is CPU bound, so it runs on the blocking pool rather than on the
/// async executor
async fn run_pipeline(
    state: AppState,
    raw: Vec<String>,
    options: RouteOptions,
) -> Result<Json<RouteResponse>, ApiError> {
    let result = tokio::task::spawn_blocking(move || {
        compute_route(&state.store, &state.config, &raw, &options)
    })
    .await
    .map_err(ApiError::Worker)?;

    Ok(Json(result?))
}

/// Compute a route through the provided waypoints, using the strategy and
/// outputs requested in the query string
async fn get_route(
    State(state): State<AppState>,
    query: Result<Query<UserRouteOptions>, QueryRejection>,
    body: Result<Json<Vec<String>>, JsonRejection>,
) -> Result<Json<RouteResponse>, ApiError> {
    let Query(user_options) = query?;
    let Json(raw) = body?;

    let options = RouteOptions::try_from(user_options)?;

    run_pipeline(state, raw, options).await
}

/// Compute a provably optimal route through the provided waypoints. Any
/// strategy in the query string is ignored
async fn get_optimal_route(
    State(state): State<AppState>,
    query: Result<Query<UserRouteOptions>, QueryRejection>,
    body: Result<Json<Vec<String>>, JsonRejection>,
) -> Result<Json<RouteResponse>, ApiError> {
    let Query(user_options) = query?;
    let Json(raw) = body?;

    let mut options = RouteOptions::try_from(UserRouteOptions {
        strategy: None,
        include: user_options.include,
    })?;
    options.strategy = RouteStrategy::ExactFlowOptimization;

    run_pipeline(state, raw, options).await
}
