// src/transport/rest.rs - REST API Transport Layer
//! HTTP/JSON endpoints over [`TradeClient`]
//!
//! Handlers are thin: they parse the request, call the client and map
//! [`OmsError`] onto a status code. Records are serialized field-for-field.
//!
//! | Method | Path               | Operation                     |
//! |--------|--------------------|-------------------------------|
//! | POST   | `/orders`          | [`TradeClient::submit_order`] |
//! | GET    | `/orders`          | [`TradeClient::list_orders`]  |
//! | GET    | `/orders/:id`      | [`TradeClient::get_order`]    |
//! | DELETE | `/orders/:id`      | [`TradeClient::cancel_order`] |
//! | GET    | `/executions`      | [`TradeClient::list_executions`] |
//! | GET    | `/executions/:id`  | [`TradeClient::get_execution`]   |
//! | GET    | `/sessions`        | [`TradeClient::sessions`]     |
//! | GET    | `/health`          | liveness and counts           |

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{future::Future, net::SocketAddr, sync::Arc, time::Instant};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, instrument, warn, Level};

use crate::{
    core::{
        execution::Execution,
        order::{Order, OrderRequest},
        types::{ExecutionId, OrderId},
    },
    engine::TradeClient,
    OmsError, ServerConfig,
};

/// API server state shared across handlers
#[derive(Debug, Clone)]
pub struct ApiState {
    /// Client the handlers delegate to
    pub client: Arc<TradeClient>,
    /// Server start time, for uptime
    pub start_time: Instant,
}

impl ApiState {
    /// State wrapping `client`, started now
    pub fn new(client: Arc<TradeClient>) -> Self {
        Self {
            client,
            start_time: Instant::now(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `healthy` when the server answers
    pub status: String,
    /// Seconds since the server started
    pub uptime_seconds: u64,
    /// Crate version
    pub version: String,
    /// Established sessions
    pub sessions: usize,
    /// Orders in the registry
    pub orders: usize,
    /// Executions in the registry
    pub executions: usize,
    /// Response time
    pub timestamp: DateTime<Utc>,
}

/// Error body returned with every non-2xx status
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error
    pub error: String,
    /// Response time
    pub timestamp: DateTime<Utc>,
}

/// Create REST API router
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/orders", get(list_orders).post(submit_order))
        .route("/orders/:id", get(get_order).delete(cancel_order))
        .route("/executions", get(list_executions))
        .route("/executions/:id", get(get_execution))
        .route("/sessions", get(list_sessions))
        .route("/health", get(health_check))
        .with_state(state)
}

// ===== Order Endpoints =====

/// Submit a new order
#[instrument(skip(state, request))]
async fn submit_order(
    State(state): State<ApiState>,
    Json(request): Json<OrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let order = state.client.submit_order(request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// List all orders
async fn list_orders(State(state): State<ApiState>) -> Json<Vec<Order>> {
    Json(state.client.list_orders())
}

/// Get order by ID
async fn get_order(
    State(state): State<ApiState>,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>, ApiError> {
    Ok(Json(state.client.get_order(id)?))
}

/// Request cancellation of an order
#[instrument(skip(state))]
async fn cancel_order(
    State(state): State<ApiState>,
    Path(id): Path<OrderId>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let order = state.client.cancel_order(id).await?;
    Ok((StatusCode::ACCEPTED, Json(order)))
}

// ===== Execution Endpoints =====

async fn list_executions(State(state): State<ApiState>) -> Json<Vec<Execution>> {
    Json(state.client.list_executions())
}

async fn get_execution(
    State(state): State<ApiState>,
    Path(id): Path<ExecutionId>,
) -> Result<Json<Execution>, ApiError> {
    Ok(Json(state.client.get_execution(id)?))
}

// ===== System Endpoints =====

/// Established session names
async fn list_sessions(State(state): State<ApiState>) -> Json<Vec<String>> {
    Json(state.client.sessions().iter().map(ToString::to_string).collect())
}

/// Health check endpoint
async fn health_check(State(state): State<ApiState>) -> Json<HealthResponse> {
    let stats = state.client.registry().stats();
    Json(HealthResponse {
        status: "healthy".to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        version: crate::VERSION.to_string(),
        sessions: state.client.sessions().len(),
        orders: stats.orders,
        executions: stats.executions,
        timestamp: Utc::now(),
    })
}

// ===== Error Handling =====

/// [`OmsError`] as an HTTP response
#[derive(Debug)]
pub struct ApiError(OmsError);

impl From<OmsError> for ApiError {
    fn from(err: OmsError) -> Self {
        Self(err)
    }
}

impl ApiError {
    /// Status code for the wrapped error
    pub const fn status(&self) -> StatusCode {
        match &self.0 {
            OmsError::Validation(_)
            | OmsError::UnsupportedVersion(_)
            | OmsError::MalformedMessage { .. }
            | OmsError::UnsupportedMessageType(_) => StatusCode::BAD_REQUEST,
            OmsError::OrderNotFound(_) | OmsError::ClOrdIdNotFound(_) | OmsError::ExecutionNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            OmsError::DuplicateClOrdId(_) => StatusCode::CONFLICT,
            OmsError::Transport(_) => StatusCode::BAD_GATEWAY,
            OmsError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = %self.0, "Request failed");
        }

        let body = Json(ErrorResponse {
            error: self.0.to_string(),
            timestamp: Utc::now(),
        });
        (status, body).into_response()
    }
}

/// Serve the API until `shutdown` resolves
pub async fn start_server<F>(config: &ServerConfig, client: Arc<TradeClient>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(ApiState::new(client)).layer(
        ServiceBuilder::new()
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            )
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .layer(tower_http::timeout::TimeoutLayer::new(std::time::Duration::from_secs(
                config.request_timeout,
            ))),
    );

    let addr = format!("{}:{}", config.host, config.port)
        .parse::<SocketAddr>()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;

    info!("Starting REST API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error")?;

    Ok(())
}
