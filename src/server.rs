//! The HTTP interface to the simulation.
//!
//! Requests are `POST`ed as JSON to `/simulate` (or `/api/simulate`). Successful simulations return
//! 200 with the result; rejected requests return 400 with `{ "error": ... }` and anything else
//! returns 500 with a generic message, the details being logged. Any origin may call the API.
use crate::pool::{EmptyLedger, PoolLedger};
use crate::simulation::{SimulationRequest, simulate_with_ledger};
use anyhow::{Context, Result};
use axum::Router;
use axum::extract::{Json, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;

/// The ledger shared between request handlers
pub type SharedLedger = Arc<dyn PoolLedger + Send + Sync>;

/// The message returned to clients when a request cannot be processed
const PROCESSING_FAILURE_MSG: &str = "Failed to process simulation";

/// Headers permitted on cross-origin requests
const ALLOWED_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

/// Methods permitted on cross-origin requests
const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// A ledger with no recorded sales, for servers without a pool file
pub fn empty_ledger() -> SharedLedger {
    Arc::new(EmptyLedger)
}

/// Build the application router
pub fn router(ledger: SharedLedger) -> Router {
    Router::new()
        .route(
            "/simulate",
            post(simulate_handler).options(preflight_handler),
        )
        .route(
            "/api/simulate",
            post(simulate_handler).options(preflight_handler),
        )
        .route("/health", get(health_handler))
        .fallback(not_found_handler)
        .with_state(ledger)
        .layer(middleware::map_response(add_cors_headers))
}

/// Serve the API on an already-bound listener until interrupted
pub async fn serve(listener: TcpListener, ledger: SharedLedger) -> Result<()> {
    let addr = listener.local_addr().context("Failed to get listener address")?;
    info!("Simulation API listening on http://{addr}");

    axum::serve(listener, router(ledger))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Simulation API stopped");
    Ok(())
}

/// Bind to `address` and serve the API, blocking until the server is stopped
pub fn run_server(address: &str, ledger: SharedLedger) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(async {
        let listener = TcpListener::bind(address)
            .await
            .with_context(|| format!("Failed to bind to {address}"))?;
        serve(listener, ledger).await
    })
}

/// Resolves when the process receives Ctrl+C
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
}

async fn simulate_handler(State(ledger): State<SharedLedger>, body: String) -> Response {
    // Parse the body ourselves so that malformed payloads are reported as processing failures
    let request: SimulationRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(err) => {
            error!("Could not parse simulation request: {err}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, PROCESSING_FAILURE_MSG);
        }
    };
    debug!("Simulation request: {request:?}");

    match simulate_with_ledger(&request, ledger.as_ref()) {
        Ok(result) => json_response(StatusCode::OK, result),
        Err(err) if err.is_client_error() => {
            warn!("Rejected simulation request: {err}");
            error_response(StatusCode::BAD_REQUEST, &err.to_string())
        }
        Err(err) => {
            error!("{err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, PROCESSING_FAILURE_MSG)
        }
    }
}

async fn preflight_handler() -> StatusCode {
    StatusCode::OK
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

/// Allow calls to the API from any origin
async fn add_cors_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    (status, Json(body)).into_response()
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
