// # ipbeacon-server
//
// Publisher-side HTTP responder: serves the most recently published IP
// without ever caching a stale in-memory copy across fact updates. Each
// request re-reads the fact store.
//
// ## Routes
//
// - `GET /ip` (and `GET /`) → current IP as plain text
// - `GET /health` → fixed `OK`; asserts the process is up, independent of
//   fact state
//
// ## Status mapping
//
// The two failure shapes of the fact must stay distinguishable:
//
// - fact absent → `503`: the origin has never successfully published;
//   normal initial state, not a server fault
// - fact malformed → `500`: operational problem (corrupt write, wrong
//   file); never served as a `200` with invalid content
//
// There is no write route. The only writer is the transport landing a new
// file; reads rely on those writes being atomic replacements.

use std::sync::Arc;

use axum::{Router, extract::State, http::StatusCode, routing::get};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

use ipbeacon_core::Error;
use ipbeacon_core::traits::FactStore;

/// Shared state for the fact routes
#[derive(Clone)]
pub struct AppState {
    /// Fact store re-read on every request
    pub facts: Arc<dyn FactStore>,
}

/// Build the publisher router over the given fact store
pub fn router(facts: Arc<dyn FactStore>) -> Router {
    // The published IP is non-secret, served to any origin
    let cors = CorsLayer::new().allow_origin(Any);

    Router::new()
        .route("/", get(serve_ip))
        .route("/ip", get(serve_ip))
        .route("/health", get(serve_health))
        .with_state(AppState { facts })
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
}

/// Serve the current published IP
async fn serve_ip(State(state): State<AppState>) -> (StatusCode, String) {
    match state.facts.load().await {
        Ok(Some(ip)) => (StatusCode::OK, ip.to_string()),
        Ok(None) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "IP address not available".to_string(),
        ),
        Err(e @ Error::MalformedFact(_)) => {
            error!(%e, "fact file present but invalid");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "invalid address on record".to_string(),
            )
        }
        Err(e) => {
            error!(%e, "failed to read fact file");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            )
        }
    }
}

/// Liveness probe: always succeeds while the process is up
async fn serve_health() -> &'static str {
    "OK"
}
