//! # Web API
//!
//! axum surface over the signature flow engine.
//!
//! | Route | Operation |
//! |---|---|
//! | `GET /health` | liveness and database reachability |
//! | `GET /documents/pending` | documents awaiting the caller |
//! | `GET /documents/{id}/flow` | flow state with progress |
//! | `POST /documents/{id}/flow` | define or replace a flow (admin) |
//! | `POST /documents/{id}/sign` | record the caller's signature |
//!
//! The caller is identified by the `x-user-id` and `x-user-role` headers set
//! by the authentication layer in front of this service.

pub mod errors;
pub mod handlers;
pub mod identity;
pub mod state;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use errors::{ApiError, ApiResult};
pub use identity::CallerIdentity;
pub use state::AppState;

/// Build the application router with its middleware stack
pub fn create_app(app_state: AppState) -> Router {
    let request_timeout = app_state.config.request_timeout();

    Router::new()
        .route("/health", get(handlers::health::health))
        .merge(document_routes())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

fn document_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/documents/pending",
            get(handlers::flows::get_pending_documents),
        )
        .route(
            "/documents/{id}/flow",
            get(handlers::flows::get_document_flow).post(handlers::flows::create_flow),
        )
        .route("/documents/{id}/sign", post(handlers::flows::sign_document))
}
