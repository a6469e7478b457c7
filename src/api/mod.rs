//! API module
//!
//! HTTP API endpoints, middleware, and shared application state.

pub mod middleware;
pub mod routes;
pub mod state;

use axum::{middleware as axum_middleware, Router};

pub use state::AppState;

/// Build the `/api` router: identity-gated routes plus the public
/// analytics endpoint, both under request logging.
pub fn create_router() -> Router<AppState> {
    let authenticated = routes::authenticated_router()
        .layer(axum_middleware::from_fn(middleware::identity_middleware));

    Router::new()
        .merge(authenticated)
        .merge(routes::public_router())
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}
