//! HTTP surface: `/auth/refresh`, `/auth/logout`, the access-token gate.

pub mod extract;
pub mod handlers;

use crate::jwt::AccessTokenKeys;
use crate::refresh::{RotationEngine, SessionIssuer};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// Issuance seam for the embedding application's login route. The
    /// routes here only rotate and revoke; minting the first pair after
    /// credential verification happens outside this service.
    pub issuer: Arc<SessionIssuer>,
    pub rotator: Arc<RotationEngine>,
    pub keys: Arc<AccessTokenKeys>,
    /// Access-token lifetime, used for cookie Max-Age.
    pub access_ttl_secs: u64,
    /// Refresh-token lifetime, used for cookie Max-Age.
    pub refresh_ttl_secs: u64,
}

/// Build the service router.
///
/// Logout sits behind the access-token gate; refresh does not (its
/// credential is the refresh token itself).
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/auth/logout", post(handlers::logout))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            extract::require_auth,
        ))
        .route("/auth/refresh", post(handlers::refresh))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
