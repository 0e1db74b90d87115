use crate::{SharedData, api, logging, session};
use axum::Router;
use axum::middleware;
use std::sync::Arc;
use time::Duration;
use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

/// How long a session survives without any requests
const SESSION_INACTIVITY_LIMIT: Duration = Duration::minutes(60);

/// Assembles the full application router. Routes which change data sit behind the login
/// gate, and every request is identified from its signed session cookie.
pub fn build_router(shared_data: Arc<SharedData>, session_key: Key) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(SESSION_INACTIVITY_LIMIT))
        .with_signed(session_key);

    let protected_routes = Router::new()
        .merge(api::folder::protected_routes())
        .merge(api::todo::task_routes())
        .merge(api::user::protected_routes())
        .route_layer(middleware::from_fn(session::require_login));

    let router = Router::new()
        .merge(api::folder::public_routes())
        .merge(api::user::public_routes())
        .merge(protected_routes)
        .layer(middleware::from_fn_with_state(
            shared_data.clone(),
            session::identify_visitor,
        ))
        .layer(session_layer)
        .with_state(shared_data);

    logging::attach_tracing_http(router)
}
