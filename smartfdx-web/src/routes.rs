//! Route definitions for the SmartFDX web gateway
//!
//! This module defines all the routes for the application.

use crate::{auth, handlers, middleware, AppState};
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    // Routes behind the session guard (401 on failure)
    let protected = Router::new()
        .route("/auth/me", get(auth::handlers::current_user))
        .route_layer(from_fn_with_state(
            state,
            middleware::api_auth_middleware,
        ));

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Authentication
        .route("/auth/login", post(auth::handlers::login))
        .route("/auth/logout", post(auth::handlers::logout))
        // Workspace routing
        .route("/workspace-route", post(handlers::workspace_route))
        .merge(protected)
}

/// Create page routes (login page plus the guarded workspace namespace)
pub fn page_routes(state: AppState) -> Router<AppState> {
    let guarded = Router::new()
        .route("/workspace", get(handlers::workspace_page))
        .route("/workspace/{*path}", get(handlers::workspace_page))
        .route_layer(from_fn_with_state(
            state,
            middleware::page_guard_middleware,
        ));

    Router::new()
        .route("/login", get(handlers::login_page))
        .merge(guarded)
}
