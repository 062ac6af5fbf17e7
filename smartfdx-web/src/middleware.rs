// SmartFDX Web Middleware
// 会话守卫中间件：API 返回 401，页面跳转到登录页并附带回跳路径

use crate::auth::{guard::login_redirect_url, handlers::session_token_from_headers, AuthError};
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

/// Session guard for API routes.
///
/// Validates the session token (bearer header or cookie), attaches the
/// profile to request extensions and refreshes activity. Anything short of a
/// live session is a 401 — the guard fails closed.
pub async fn api_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = session_token_from_headers(request.headers()) else {
        debug!("Missing session token on protected API route");
        return AuthError::MissingSessionToken.into_response();
    };

    match state.sessions.validate(&token) {
        Some(auth_state) => {
            request.extensions_mut().insert(auth_state.user);
            next.run(request).await
        }
        None => {
            debug!("Rejected expired or unknown session token");
            AuthError::SessionExpired.into_response()
        }
    }
}

/// Session guard for page routes.
///
/// Same validation as the API guard, but an unauthenticated viewer is sent
/// to the login page with the originally requested path as the `redirect`
/// query parameter.
pub async fn page_guard_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let requested_path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let token = session_token_from_headers(request.headers());

    if let Some(token) = token {
        if let Some(auth_state) = state.sessions.validate(&token) {
            request.extensions_mut().insert(auth_state.user);
            return next.run(request).await;
        }
    }

    debug!(path = %requested_path, "Unauthenticated page request, redirecting to login");
    let login_url = login_redirect_url(&state.login_path, &requested_path);
    Redirect::to(&login_url).into_response()
}
