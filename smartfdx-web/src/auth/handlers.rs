//! Authentication handlers for login, logout and session introspection

use super::{bearer_token, cookie_token, AuthError, CurrentUser};
use crate::AppState;
use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap},
    response::{IntoResponse, Json, Response},
    Json as JsonExtractor,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub password: String,
    /// 记住我：持久化会话，重启后仍然有效
    #[serde(default)]
    pub remember: bool,
}

/// User login endpoint
///
/// Verifies the account against the external credential store, opens a
/// session and resolves the workspace landing route. Verification always
/// completes before route resolution, and both before the response carrying
/// the navigation target is produced.
pub async fn login(
    State(state): State<AppState>,
    JsonExtractor(request): JsonExtractor<LoginRequest>,
) -> Result<Response, AuthError> {
    if request.account.is_empty() || request.password.is_empty() {
        return Err(AuthError::MissingCredentials);
    }

    info!(account = %request.account, "User login attempt");

    let verifier = state
        .verifier
        .as_ref()
        .ok_or_else(|| AuthError::Config("credential store not configured".to_string()))?;

    let profile = verifier.verify(&request.account, &request.password).await?;
    let redirect_url = state.resolver.resolve(profile.workspace.as_deref()).await;
    let session = state.sessions.open_session(profile.clone(), request.remember)?;

    info!(
        account = %profile.account,
        workspace = ?profile.workspace,
        redirect = %redirect_url,
        "User logged in"
    );

    let mut response = Json(json!({
        "success": true,
        "redirectUrl": redirect_url,
        "token": session.token,
        "user": profile,
    }))
    .into_response();

    response.headers_mut().insert(
        SET_COOKIE,
        format!(
            "smartfdx_session={}; Path=/; HttpOnly; SameSite=Lax",
            session.token
        )
        .parse()
        .expect("session cookie is valid header value"),
    );

    Ok(response)
}

/// Logout endpoint
///
/// Closes the active session and clears the session cookie. Succeeds even
/// without a live session, so a stale client can always log out cleanly.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let token = session_token_from_headers(&headers);

    if let Some(token) = &token {
        state.sessions.close_session(token);
        info!("User logged out");
    }

    let mut response = Json(json!({
        "success": true,
        "message": "已退出登录",
    }))
    .into_response();

    response.headers_mut().insert(
        SET_COOKIE,
        "smartfdx_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"
            .parse()
            .expect("clearing cookie is valid header value"),
    );

    response
}

/// Get the current session's user profile
///
/// Requires a valid session token; the guard middleware attaches the profile.
pub async fn current_user(CurrentUser(user): CurrentUser) -> Json<Value> {
    Json(json!({
        "success": true,
        "user": user,
    }))
}

/// Pull the session token out of request headers (bearer first, then cookie)
pub fn session_token_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = bearer_token(
        headers
            .get("authorization")
            .and_then(|value| value.to_str().ok()),
    ) {
        return Some(token.to_string());
    }

    headers
        .get("cookie")
        .and_then(|value| value.to_str().ok())
        .and_then(cookie_token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_token_prefers_bearer_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_static("Bearer sfx_bearer"),
        );
        headers.insert(
            "cookie",
            HeaderValue::from_static("smartfdx_session=sfx_cookie"),
        );

        assert_eq!(
            session_token_from_headers(&headers),
            Some("sfx_bearer".to_string())
        );
    }

    #[test]
    fn test_token_falls_back_to_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            HeaderValue::from_static("lang=zh; smartfdx_session=sfx_cookie"),
        );

        assert_eq!(
            session_token_from_headers(&headers),
            Some("sfx_cookie".to_string())
        );
    }

    #[test]
    fn test_no_token_in_headers() {
        let headers = HeaderMap::new();
        assert_eq!(session_token_from_headers(&headers), None);
    }
}
