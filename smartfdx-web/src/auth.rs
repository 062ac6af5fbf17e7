//! Authentication and session management
//!
//! Login verification against the external credential store, the persisted
//! session store, and the session guard that fronts protected views.

pub mod guard;
pub mod handlers;
pub mod session;
pub mod verifier;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use smartfdx_core::UserProfile;
use tracing::error;

/// Authentication errors
///
/// Unknown-account and wrong-password are distinct variants for logging and
/// tests, but share one generic client-facing message so login responses do
/// not reveal which accounts exist.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing credentials")]
    MissingCredentials,
    #[error("Account not found")]
    AccountNotFound,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Missing session token")]
    MissingSessionToken,
    #[error("Session expired or unknown")]
    SessionExpired,
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Upstream error (status {status})")]
    Upstream { status: u16, detail: String },
    #[error("Session storage error: {0}")]
    Storage(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        // Backend detail stays in the server log; clients only ever see the
        // generic message for their error class.
        let (status, message) = match &self {
            AuthError::MissingCredentials => (StatusCode::BAD_REQUEST, "账号和密码不能为空"),
            AuthError::AccountNotFound | AuthError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "账号或密码错误")
            }
            AuthError::MissingSessionToken | AuthError::SessionExpired => {
                (StatusCode::UNAUTHORIZED, "登录已过期，请重新登录")
            }
            AuthError::Config(detail) => {
                error!(detail = %detail, "Credential store is not configured");
                (StatusCode::INTERNAL_SERVER_ERROR, "服务暂时不可用，请稍后重试")
            }
            AuthError::Upstream { status, detail } => {
                error!(status = status, detail = %detail, "Credential store request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "服务暂时不可用，请稍后重试")
            }
            AuthError::Storage(detail) => {
                error!(detail = %detail, "Session storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "服务暂时不可用，请稍后重试")
            }
        };

        let body = Json(json!({
            "success": false,
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Authenticated user extractor
///
/// The session-guard middleware validates the token and parks the profile in
/// request extensions; handlers pull it out through this extractor. Requests
/// that bypassed the middleware fail closed.
pub struct CurrentUser(pub UserProfile);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserProfile>()
            .cloned()
            .map(CurrentUser)
            .ok_or(AuthError::MissingSessionToken)
    }
}

/// Extract a bearer session token from an Authorization header value
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    header.and_then(|value| value.strip_prefix("Bearer "))
}

/// Extract the session token from a Cookie header value
pub fn cookie_token(cookie_header: &str) -> Option<String> {
    for cookie in cookie_header.split(';') {
        let cookie = cookie.trim();
        if let Some(value) = cookie.strip_prefix("smartfdx_session=") {
            return Some(value.to_string());
        }
    }
    None
}
