//! HTTP request handlers for the SmartFDX web gateway

use crate::auth::CurrentUser;
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, Json},
    Json as JsonExtractor,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    timestamp: chrono::DateTime<chrono::Utc>,
    version: String,
}

/// Workspace route lookup request
#[derive(Deserialize)]
pub struct WorkspaceRouteRequest {
    #[serde(rename = "workspaceName")]
    pub workspace_name: String,
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Workspace route lookup endpoint
///
/// Raw lookup: unlike the post-login resolver, a missing mapping here is a
/// 404, so the caller can distinguish "unmapped" from "route is the default".
pub async fn workspace_route(
    State(state): State<AppState>,
    JsonExtractor(request): JsonExtractor<WorkspaceRouteRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match state.directory.lookup(&request.workspace_name).await {
        Ok(Some(route)) => Ok(Json(json!({
            "success": true,
            "route": route,
        }))),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({
                "success": false,
                "error": "workspace route not found",
            })),
        )),
        Err(e) => {
            tracing::error!(workspace = %request.workspace_name, error = %e, "Workspace route lookup failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": "workspace route lookup failed",
                })),
            ))
        }
    }
}

/// Login page shell.
///
/// The real form lives in the frontend bundle; this shell keeps the path
/// servable when the gateway runs standalone.
pub async fn login_page() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html lang="zh-CN">
<head><meta charset="utf-8"><title>SmartFDX 登录</title></head>
<body>
    <h1>SmartFDX 登录</h1>
    <p>请通过前端应用登录，或调用 POST /api/auth/login。</p>
</body>
</html>"#,
    )
}

/// Protected workspace page.
///
/// Reached only through the page guard; the middleware has already attached
/// the viewer's profile.
pub async fn workspace_page(CurrentUser(user): CurrentUser) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="zh-CN">
<head><meta charset="utf-8"><title>SmartFDX 工作台</title></head>
<body>
    <h1>{} 的工作台</h1>
    <p>部门：{}</p>
</body>
</html>"#,
        user.name, user.department
    ))
}
