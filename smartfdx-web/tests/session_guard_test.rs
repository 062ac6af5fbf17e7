//! Session guard integration tests
//!
//! Protected pages redirect unauthenticated viewers to the login page with
//! the originally requested path preserved; the API guard answers 401.

mod helpers;

use helpers::{assert_is_redirect_to, spawn_app};
use serde_json::{json, Value};

#[tokio::test]
async fn protected_page_redirects_to_login_with_return_path() {
    let app = spawn_app().await;

    let response = app.get_page("/workspace", None).await;
    assert_is_redirect_to(&response, "/login?redirect=%2Fworkspace");
}

#[tokio::test]
async fn return_path_preserves_nested_path_and_query() {
    let app = spawn_app().await;

    let response = app.get_page("/workspace/lab/samples?shift=3", None).await;
    assert_is_redirect_to(
        &response,
        "/login?redirect=%2Fworkspace%2Flab%2Fsamples%3Fshift%3D3",
    );
}

#[tokio::test]
async fn login_page_itself_requires_no_auth() {
    let app = spawn_app().await;

    let response = app.get_page("/login", None).await;
    assert!(response.status().is_success());

    let body = response.text().await.unwrap();
    assert!(body.contains("SmartFDX 登录"));
}

#[tokio::test]
async fn authenticated_viewer_reaches_the_workspace_page() {
    let app = spawn_app().await;

    let login: Value = app
        .post_login(&json!({
            "account": "zhang_lab",
            "password": "lab123456",
        }))
        .await
        .json()
        .await
        .unwrap();
    let token = login["token"].as_str().unwrap().to_string();

    let response = app.get_page("/workspace", Some(&token)).await;
    assert!(response.status().is_success());

    let body = response.text().await.unwrap();
    assert!(body.contains("张三"));
    assert!(body.contains("化验室"));
}

#[tokio::test]
async fn invalidated_session_is_redirected_with_return_path() {
    let app = spawn_app().await;

    let login: Value = app
        .post_login(&json!({
            "account": "zhang_lab",
            "password": "lab123456",
        }))
        .await
        .json()
        .await
        .unwrap();
    let token = login["token"].as_str().unwrap().to_string();

    // The session dies behind the viewer's back (expiry sweep, logout on
    // another device); the stale cookie must fail closed.
    app.state.sessions.close_session(&token);

    let response = app.get_page("/workspace", Some(&token)).await;
    assert_is_redirect_to(&response, "/login?redirect=%2Fworkspace");
}

#[tokio::test]
async fn repeated_unauthenticated_requests_each_get_exactly_one_redirect() {
    let app = spawn_app().await;

    // Over HTTP every request is one guard evaluation; none may loop or stack
    for _ in 0..3 {
        let response = app.get_page("/workspace", None).await;
        assert_is_redirect_to(&response, "/login?redirect=%2Fworkspace");
    }
}

#[tokio::test]
async fn api_guard_answers_401_instead_of_redirecting() {
    let app = spawn_app().await;

    let response = app.get_me(None).await;
    assert_eq!(response.status().as_u16(), 401);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);

    let response = app.get_me(Some("sfx_forged_token")).await;
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn session_cookie_from_login_authenticates_pages() {
    let app = spawn_app().await;

    let login = app
        .post_login(&json!({
            "account": "zhang_lab",
            "password": "lab123456",
        }))
        .await;

    // The login response sets the session cookie
    let set_cookie = login
        .headers()
        .get("set-cookie")
        .and_then(|value| value.to_str().ok())
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("smartfdx_session=sfx_"));

    let token = set_cookie
        .trim_start_matches("smartfdx_session=")
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let response = app.get_page("/workspace/lab", Some(&token)).await;
    assert!(response.status().is_success());
}
