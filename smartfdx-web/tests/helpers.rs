//! 集成测试辅助工具
//!
//! 启动完整的网关应用，并用一个内置的桩服务器扮演外部 PostgREST 数据库

use axum::{
    extract::Query,
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::LazyLock;
use tokio::net::TcpListener;
use smartfdx_web::{create_app, AppState, WebConfig};

// 确保tracing只初始化一次
static TRACING: LazyLock<()> = LazyLock::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(std::io::sink)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
});

/// 测试应用实例
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub api_client: reqwest::Client,
    pub state: AppState,
}

impl TestApp {
    /// 健康检查
    pub async fn get_health(&self) -> reqwest::Response {
        self.api_client
            .get(format!("{}/api/health", &self.address))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// 用户登录
    pub async fn post_login<Body>(&self, body: &Body) -> reqwest::Response
    where
        Body: serde::Serialize,
    {
        self.api_client
            .post(format!("{}/api/auth/login", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// 用户登出
    pub async fn post_logout(&self, token: &str) -> reqwest::Response {
        self.api_client
            .post(format!("{}/api/auth/logout", &self.address))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// 查询当前登录用户
    pub async fn get_me(&self, token: Option<&str>) -> reqwest::Response {
        let mut request = self
            .api_client
            .get(format!("{}/api/auth/me", &self.address));
        if let Some(token) = token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        request.send().await.expect("Failed to execute request.")
    }

    /// 工作台路由查询
    pub async fn post_workspace_route<Body>(&self, body: &Body) -> reqwest::Response
    where
        Body: serde::Serialize,
    {
        self.api_client
            .post(format!("{}/api/workspace-route", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// 访问页面（可选携带会话 Cookie）
    pub async fn get_page(&self, path: &str, session_token: Option<&str>) -> reqwest::Response {
        let mut request = self.api_client.get(format!("{}{}", &self.address, path));
        if let Some(token) = session_token {
            request = request.header("Cookie", format!("smartfdx_session={}", token));
        }
        request.send().await.expect("Failed to execute request.")
    }
}

/// 桩数据库中的用户表
fn stub_user_rows(account: &str) -> Value {
    match account {
        "zhang_lab" => json!([{
            "id": 1,
            "account": "zhang_lab",
            "name": "张三",
            "department": "化验室",
            "phone": "13800000001",
            "wechat": null,
            "password": "lab123456",
            "workspace": "化验室",
            "title": "化验员",
            "status": true,
        }]),
        "wang_prod" => json!([{
            "id": 2,
            "account": "wang_prod",
            "name": "王五",
            "department": "生产部",
            "phone": "13800000002",
            "wechat": "wang_wx",
            "password": "prod123456",
            "workspace": "不存在的页面",
            "title": null,
            "status": true,
        }]),
        "li_nows" => json!([{
            "id": 3,
            "account": "li_nows",
            "name": "李四",
            "department": "综合办",
            "phone": "13800000003",
            "wechat": null,
            "password": "now123456",
            "workspace": null,
            "title": null,
            "status": true,
        }]),
        _ => json!([]),
    }
}

/// 桩数据库中的工作台路由表
fn stub_route_rows(workspace: &str) -> Value {
    match workspace {
        "化验室" => json!([{ "workspace": "化验室", "route": "/lab" }]),
        "采样间" => json!([{ "workspace": "采样间", "route": "/sampling" }]),
        _ => json!([]),
    }
}

fn filter_operand<'a>(params: &'a HashMap<String, String>, column: &str) -> &'a str {
    params
        .get(column)
        .and_then(|value| value.strip_prefix("eq."))
        .unwrap_or_default()
}

async fn stub_users(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    Json(stub_user_rows(filter_operand(&params, "account")))
}

async fn stub_routes(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    Json(stub_route_rows(filter_operand(&params, "workspace")))
}

/// 启动扮演外部 PostgREST 存储的桩服务器
pub async fn spawn_stub_store() -> String {
    let app = Router::new()
        .route("/users", get(stub_users))
        .route("/workspace_routes", get(stub_routes));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// 启动一个所有请求都失败的桩服务器（上游故障场景）
pub async fn spawn_broken_store() -> String {
    let app = Router::new().fallback(|| async {
        (StatusCode::INTERNAL_SERVER_ERROR, "database on fire")
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// 启动测试应用（正常的桩存储）
pub async fn spawn_app() -> TestApp {
    let store = spawn_stub_store().await;
    spawn_app_with_store(store).await
}

/// 启动测试应用（上游故障的桩存储）
pub async fn spawn_app_with_broken_store() -> TestApp {
    let store = spawn_broken_store().await;
    spawn_app_with_store(store).await
}

/// 在指定的存储端点上启动测试应用
pub async fn spawn_app_with_store(store_endpoint: String) -> TestApp {
    LazyLock::force(&TRACING);

    let config = WebConfig {
        host: "127.0.0.1".to_string(),
        port: 0, // Let the OS choose a free port
        dev_mode: true,
        config_file: None,
        store_endpoint: Some(store_endpoint),
        store_key: Some("test-service-key".to_string()),
    };

    let state = AppState::new(config).await.unwrap();
    let app = create_app(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let port = addr.port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        port,
        api_client: client,
        state,
    }
}

/// 断言响应是重定向
pub fn assert_is_redirect_to(response: &reqwest::Response, location: &str) {
    assert_eq!(response.status().as_u16(), 303);
    assert_eq!(response.headers().get("Location").unwrap(), location);
}
