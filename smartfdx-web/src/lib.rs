//! SmartFDX Web Gateway
//!
//! This module provides the HTTP gateway for SmartFDX: login, session
//! management and workspace-route resolution in front of the externally
//! owned PostgREST data store.

pub mod auth;
pub mod handlers;
pub mod middleware;
pub mod postgrest;
pub mod redirect;
pub mod routes;
pub mod server;
pub mod state;

// Re-export main types
pub use server::SmartFdxServer;
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    // Configure CORS for the frontend origin
    let cors = CorsLayer::new()
        .allow_origin("http://localhost:3000".parse::<HeaderValue>().unwrap())
        .allow_origin("http://127.0.0.1:3000".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_credentials(true)
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE]);

    // Create the main router
    Router::new()
        // API routes
        .nest("/api", routes::api_routes(state.clone()))
        // Guarded workspace pages and the login page
        .merge(routes::page_routes(state.clone()))
        // Add middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1MB max body size
        .with_state(state)
}

/// Configuration for the web gateway
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Enable development mode
    pub dev_mode: bool,
    /// Path to a TOML settings file (credential store, session, routing)
    pub config_file: Option<String>,
    /// Credential store endpoint override
    pub store_endpoint: Option<String>,
    /// Credential store service key override
    pub store_key: Option<String>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            dev_mode: false,
            config_file: None,
            store_endpoint: None,
            store_key: None,
        }
    }
}

impl WebConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("SMARTFDX_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("SMARTFDX_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            dev_mode: std::env::var("SMARTFDX_DEV_MODE")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            config_file: std::env::var("SMARTFDX_CONFIG").ok(),
            store_endpoint: std::env::var("SMARTFDX_STORE_ENDPOINT").ok(),
            store_key: std::env::var("SMARTFDX_STORE_KEY").ok(),
        }
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Error types for the web gateway
#[derive(thiserror::Error, Debug)]
pub enum WebError {
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Session storage error: {0}")]
    SessionStorage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for web operations
pub type WebResult<T> = Result<T, WebError>;

/// Initialize logging for the web gateway
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "smartfdx_web=debug,tower_http=debug,axum=debug".into()),
        )
        .init();
}
