//! SmartFDX Web Gateway Server
//!
//! Main web server implementation using Axum.

use crate::{create_app, AppState, WebConfig, WebError, WebResult};
use axum::serve;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// Main SmartFDX gateway server
pub struct SmartFdxServer {
    config: WebConfig,
    state: AppState,
}

impl SmartFdxServer {
    /// Create a new gateway server
    pub async fn new(config: WebConfig) -> WebResult<Self> {
        let state = AppState::new(config.clone()).await?;

        Ok(Self { config, state })
    }

    /// Start the web server
    pub async fn start(self) -> WebResult<()> {
        let address = self.config.address();

        info!("🚀 Starting SmartFDX Web Gateway");
        info!("📍 Server address: http://{}", address);
        info!("🔧 Development mode: {}", self.config.dev_mode);

        // Create the application
        let app = create_app(self.state.clone());

        // Create TCP listener
        let listener = TcpListener::bind(&address)
            .await
            .map_err(WebError::Server)?;

        info!("✅ Server listening on http://{}", address);

        // Start the periodic sweep for expired sessions
        let sweep_state = self.state.clone();
        let sweep_period = self.state.settings.session.sweep_interval_secs;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(sweep_period));
            loop {
                interval.tick().await;
                let removed = sweep_state.sessions.sweep_expired();
                if removed > 0 {
                    debug!(count = removed, "Expired sessions swept");
                }
            }
        });

        // Start the server
        if let Err(e) = serve(listener, app).await {
            error!("❌ Server error: {}", e);
            return Err(WebError::Server(e));
        }

        Ok(())
    }

    /// Get server configuration
    pub fn config(&self) -> &WebConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Builder for SmartFdxServer
pub struct SmartFdxServerBuilder {
    config: WebConfig,
}

impl SmartFdxServerBuilder {
    /// Create a new server builder
    pub fn new() -> Self {
        Self {
            config: WebConfig::default(),
        }
    }

    /// Set the server host
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Enable development mode
    pub fn dev_mode(mut self, dev_mode: bool) -> Self {
        self.config.dev_mode = dev_mode;
        self
    }

    /// Set the settings file path
    pub fn config_file<S: Into<String>>(mut self, config_file: S) -> Self {
        self.config.config_file = Some(config_file.into());
        self
    }

    /// Override the credential store endpoint
    pub fn store_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.config.store_endpoint = Some(endpoint.into());
        self
    }

    /// Override the credential store service key
    pub fn store_key<S: Into<String>>(mut self, key: S) -> Self {
        self.config.store_key = Some(key.into());
        self
    }

    /// Build the server
    pub async fn build(self) -> WebResult<SmartFdxServer> {
        SmartFdxServer::new(self.config).await
    }
}

impl Default for SmartFdxServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function to start a server with default configuration
pub async fn start_server() -> WebResult<()> {
    let config = WebConfig::from_env();
    let server = SmartFdxServer::new(config).await?;
    server.start().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_creation() {
        let config = WebConfig::default();
        let server = SmartFdxServer::new(config).await;
        assert!(server.is_ok());
    }

    #[test]
    fn test_server_builder() {
        let builder = SmartFdxServerBuilder::new()
            .host("localhost")
            .port(3000)
            .dev_mode(true)
            .store_endpoint("https://db.example.com/rest/v1");

        assert_eq!(builder.config.host, "localhost");
        assert_eq!(builder.config.port, 3000);
        assert!(builder.config.dev_mode);
        assert_eq!(
            builder.config.store_endpoint.as_deref(),
            Some("https://db.example.com/rest/v1")
        );
    }
}
