//! Application state with an explicit lifecycle
//!
//! Everything the handlers need is built once here and passed down — there
//! are no module-level session singletons. The state is created at startup
//! and torn down only when the process exits.

use crate::{
    auth::{session::SessionService, verifier::AuthVerifier},
    postgrest::PostgrestClient,
    redirect::{RedirectResolver, WorkspaceDirectory},
    WebConfig, WebError, WebResult,
};
use smartfdx_core::SmartFdxConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Web server configuration
    pub config: WebConfig,
    /// Gateway settings (credential store, session, routing)
    pub settings: Arc<SmartFdxConfig>,
    /// Credential verifier (None until the store is configured)
    pub verifier: Option<AuthVerifier>,
    /// Workspace-route directory
    pub directory: WorkspaceDirectory,
    /// Redirect resolver consulted after login
    pub resolver: RedirectResolver,
    /// Active-session registry
    pub sessions: SessionService,
    /// Login page path used by guard redirects
    pub login_path: String,
}

impl AppState {
    /// Create a new application state
    pub async fn new(config: WebConfig) -> WebResult<Self> {
        let mut settings = match &config.config_file {
            Some(path) => SmartFdxConfig::from_file(path)
                .map_err(|e| WebError::Config(format!("Failed to load settings: {}", e)))?,
            None => SmartFdxConfig::default(),
        };

        // Environment/CLI overrides win over the settings file
        if let Some(endpoint) = &config.store_endpoint {
            settings.credential_store.endpoint = endpoint.clone();
        }
        if let Some(key) = &config.store_key {
            settings.credential_store.service_key = key.clone();
        }

        settings
            .validate()
            .map_err(|e| WebError::Config(format!("Invalid settings: {}", e)))?;

        // The store is injected configuration; without it the gateway still
        // starts, but login is unavailable until it is provided.
        let client = match PostgrestClient::from_config(&settings.credential_store) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!(error = %e, "Credential store not configured, login disabled");
                None
            }
        };

        let verifier = client.clone().map(|client| {
            AuthVerifier::new(client, settings.credential_store.users_table.clone())
        });

        let directory = WorkspaceDirectory::new(
            client,
            settings.credential_store.routes_table.clone(),
        );
        let resolver = RedirectResolver::new(
            directory.clone(),
            settings.routing.default_route.clone(),
        );

        // Session persistence only when a storage directory is configured;
        // otherwise sessions are process-local.
        let storage_root = settings.session.storage_dir.as_ref().map(PathBuf::from);
        let sessions = SessionService::new(settings.session.ttl_minutes, storage_root);

        let login_path = settings.routing.login_path.clone();

        let state = Self {
            config,
            settings: Arc::new(settings),
            verifier,
            directory,
            resolver,
            sessions,
            login_path,
        };

        info!("Application state initialized successfully");
        Ok(state)
    }
}
