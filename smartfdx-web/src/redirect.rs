//! Workspace-route lookup and the redirect resolver
//!
//! Workspace display names ("化验室") map to landing routes ("/lab") in an
//! externally owned table. The resolver consults the directory once per
//! login and falls back to the configured default path — a failed lookup
//! must never surface to the user as an error.

use crate::auth::AuthError;
use crate::postgrest::{eq, PostgrestClient};
use smartfdx_core::WorkspaceRoute;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Read-through cache over the external `workspace_routes` table
#[derive(Debug, Clone)]
pub struct WorkspaceDirectory {
    client: Option<PostgrestClient>,
    table: String,
    cache: Arc<RwLock<HashMap<String, String>>>,
}

impl WorkspaceDirectory {
    pub fn new(client: Option<PostgrestClient>, table: String) -> Self {
        Self {
            client,
            table,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Look up the route for a workspace name.
    ///
    /// Cached entries are served without a network round trip; a miss costs
    /// one filtered select against the store.
    pub async fn lookup(&self, workspace: &str) -> Result<Option<String>, AuthError> {
        {
            let cache = self.cache.read().await;
            if let Some(route) = cache.get(workspace) {
                return Ok(Some(route.clone()));
            }
        }

        let client = self.client.as_ref().ok_or_else(|| {
            AuthError::Config("workspace route store not configured".to_string())
        })?;

        let rows: Vec<WorkspaceRoute> = client
            .select(
                &self.table,
                &[("workspace", eq(workspace))],
                "workspace,route",
                1,
            )
            .await?;

        match rows.into_iter().next() {
            Some(row) => {
                debug!(workspace = %workspace, route = %row.route, "Workspace route resolved");
                let mut cache = self.cache.write().await;
                cache.insert(row.workspace, row.route.clone());
                Ok(Some(row.route))
            }
            None => Ok(None),
        }
    }

    /// Preload cache entries (warm start and tests)
    pub async fn prime<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut cache = self.cache.write().await;
        cache.extend(entries);
    }
}

/// Redirect Resolver: workspace name → landing route, with a hard fallback
#[derive(Debug, Clone)]
pub struct RedirectResolver {
    directory: WorkspaceDirectory,
    default_route: String,
}

impl RedirectResolver {
    pub fn new(directory: WorkspaceDirectory, default_route: String) -> Self {
        Self {
            directory,
            default_route,
        }
    }

    /// Resolve a workspace to its landing route.
    ///
    /// Absent, unmapped or failed lookups all land on the default route —
    /// this never returns an error. Deterministic and idempotent for a given
    /// directory state.
    pub async fn resolve(&self, workspace: Option<&str>) -> String {
        let Some(name) = workspace else {
            return self.default_route.clone();
        };

        match self.directory.lookup(name).await {
            Ok(Some(route)) => route,
            Ok(None) => {
                warn!(workspace = %name, "No route mapped for workspace, using default");
                self.default_route.clone()
            }
            Err(e) => {
                warn!(workspace = %name, error = %e, "Workspace route lookup failed, using default");
                self.default_route.clone()
            }
        }
    }
}
