//! Thin client for the external PostgREST data store
//!
//! The credential and workspace-route tables live in a managed backend that
//! exposes rows over a PostgREST-style REST interface (query-string column
//! filters, JSON row arrays). This client owns URL building, service-key
//! headers and row decoding; it never retries.

use crate::auth::AuthError;
use serde::de::DeserializeOwned;
use smartfdx_core::CredentialStoreConfig;
use tracing::{debug, warn};

/// Build an `eq.` filter value, URL-encoding the operand.
///
/// Workspace names and account handles are Chinese text, so the operand must
/// be percent-encoded before it lands in the query string.
pub fn eq(value: &str) -> String {
    format!("eq.{}", urlencoding::encode(value))
}

/// Client for one PostgREST endpoint
#[derive(Debug, Clone)]
pub struct PostgrestClient {
    http: reqwest::Client,
    base: String,
    service_key: String,
}

impl PostgrestClient {
    /// Create a client from injected configuration.
    ///
    /// Fails with a configuration error when the endpoint or key is unset —
    /// callers surface this as "service unavailable", never as a panic.
    pub fn from_config(config: &CredentialStoreConfig) -> Result<Self, AuthError> {
        if config.endpoint.is_empty() || config.service_key.is_empty() {
            return Err(AuthError::Config(
                "credential store endpoint or service key not configured".to_string(),
            ));
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base: config.endpoint.trim_end_matches('/').to_string(),
            service_key: config.service_key.clone(),
        })
    }

    /// Build the request URL for a filtered select
    fn build_url(&self, table: &str, filters: &[(&str, String)], select: &str, limit: u32) -> String {
        let mut url = format!("{}/{}?select={}&limit={}", self.base, table, select, limit);
        for (column, filter) in filters {
            url.push('&');
            url.push_str(column);
            url.push('=');
            url.push_str(filter);
        }
        url
    }

    /// Fetch rows matching the given column filters
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
        select: &str,
        limit: u32,
    ) -> Result<Vec<T>, AuthError> {
        let url = self.build_url(table, filters, select, limit);
        debug!(table = table, "Querying data store");

        let response = self
            .http
            .get(&url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AuthError::Upstream {
                status: 0,
                detail: format!("request to data store failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(
                table = table,
                status = status.as_u16(),
                "Data store returned an error"
            );
            return Err(AuthError::Upstream {
                status: status.as_u16(),
                detail,
            });
        }

        response.json::<Vec<T>>().await.map_err(|e| AuthError::Upstream {
            status: status.as_u16(),
            detail: format!("failed to decode data store response: {}", e),
        })
    }
}
