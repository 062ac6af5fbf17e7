//! Core data type definitions

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// User profile as exposed to the rest of the system.
///
/// Owned by the external credential store; read-only here. The stored
/// password never appears on this type — the verifier drops it before the
/// profile leaves the auth boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    /// Login handle (e.g. employee number)
    pub account: String,
    /// Display name
    pub name: String,
    pub department: String,
    pub phone: String,
    /// Messaging handle (企业微信/WeChat)
    pub wechat: Option<String>,
    /// Named landing workspace, e.g. "化验室"
    pub workspace: Option<String>,
    /// Job title
    pub title: Option<String>,
    /// Account enabled flag
    pub status: Option<bool>,
}

/// Workspace display name → route path.
///
/// External read-only lookup row (`workspace_routes` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceRoute {
    pub workspace: String,
    pub route: String,
}

/// Ephemeral session value object.
///
/// Created at login, refreshed on user activity, destroyed at logout or
/// expiry. The token is opaque — it carries no claims and is only meaningful
/// to the session service that issued it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionInfo {
    /// Create a session expiring `ttl` from now
    pub fn new(token: String, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            token,
            created_at: now,
            last_activity: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Bump last-activity and extend expiry by a full `ttl` window from now
    pub fn touch(&mut self, ttl: Duration) {
        let now = Utc::now();
        self.last_activity = now;
        self.expires_at = now + ttl;
    }
}

/// The (profile, session, remember-me) triple persisted across restarts.
///
/// Invariant: present and unexpired ⇒ the viewer is authenticated without a
/// round trip to the credential store; expired or malformed ⇒ treated as
/// absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedAuthState {
    pub user: UserProfile,
    pub session: SessionInfo,
    pub remember: bool,
}

impl PersistedAuthState {
    pub fn is_valid(&self) -> bool {
        !self.session.is_expired()
    }
}

/// Top-level gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartFdxConfig {
    pub credential_store: CredentialStoreConfig,
    pub session: SessionConfig,
    pub routing: RoutingConfig,
    pub logging: crate::logging::LoggingConfig,
}

/// Location and credentials of the external PostgREST store.
///
/// Endpoint and key are injected configuration only — never compiled in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialStoreConfig {
    /// Base URL of the PostgREST interface, e.g. "https://db.example.com/rest/v1"
    pub endpoint: String,
    /// Service key sent as `apikey` and bearer token
    pub service_key: String,
    /// Credential table name
    pub users_table: String,
    /// Workspace-route table name
    pub routes_table: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session lifetime in minutes; `touch` extends by this full window
    pub ttl_minutes: i64,
    /// Directory for persisted auth state (None = platform data dir)
    pub storage_dir: Option<String>,
    /// Interval of the background expiry sweep, in seconds
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Fallback landing route when a workspace is absent or unmapped
    pub default_route: String,
    /// Login page path used by the session guard's redirects
    pub login_path: String,
}
