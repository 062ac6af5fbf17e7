//! Persisted session state and the active-session registry

use super::AuthError;
use chrono::Duration;
use smartfdx_core::{PersistedAuthState, SessionInfo, UserProfile};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Fixed, application-scoped record names for the persisted triple
const USER_RECORD: &str = "smartfdx.auth.user.json";
const SESSION_RECORD: &str = "smartfdx.auth.session.json";
const REMEMBER_RECORD: &str = "smartfdx.auth.remember.json";

/// Generate an opaque session token
pub fn generate_token() -> String {
    format!("sfx_{}", Uuid::new_v4().simple())
}

/// Persisted auth state for one viewer.
///
/// Three independent records (profile, session, remember flag), each under a
/// fixed name. `load` validates structure and expiry before returning; any
/// failure behaves as if no record exists and clears whatever is left behind.
#[derive(Debug, Clone)]
pub enum SessionStore {
    /// In-memory storage (for development and testing)
    Memory {
        state: Arc<RwLock<Option<PersistedAuthState>>>,
    },
    /// File storage: one directory holding the three records
    File { dir: PathBuf },
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::memory()
    }
}

impl SessionStore {
    /// Create an in-memory session store
    pub fn memory() -> Self {
        Self::Memory {
            state: Arc::new(RwLock::new(None)),
        }
    }

    /// Create a file-backed session store rooted at `dir`
    pub fn file<P: AsRef<Path>>(dir: P) -> Result<Self, AuthError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .map_err(|e| AuthError::Storage(format!("failed to create session dir: {}", e)))?;
        Ok(Self::File { dir })
    }

    /// Persist the (profile, session, remember) triple
    pub fn save(
        &self,
        user: &UserProfile,
        session: &SessionInfo,
        remember: bool,
    ) -> Result<(), AuthError> {
        match self {
            Self::Memory { state } => {
                let mut state = state.write().unwrap();
                *state = Some(PersistedAuthState {
                    user: user.clone(),
                    session: session.clone(),
                    remember,
                });
                Ok(())
            }
            Self::File { dir } => {
                write_record(&dir.join(USER_RECORD), user)?;
                write_record(&dir.join(SESSION_RECORD), session)?;
                write_record(&dir.join(REMEMBER_RECORD), &remember)?;
                Ok(())
            }
        }
    }

    /// Load the persisted triple, if present, structurally valid and unexpired.
    ///
    /// A malformed or expired record set is cleared as a side effect, so a
    /// corrupt state can never linger and be re-read later.
    pub fn load(&self) -> Option<PersistedAuthState> {
        match self {
            Self::Memory { state } => {
                let current = state.read().unwrap().clone()?;
                if !current.is_valid() {
                    self.clear();
                    return None;
                }
                Some(current)
            }
            Self::File { dir } => {
                let user: Option<UserProfile> = read_record(&dir.join(USER_RECORD));
                let session: Option<SessionInfo> = read_record(&dir.join(SESSION_RECORD));
                let remember: Option<bool> = read_record(&dir.join(REMEMBER_RECORD));

                match (user, session, remember) {
                    (Some(user), Some(session), Some(remember)) => {
                        let state = PersistedAuthState {
                            user,
                            session,
                            remember,
                        };
                        if !state.is_valid() {
                            debug!("Persisted session expired, clearing records");
                            self.clear();
                            return None;
                        }
                        Some(state)
                    }
                    (None, None, None) => None,
                    _ => {
                        // Partial or unparseable record set
                        warn!("Malformed persisted auth state, clearing records");
                        self.clear();
                        None
                    }
                }
            }
        }
    }

    /// Remove all persisted records
    pub fn clear(&self) {
        match self {
            Self::Memory { state } => {
                let mut state = state.write().unwrap();
                *state = None;
            }
            Self::File { dir } => {
                for name in [USER_RECORD, SESSION_RECORD, REMEMBER_RECORD] {
                    let _ = std::fs::remove_file(dir.join(name));
                }
            }
        }
    }

    /// Bump last-activity and extend expiry by a full `ttl` window.
    ///
    /// Only acts on a valid unexpired record; returns the refreshed session.
    pub fn touch(&self, ttl: Duration) -> Option<SessionInfo> {
        let mut state = self.load()?;
        state.session.touch(ttl);
        self.save(&state.user, &state.session, state.remember).ok()?;
        Some(state.session)
    }
}

fn write_record<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), AuthError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| AuthError::Storage(format!("failed to serialize session record: {}", e)))?;
    std::fs::write(path, json)
        .map_err(|e| AuthError::Storage(format!("failed to write session record: {}", e)))
}

fn read_record<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    let content = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

/// Registry of active sessions across all viewers.
///
/// Sessions live in memory; remember-me sessions are additionally written
/// through to a per-token [`SessionStore`] directory so they survive a
/// gateway restart. Non-remembered sessions die with the process, mirroring
/// the original session-scoped storage semantics.
#[derive(Debug, Clone)]
pub struct SessionService {
    ttl: Duration,
    sessions: Arc<RwLock<HashMap<String, PersistedAuthState>>>,
    storage_root: Option<PathBuf>,
}

impl SessionService {
    pub fn new(ttl_minutes: i64, storage_root: Option<PathBuf>) -> Self {
        let service = Self {
            ttl: Duration::minutes(ttl_minutes),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            storage_root,
        };
        service.restore();
        service
    }

    /// Session lifetime window
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Restore remember-me sessions persisted by a previous run
    fn restore(&self) {
        let Some(root) = &self.storage_root else {
            return;
        };
        let Ok(entries) = std::fs::read_dir(root) else {
            return;
        };

        let mut restored = 0usize;
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Ok(store) = SessionStore::file(&path) else {
                continue;
            };
            // load() self-cleans expired and malformed record sets
            if let Some(state) = store.load() {
                let mut sessions = self.sessions.write().unwrap();
                sessions.insert(state.session.token.clone(), state);
                restored += 1;
            } else {
                let _ = std::fs::remove_dir(&path);
            }
        }

        if restored > 0 {
            info!(count = restored, "Restored persisted sessions");
        }
    }

    fn store_for(&self, token: &str) -> Option<SessionStore> {
        let root = self.storage_root.as_ref()?;
        SessionStore::file(root.join(token)).ok()
    }

    /// Open a session for a verified profile
    pub fn open_session(
        &self,
        user: UserProfile,
        remember: bool,
    ) -> Result<SessionInfo, AuthError> {
        let session = SessionInfo::new(generate_token(), self.ttl);
        let state = PersistedAuthState {
            user,
            session: session.clone(),
            remember,
        };

        if remember {
            if let Some(store) = self.store_for(&session.token) {
                store.save(&state.user, &state.session, remember)?;
            }
        }

        let mut sessions = self.sessions.write().unwrap();
        sessions.insert(session.token.clone(), state);

        Ok(session)
    }

    /// Validate a session token, refreshing activity on success.
    ///
    /// Expired sessions are removed on sight; the caller only ever observes
    /// a live session or nothing.
    pub fn validate(&self, token: &str) -> Option<PersistedAuthState> {
        let mut sessions = self.sessions.write().unwrap();

        let state = sessions.get_mut(token)?;
        if !state.is_valid() {
            sessions.remove(token);
            drop(sessions);
            self.discard_persisted(token);
            return None;
        }

        state.session.touch(self.ttl);
        let state = state.clone();
        drop(sessions);

        if state.remember {
            if let Some(store) = self.store_for(token) {
                let _ = store.save(&state.user, &state.session, state.remember);
            }
        }

        Some(state)
    }

    /// Close a session (logout)
    pub fn close_session(&self, token: &str) {
        let mut sessions = self.sessions.write().unwrap();
        sessions.remove(token);
        drop(sessions);
        self.discard_persisted(token);
    }

    /// Drop expired sessions; returns how many were removed
    pub fn sweep_expired(&self) -> usize {
        let expired: Vec<String> = {
            let sessions = self.sessions.read().unwrap();
            sessions
                .iter()
                .filter(|(_, state)| !state.is_valid())
                .map(|(token, _)| token.clone())
                .collect()
        };

        for token in &expired {
            let mut sessions = self.sessions.write().unwrap();
            sessions.remove(token);
            drop(sessions);
            self.discard_persisted(token);
        }

        if !expired.is_empty() {
            debug!(count = expired.len(), "Swept expired sessions");
        }
        expired.len()
    }

    fn discard_persisted(&self, token: &str) {
        let Some(root) = &self.storage_root else {
            return;
        };
        let dir = root.join(token);
        if dir.is_dir() {
            if let Ok(store) = SessionStore::file(&dir) {
                store.clear();
            }
            let _ = std::fs::remove_dir(&dir);
        }
    }
}
