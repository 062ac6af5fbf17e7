//! Session guard: the gate in front of protected views
//!
//! A small state machine over the persisted session store. It decides, for
//! each view evaluation, whether to render, redirect to login, or do nothing
//! because a redirect is already underway. All uncertainty resolves to
//! "unauthenticated" — the guard fails closed.

use super::session::SessionStore;
use chrono::Duration;
use smartfdx_core::UserProfile;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Guard states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Initializing,
    Unauthenticated,
    Authenticated,
    RedirectPending,
}

/// Result of one guard evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum GuardOutcome {
    /// Render the view; carries the profile for auth-required views
    Render(Option<UserProfile>),
    /// Navigate to the login page, return path attached
    Redirect(String),
    /// A redirect was already issued; do nothing
    Suppressed,
}

#[derive(Debug)]
struct GuardInner {
    state: GuardState,
    redirect_issued: bool,
}

/// The session guard.
///
/// One instance guards one viewer. Repeated evaluations with unchanged
/// underlying state produce at most one redirect — the latch stays set until
/// `reset` is called after navigation completes.
#[derive(Debug)]
pub struct SessionGuard {
    store: SessionStore,
    login_path: String,
    inner: Arc<Mutex<GuardInner>>,
    expiry_watcher: Option<JoinHandle<()>>,
}

impl SessionGuard {
    pub fn new(store: SessionStore, login_path: impl Into<String>) -> Self {
        Self {
            store,
            login_path: login_path.into(),
            inner: Arc::new(Mutex::new(GuardInner {
                state: GuardState::Initializing,
                redirect_issued: false,
            })),
            expiry_watcher: None,
        }
    }

    /// Current state (for diagnostics and tests)
    pub fn state(&self) -> GuardState {
        self.inner.lock().unwrap().state
    }

    /// Evaluate the guard for a view at `requested_path`.
    ///
    /// Views that declare no auth requirement bypass the machine entirely.
    pub fn evaluate(&self, requested_path: &str, requires_auth: bool) -> GuardOutcome {
        if !requires_auth {
            return GuardOutcome::Render(None);
        }

        let mut inner = self.inner.lock().unwrap();

        // First evaluation resolves Initializing from the persisted store
        if inner.state == GuardState::Initializing {
            inner.state = match self.store.load() {
                Some(_) => GuardState::Authenticated,
                None => GuardState::Unauthenticated,
            };
        }

        match inner.state {
            GuardState::Authenticated => {
                // Re-check on every evaluation; the store self-clears expired
                // state, so a stale session degrades to a redirect here.
                match self.store.load() {
                    Some(state) => GuardOutcome::Render(Some(state.user)),
                    None => {
                        info!("Session no longer valid, denying access");
                        inner.state = GuardState::Unauthenticated;
                        self.issue_redirect(&mut inner, requested_path)
                    }
                }
            }
            GuardState::Unauthenticated => self.issue_redirect(&mut inner, requested_path),
            GuardState::RedirectPending => GuardOutcome::Suppressed,
            GuardState::Initializing => unreachable!("resolved above"),
        }
    }

    fn issue_redirect(&self, inner: &mut GuardInner, requested_path: &str) -> GuardOutcome {
        if inner.redirect_issued {
            return GuardOutcome::Suppressed;
        }
        inner.redirect_issued = true;
        inner.state = GuardState::RedirectPending;
        GuardOutcome::Redirect(login_redirect_url(&self.login_path, requested_path))
    }

    /// Re-arm the guard after a completed navigation (login page reached or
    /// login succeeded). The next evaluation re-reads the store from scratch.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.state = GuardState::Initializing;
        inner.redirect_issued = false;
    }

    /// Start the background expiry watcher.
    ///
    /// Re-validates the persisted session every `period` and demotes the
    /// guard when it expires. The task is aborted when the guard is dropped,
    /// so it can never act on a store it no longer owns.
    pub fn spawn_expiry_watcher(&mut self, period: std::time::Duration) {
        let store = self.store.clone();
        let inner = Arc::clone(&self.inner);

        self.expiry_watcher = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await; // first tick fires immediately
            loop {
                interval.tick().await;
                let mut inner = inner.lock().unwrap();
                if inner.state == GuardState::Authenticated && store.load().is_none() {
                    debug!("Expiry watcher demoted guard to unauthenticated");
                    store.clear();
                    inner.state = GuardState::Unauthenticated;
                }
            }
        }));
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Some(watcher) = &self.expiry_watcher {
            watcher.abort();
        }
    }
}

/// Build the login URL carrying the originally requested path
pub fn login_redirect_url(login_path: &str, requested_path: &str) -> String {
    format!(
        "{}?redirect={}",
        login_path,
        urlencoding::encode(requested_path)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::generate_token;
    use smartfdx_core::SessionInfo;

    fn lab_user() -> UserProfile {
        UserProfile {
            id: 1,
            account: "zhang_lab".to_string(),
            name: "张三".to_string(),
            department: "化验室".to_string(),
            phone: "13800000000".to_string(),
            wechat: None,
            workspace: Some("化验室".to_string()),
            title: None,
            status: Some(true),
        }
    }

    fn store_with_session(ttl_minutes: i64) -> SessionStore {
        let store = SessionStore::memory();
        let session = SessionInfo::new(generate_token(), Duration::minutes(ttl_minutes));
        store.save(&lab_user(), &session, true).unwrap();
        store
    }

    #[test]
    fn test_no_auth_views_bypass_the_machine() {
        let guard = SessionGuard::new(SessionStore::memory(), "/login");
        assert_eq!(guard.evaluate("/login", false), GuardOutcome::Render(None));
        // Bypass does not advance the state machine
        assert_eq!(guard.state(), GuardState::Initializing);
    }

    #[test]
    fn test_valid_session_renders() {
        let guard = SessionGuard::new(store_with_session(480), "/login");

        match guard.evaluate("/workspace/lab", true) {
            GuardOutcome::Render(Some(user)) => assert_eq!(user.account, "zhang_lab"),
            other => panic!("expected render, got {:?}", other),
        }
        assert_eq!(guard.state(), GuardState::Authenticated);
    }

    #[test]
    fn test_redirect_carries_return_path() {
        let guard = SessionGuard::new(SessionStore::memory(), "/login");

        match guard.evaluate("/workspace/lab", true) {
            GuardOutcome::Redirect(url) => {
                assert_eq!(url, "/login?redirect=%2Fworkspace%2Flab");
            }
            other => panic!("expected redirect, got {:?}", other),
        }
        assert_eq!(guard.state(), GuardState::RedirectPending);
    }

    #[test]
    fn test_repeated_evaluations_issue_one_redirect() {
        let guard = SessionGuard::new(SessionStore::memory(), "/login");

        let first = guard.evaluate("/workspace/lab", true);
        let second = guard.evaluate("/workspace/lab", true);
        let third = guard.evaluate("/workspace/lab", true);

        assert!(matches!(first, GuardOutcome::Redirect(_)));
        assert_eq!(second, GuardOutcome::Suppressed);
        assert_eq!(third, GuardOutcome::Suppressed);
    }

    #[test]
    fn test_reset_rearms_after_login() {
        let store = SessionStore::memory();
        let guard = SessionGuard::new(store.clone(), "/login");

        assert!(matches!(
            guard.evaluate("/workspace/lab", true),
            GuardOutcome::Redirect(_)
        ));

        // Login happens elsewhere, store is repopulated
        let session = SessionInfo::new(generate_token(), Duration::minutes(480));
        store.save(&lab_user(), &session, true).unwrap();
        guard.reset();

        assert!(matches!(
            guard.evaluate("/workspace/lab", true),
            GuardOutcome::Render(Some(_))
        ));
    }

    #[test]
    fn test_expired_session_fails_closed() {
        let guard = SessionGuard::new(store_with_session(-1), "/login");

        match guard.evaluate("/workspace/lab", true) {
            GuardOutcome::Redirect(url) => {
                assert!(url.starts_with("/login?redirect="));
            }
            other => panic!("expected redirect, got {:?}", other),
        }
    }

    #[test]
    fn test_session_expiring_mid_flight_demotes_authenticated_guard() {
        let store = store_with_session(480);
        let guard = SessionGuard::new(store.clone(), "/login");

        assert!(matches!(
            guard.evaluate("/workspace/lab", true),
            GuardOutcome::Render(Some(_))
        ));

        // The session disappears under an Authenticated guard
        store.clear();
        assert!(matches!(
            guard.evaluate("/workspace/lab", true),
            GuardOutcome::Redirect(_)
        ));
        // And the latch still holds afterwards
        assert_eq!(
            guard.evaluate("/workspace/lab", true),
            GuardOutcome::Suppressed
        );
    }

    #[tokio::test]
    async fn test_expiry_watcher_demotes_and_stops_on_drop() {
        let store = store_with_session(480);
        let mut guard = SessionGuard::new(store.clone(), "/login");
        assert!(matches!(
            guard.evaluate("/workspace/lab", true),
            GuardOutcome::Render(Some(_))
        ));

        guard.spawn_expiry_watcher(std::time::Duration::from_millis(20));

        // Invalidate the session behind the guard's back
        store.clear();
        tokio::time::sleep(std::time::Duration::from_millis(80)).await;

        assert_eq!(guard.state(), GuardState::Unauthenticated);

        // Dropping the guard aborts the watcher task
        let abort_handle = guard.expiry_watcher.as_ref().unwrap().abort_handle();
        drop(guard);
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(abort_handle.is_finished());
    }
}
