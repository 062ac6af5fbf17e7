//! Credential verification against the external store

use super::AuthError;
use crate::postgrest::{eq, PostgrestClient};
use argon2::{
    password_hash::{PasswordHash, PasswordVerifier},
    Argon2,
};
use serde::Deserialize;
use smartfdx_core::UserProfile;
use tracing::{debug, warn};

/// Credential row as stored in the external `users` table.
///
/// The only type that ever sees the stored password. Private to this module;
/// it leaves the auth boundary as a [`UserProfile`] with the password dropped.
#[derive(Debug, Clone, Deserialize)]
struct CredentialRecord {
    id: i64,
    account: String,
    name: String,
    department: String,
    phone: String,
    wechat: Option<String>,
    password: String,
    workspace: Option<String>,
    title: Option<String>,
    status: Option<bool>,
}

impl CredentialRecord {
    /// Convert to the public profile, dropping the password field
    fn into_profile(self) -> UserProfile {
        UserProfile {
            id: self.id,
            account: self.account,
            name: self.name,
            department: self.department,
            phone: self.phone,
            wechat: self.wechat,
            workspace: self.workspace,
            title: self.title,
            status: self.status,
        }
    }
}

/// Auth Verifier: one lookup, one comparison, no retries
#[derive(Debug, Clone)]
pub struct AuthVerifier {
    client: PostgrestClient,
    users_table: String,
}

impl AuthVerifier {
    pub fn new(client: PostgrestClient, users_table: String) -> Self {
        Self {
            client,
            users_table,
        }
    }

    /// Verify an account/password pair against the credential store.
    ///
    /// Looks up exactly one non-deleted record for the account. A failed
    /// lookup is surfaced immediately to the caller; nothing is written.
    pub async fn verify(&self, account: &str, password: &str) -> Result<UserProfile, AuthError> {
        if account.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let rows: Vec<CredentialRecord> = self
            .client
            .select(
                &self.users_table,
                &[("account", eq(account)), ("deleted", "eq.false".to_string())],
                "*",
                1,
            )
            .await?;

        let record = match rows.into_iter().next() {
            Some(record) => record,
            None => {
                debug!(account = account, "Login attempt for unknown account");
                return Err(AuthError::AccountNotFound);
            }
        };

        if !verify_password(password, &record.password) {
            warn!(account = account, "Invalid password for account");
            return Err(AuthError::InvalidCredentials);
        }

        debug!(account = account, "Account verified");
        Ok(record.into_profile())
    }
}

/// Check a supplied password against the stored value.
///
/// The store holds cleartext today (byte-for-byte comparison), but records
/// migrated to argon2 are PHC-format strings and are verified as hashes, so
/// the store can migrate without a gateway change.
fn verify_password(supplied: &str, stored: &str) -> bool {
    if let Ok(parsed_hash) = PasswordHash::new(stored) {
        return Argon2::default()
            .verify_password(supplied.as_bytes(), &parsed_hash)
            .is_ok();
    }

    supplied.as_bytes() == stored.as_bytes()
}
