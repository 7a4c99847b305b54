use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{KeyValueStore, LoginError, StoreError};
use crate::models::{CachedProfile, UserProfile};

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const USER_ID_KEY: &str = "user_id";
pub const USER_DETAILS_KEY: &str = "user_details";

/// Every key a session writes; logout removes all of them.
pub const SESSION_KEYS: [&str; 3] = [USER_DETAILS_KEY, ACCESS_TOKEN_KEY, USER_ID_KEY];

/// The durable pair that lets a session resume after a restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: String,
    pub user_id: String,
}

/// Raw login result handed over by the login provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginPayload {
    pub user_id: Option<String>,
    pub access_token: Option<String>,
    /// Profile fields known at login time, shown until the fetch returns.
    #[serde(default)]
    pub profile: Option<Value>,
}

impl LoginPayload {
    pub fn new(user_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            access_token: Some(access_token.into()),
            profile: None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, LoginError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Strip the provider prefix from the user id and validate the payload.
    pub fn normalize(self, prefix: &str) -> Result<(Credentials, Option<UserProfile>), LoginError> {
        let raw_id = self.user_id.ok_or(LoginError::MissingUserId)?;
        let user_id = normalize_user_id(&raw_id, prefix);
        if user_id.is_empty() {
            return Err(LoginError::MissingUserId);
        }

        let access_token = self
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(LoginError::MissingAccessToken)?;

        let hint = self
            .profile
            .map(|value| UserProfile::from_value(user_id.clone(), value));

        Ok((Credentials { access_token, user_id }, hint))
    }
}

/// Remove the login provider's prefix, if present.
pub fn normalize_user_id(raw: &str, prefix: &str) -> String {
    let trimmed = raw.trim();
    trimmed.strip_prefix(prefix).unwrap_or(trimmed).to_string()
}

/// Session-facing view of the persisted store.
///
/// Writes are best-effort: a failed write is logged and otherwise ignored so
/// a broken disk never takes the session down. Clearing is the exception and
/// reports failure to the caller.
#[derive(Clone)]
pub struct CredentialStore {
    inner: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(inner: Arc<dyn KeyValueStore>) -> Self {
        Self { inner }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.inner.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                warn!(key = key, error = %e, "Failed to read from store");
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.inner.set(key, value) {
            warn!(key = key, error = %e, "Failed to write to store");
        }
    }

    /// Stored credentials, if both halves are present.
    pub fn load_credentials(&self) -> Option<Credentials> {
        let access_token = self.read(ACCESS_TOKEN_KEY)?;
        let user_id = self.read(USER_ID_KEY)?;
        Some(Credentials { access_token, user_id })
    }

    pub fn has_credentials(&self) -> bool {
        self.load_credentials().is_some()
    }

    pub fn save_credentials(&self, credentials: &Credentials) {
        self.write(ACCESS_TOKEN_KEY, &credentials.access_token);
        self.write(USER_ID_KEY, &credentials.user_id);
    }

    pub fn load_profile(&self) -> Option<CachedProfile> {
        let raw = self.read(USER_DETAILS_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(cached) => Some(cached),
            Err(e) => {
                debug!(error = %e, "Ignoring unreadable cached profile");
                None
            }
        }
    }

    pub fn save_profile(&self, profile: &UserProfile) {
        match serde_json::to_string(&CachedProfile::new(profile.clone())) {
            Ok(json) => self.write(USER_DETAILS_KEY, &json),
            Err(e) => warn!(error = %e, "Failed to serialize profile"),
        }
    }

    /// Remove every session key.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.inner.remove_many(&SESSION_KEYS)
    }
}
