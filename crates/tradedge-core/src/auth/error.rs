use thiserror::Error;

/// Banner text for any login payload that cannot be processed.
const LOGIN_FALLBACK_MESSAGE: &str = "Error processing login";

#[derive(Error, Debug)]
pub enum LoginError {
    #[error("Login payload has no user id")]
    MissingUserId,

    #[error("Login payload has no access token")]
    MissingAccessToken,

    #[error("Invalid login payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error("A login is already in progress")]
    InProgress,

    #[error("Logged out before the login completed")]
    Superseded,

    #[error("Credentials could not be saved")]
    NotPersisted,
}

impl LoginError {
    /// Malformed payloads are the errors that surface as a login banner.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LoginError::MissingUserId | LoginError::MissingAccessToken | LoginError::InvalidPayload(_)
        )
    }

    /// Errors the user is told about through the login banner.
    pub fn shows_banner(&self) -> bool {
        self.is_validation() || matches!(self, LoginError::NotPersisted)
    }

    pub fn user_message(&self) -> String {
        LOGIN_FALLBACK_MESSAGE.to_string()
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Storage lock poisoned")]
    Poisoned,
}
