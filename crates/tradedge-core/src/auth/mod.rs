//! Authentication module for the dashboard session.
//!
//! This module provides:
//! - `SessionManager`: Login, logout, and bootstrap with published state
//! - `CredentialStore`: Persisted access token, user id, and cached profile
//! - `KeyValueStore` backends: file, OS keychain, and in-memory
//!
//! Credentials are the only state that survives a restart; everything else
//! is re-fetched on bootstrap.

pub mod credentials;
pub mod error;
pub mod session;
pub mod store;

pub use credentials::{normalize_user_id, CredentialStore, Credentials, LoginPayload, SESSION_KEYS};
pub use error::{LoginError, StoreError};
pub use session::SessionManager;
pub use store::{FileStore, KeyValueStore, KeyringStore, MemoryStore};
