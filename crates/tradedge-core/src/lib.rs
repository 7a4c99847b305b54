//! Core library for the TradEdge dashboard.
//!
//! The dashboard itself is presentation; the logic lives here. A
//! `SessionManager` resumes or establishes a session from persisted
//! credentials, fetches the user's profile and package transactions, derives
//! which packages were purchased, and publishes a `SessionSnapshot` for the
//! UI to render.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod nav;
pub mod purchases;

pub use api::{ApiClient, ApiError, DashboardApi};
pub use auth::{CredentialStore, LoginError, LoginPayload, SessionManager, StoreError};
pub use config::{Config, StorageBackend};
pub use models::{Session, SessionSnapshot, TransactionRecord, UserProfile};
pub use nav::{route_after_bootstrap, HistoryMode, Navigator, Route};
pub use purchases::PurchasedPackages;
