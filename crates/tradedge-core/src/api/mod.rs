//! HTTP client module for the dashboard services.
//!
//! This module provides the `ApiClient` for fetching a user's profile
//! (KYC record) and package transactions, and the `DashboardApi` trait the
//! session manager is written against.
//!
//! Neither service needs a bearer token; requests are keyed by user id.

pub mod client;
pub mod error;

pub use client::{ApiClient, DashboardApi};
pub use error::{ApiError, Resource};
