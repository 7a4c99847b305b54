//! Data models for the dashboard session.
//!
//! This module contains the data structures shared by the API client,
//! the credential store, and the session manager:
//!
//! - `UserProfile`, `CachedProfile`: Profile record and its persisted snapshot
//! - `TransactionRecord`, `PaymentEntry`, `PaymentStatus`: Package purchases
//! - `Session`, `Loadable`, `SessionSnapshot`: Published session state

pub mod profile;
pub mod session;
pub mod transaction;

pub use profile::{CachedProfile, UserProfile};
pub use session::{Loadable, Session, SessionSnapshot};
pub use transaction::{Amount, PackageDetails, PaymentEntry, PaymentStatus, TransactionRecord};
