//! Published session state.
//!
//! `SessionSnapshot` is what consumers observe. It is only ever written by
//! the `SessionManager`; everyone else gets clones through a watch channel.

use serde::{Deserialize, Serialize};

use super::{TransactionRecord, UserProfile};
use crate::purchases::PurchasedPackages;

/// Authentication flags of the running session.
///
/// `is_bootstrapping` starts out `true` so a consumer can tell "still
/// deciding" apart from "decided: logged out".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Session {
    pub is_active: bool,
    pub is_bootstrapping: bool,
    pub login_in_progress: bool,
    pub login_error: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            is_active: false,
            is_bootstrapping: true,
            login_in_progress: false,
            login_error: None,
        }
    }
}

/// A remotely fetched resource with its own loading flag and error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Loadable<T> {
    pub data: T,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Loadable<T> {
    pub fn is_available(&self) -> bool {
        !self.loading && self.error.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session: Session,
    pub profile: Loadable<Option<UserProfile>>,
    pub transactions: Loadable<Vec<TransactionRecord>>,
    pub purchased: PurchasedPackages,
}

impl SessionSnapshot {
    pub fn is_active(&self) -> bool {
        self.session.is_active
    }

    pub fn is_bootstrapping(&self) -> bool {
        self.session.is_bootstrapping
    }

    /// Reset everything except the bootstrap flag, which only the bootstrap
    /// sequence itself may clear.
    pub(crate) fn reset(&mut self) {
        let is_bootstrapping = self.session.is_bootstrapping;
        *self = Self::default();
        self.session.is_bootstrapping = is_bootstrapping;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_session_is_undecided() {
        let snapshot = SessionSnapshot::default();
        assert!(snapshot.is_bootstrapping());
        assert!(!snapshot.is_active());
        assert!(snapshot.profile.data.is_none());
        assert!(snapshot.purchased.is_empty());
    }

    #[test]
    fn test_reset_keeps_bootstrap_flag() {
        let mut snapshot = SessionSnapshot::default();
        snapshot.session.is_active = true;
        snapshot.session.login_error = Some("boom".to_string());
        snapshot.transactions.error = Some("down".to_string());

        snapshot.reset();
        assert!(!snapshot.is_active());
        assert!(snapshot.is_bootstrapping());
        assert!(snapshot.session.login_error.is_none());
        assert!(snapshot.transactions.error.is_none());

        snapshot.session.is_bootstrapping = false;
        snapshot.reset();
        assert!(!snapshot.is_bootstrapping());
    }

    #[test]
    fn test_loadable_availability() {
        let mut profile: Loadable<Option<UserProfile>> = Loadable::default();
        assert!(profile.is_available());
        profile.loading = true;
        assert!(!profile.is_available());
        profile.loading = false;
        profile.error = Some("Failed to fetch user details".to_string());
        assert!(!profile.is_available());
    }
}
