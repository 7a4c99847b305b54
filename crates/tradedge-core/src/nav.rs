//! Navigation contract between the session and whatever renders routes.
//!
//! The session manager only announces a successful login. Deciding to send
//! an unauthenticated user to the passcode screen is left to consumers, via
//! `route_after_bootstrap`.

use serde::{Deserialize, Serialize};

use crate::models::SessionSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum Route {
    /// Authenticated landing page
    Home,
    /// One-time-passcode login
    Otp,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/home",
            Route::Otp => "/otp",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum HistoryMode {
    Push,
    Replace,
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route, mode: HistoryMode);
}

/// Where a consumer should send the user once the session has settled.
///
/// `None` while bootstrap is still deciding, or when the session is active.
pub fn route_after_bootstrap(snapshot: &SessionSnapshot) -> Option<Route> {
    if snapshot.is_bootstrapping() || snapshot.is_active() {
        None
    } else {
        Some(Route::Otp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_after_bootstrap() {
        let mut snapshot = SessionSnapshot::default();
        assert_eq!(route_after_bootstrap(&snapshot), None);

        snapshot.session.is_bootstrapping = false;
        assert_eq!(route_after_bootstrap(&snapshot), Some(Route::Otp));

        snapshot.session.is_active = true;
        assert_eq!(route_after_bootstrap(&snapshot), None);
    }

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::Home.path(), "/home");
        assert_eq!(Route::Otp.to_string(), "/otp");
    }
}
