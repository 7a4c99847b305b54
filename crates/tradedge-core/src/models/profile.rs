use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Profile snapshot older than this is reported as stale.
const PROFILE_STALE_MINUTES: i64 = 60;

/// A user profile as returned by the profile service.
///
/// The service owns the shape of the record, so the fields are kept opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl UserProfile {
    pub fn new(user_id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            user_id: user_id.into(),
            fields,
        }
    }

    /// Build a profile from a service payload. Non-object payloads are kept
    /// under a single `value` field rather than dropped.
    pub fn from_value(user_id: impl Into<String>, value: Value) -> Self {
        let fields = match value {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        Self::new(user_id, fields)
    }

    /// String field lookup, used for display names and similar.
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn display_name(&self) -> &str {
        self.field_str("username")
            .or_else(|| self.field_str("name"))
            .unwrap_or(&self.user_id)
    }
}

/// Profile snapshot as written to the persisted store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedProfile {
    pub profile: UserProfile,
    pub cached_at: DateTime<Utc>,
}

impl CachedProfile {
    pub fn new(profile: UserProfile) -> Self {
        Self {
            profile,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    pub fn is_stale(&self) -> bool {
        self.age_minutes() > PROFILE_STALE_MINUTES
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Clock skew lands here too
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            format!("{}h ago", minutes / 60)
        } else {
            format!("{}d ago", minutes / 1440)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn test_from_value_keeps_object_fields() {
        let profile = UserProfile::from_value("42", json!({"username": "asha", "kyc": true}));
        assert_eq!(profile.user_id, "42");
        assert_eq!(profile.display_name(), "asha");
        assert_eq!(profile.fields.get("kyc"), Some(&json!(true)));
    }

    #[test]
    fn test_from_value_wraps_scalars() {
        let profile = UserProfile::from_value("7", json!("plain"));
        assert_eq!(profile.field_str("value"), Some("plain"));
        assert_eq!(profile.display_name(), "7");

        let empty = UserProfile::from_value("7", Value::Null);
        assert!(empty.fields.is_empty());
    }

    #[test]
    fn test_cached_profile_age() {
        let mut cached = CachedProfile::new(UserProfile::new("1", Map::new()));
        assert_eq!(cached.age_display(), "just now");
        assert!(!cached.is_stale());

        cached.cached_at = Utc::now() - Duration::minutes(90);
        assert_eq!(cached.age_display(), "1h ago");
        assert!(cached.is_stale());

        cached.cached_at = Utc::now() - Duration::days(3);
        assert_eq!(cached.age_display(), "3d ago");
    }

    #[test]
    fn test_cached_profile_roundtrips_through_json() {
        let cached = CachedProfile::new(UserProfile::from_value("9", json!({"name": "Ravi"})));
        let text = serde_json::to_string(&cached).unwrap();
        let parsed: CachedProfile = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.profile, cached.profile);
    }
}
