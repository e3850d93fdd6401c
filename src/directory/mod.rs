//! Local mirror of the identity-provider user directory
//!
//! The provider is the source of truth; the local snapshot is a read-mostly
//! replica that is always rewritten whole, never merged field-by-field.

mod refresh;
mod store;
mod table;

pub use refresh::refresh;
pub use store::SnapshotStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One identity-provider account
///
/// `id` is the provider-assigned stable identifier and never changes.
/// `username` is unique within the provider; comparisons against it are
/// case-insensitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(alias = "pk", deserialize_with = "deserialize_id")]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    /// Display name ("name" in the provider's API)
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

/// The provider serves numeric primary keys; older deployments used strings.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Num(i64),
        Str(String),
    }

    Ok(match IdRepr::deserialize(deserializer)? {
        IdRepr::Num(n) => n.to_string(),
        IdRepr::Str(s) => s,
    })
}

/// Point-in-time copy of the full user directory
///
/// Ordered as returned by the provider. Persisted as a single encrypted
/// blob by [`SnapshotStore`]; it is a cache, not a system of record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectorySnapshot {
    pub users: Vec<UserRecord>,
}

impl DirectorySnapshot {
    pub fn new(users: Vec<UserRecord>) -> Self {
        DirectorySnapshot { users }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Case-insensitive membership test for a username
    pub fn contains_username(&self, username: &str) -> bool {
        let needle = username.to_lowercase();
        self.users
            .iter()
            .any(|u| u.username.to_lowercase() == needle)
    }

    /// All usernames, lowercased, for collision resolution
    pub fn usernames(&self) -> HashSet<String> {
        self.users
            .iter()
            .map(|u| u.username.to_lowercase())
            .collect()
    }
}

#[cfg(test)]
pub(crate) fn test_user(id: &str, username: &str) -> UserRecord {
    UserRecord {
        id: id.to_string(),
        username: username.to_string(),
        email: format!("{}@example.com", username),
        name: username.to_string(),
        is_active: true,
        last_login: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_username_case_insensitive() {
        let snapshot = DirectorySnapshot::new(vec![test_user("1", "Alice")]);

        assert!(snapshot.contains_username("Alice"));
        assert!(snapshot.contains_username("alice"));
        assert!(snapshot.contains_username("ALICE"));
        assert!(!snapshot.contains_username("bob"));
    }

    #[test]
    fn test_contains_username_empty_snapshot() {
        let snapshot = DirectorySnapshot::default();
        assert!(!snapshot.contains_username("anyone"));
    }

    #[test]
    fn test_usernames_lowercased() {
        let snapshot =
            DirectorySnapshot::new(vec![test_user("1", "Alice"), test_user("2", "BOB")]);

        let names = snapshot.usernames();
        assert!(names.contains("alice"));
        assert!(names.contains("bob"));
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_user_record_from_provider_json() {
        let json = r#"{
            "pk": 42,
            "username": "jdoe",
            "email": "jdoe@example.com",
            "name": "John Doe",
            "is_active": true,
            "last_login": "2024-05-01T12:30:00Z"
        }"#;

        let user: UserRecord = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, "42");
        assert_eq!(user.username, "jdoe");
        assert!(user.last_login.is_some());
    }
}
