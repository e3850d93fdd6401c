//! Cache refresh: pull the authoritative directory and overwrite the snapshot
//!
//! Always a full replace, never a diff. The cache has no expiry of its own,
//! so callers that need near-real-time state refresh immediately before a
//! uniqueness check.

use crate::crypto::CacheKey;
use crate::directory::{DirectorySnapshot, SnapshotStore};
use crate::error::Result;
use crate::provider::DirectoryClient;
use tracing::info;

/// Fetch the full directory from the provider and persist it
///
/// If the listing call fails, the error propagates and the previously
/// stored snapshot is left untouched.
pub fn refresh<C: DirectoryClient>(
    client: &C,
    store: &SnapshotStore,
    key: &CacheKey,
) -> Result<DirectorySnapshot> {
    let users = client.list_users(None)?;
    let snapshot = DirectorySnapshot::new(users);

    store.save(&snapshot, key)?;

    info!(users = snapshot.len(), "Refreshed directory snapshot");
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::test_user;
    use crate::error::Error;
    use crate::provider::{Invite, NewUser};
    use crate::directory::UserRecord;
    use chrono::{DateTime, Utc};
    use std::fs;
    use tempfile::TempDir;

    struct FakeClient {
        users: Vec<UserRecord>,
        fail_listing: bool,
    }

    impl DirectoryClient for FakeClient {
        fn list_users(&self, _search: Option<&str>) -> Result<Vec<UserRecord>> {
            if self.fail_listing {
                return Err(Error::DirectoryClient("listing unavailable".to_string()));
            }
            Ok(self.users.clone())
        }

        fn create_user(&self, _user: &NewUser) -> Result<Option<String>> {
            unimplemented!()
        }

        fn set_user_active(&self, _user_id: &str, _is_active: bool) -> Result<()> {
            unimplemented!()
        }

        fn delete_user(&self, _user_id: &str) -> Result<bool> {
            unimplemented!()
        }

        fn set_password(&self, _user_id: &str, _new_password: &str) -> Result<()> {
            unimplemented!()
        }

        fn get_recovery_link(&self, _user_id: &str) -> Result<String> {
            unimplemented!()
        }

        fn create_invite(&self, _label: &str, _expires: DateTime<Utc>) -> Result<Invite> {
            unimplemented!()
        }
    }

    fn test_key() -> CacheKey {
        CacheKey::derive("refresh test passphrase")
    }

    #[test]
    fn test_refresh_persists_listing() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("users.db"));
        let key = test_key();

        let client = FakeClient {
            users: vec![test_user("1", "alice"), test_user("2", "bob")],
            fail_listing: false,
        };

        let snapshot = refresh(&client, &store, &key).unwrap();
        assert_eq!(snapshot.len(), 2);

        let loaded = store.load(&key).unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_refresh_overwrites_prior_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("users.db"));
        let key = test_key();

        store
            .save(&DirectorySnapshot::new(vec![test_user("1", "stale")]), &key)
            .unwrap();

        let client = FakeClient {
            users: vec![test_user("2", "fresh")],
            fail_listing: false,
        };
        refresh(&client, &store, &key).unwrap();

        let loaded = store.load(&key).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.users[0].username, "fresh");
    }

    #[test]
    fn test_failed_listing_leaves_snapshot_unchanged() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("users.db"));
        let key = test_key();

        store
            .save(&DirectorySnapshot::new(vec![test_user("1", "alice")]), &key)
            .unwrap();
        let bytes_before = fs::read(store.path()).unwrap();

        let client = FakeClient {
            users: vec![],
            fail_listing: true,
        };
        let result = refresh(&client, &store, &key);
        assert!(matches!(result, Err(Error::DirectoryClient(_))));

        let bytes_after = fs::read(store.path()).unwrap();
        assert_eq!(bytes_before, bytes_after);
    }

    #[test]
    fn test_refresh_creates_snapshot_when_absent() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("users.db"));
        let key = test_key();

        assert!(matches!(
            store.load(&key),
            Err(Error::SnapshotNotFound(_))
        ));

        let client = FakeClient {
            users: vec![test_user("1", "alice")],
            fail_listing: false,
        };
        refresh(&client, &store, &key).unwrap();

        assert!(store.load(&key).is_ok());
    }
}
