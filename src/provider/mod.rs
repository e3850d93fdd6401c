//! Identity-provider API surface
//!
//! The provider is an external collaborator; everything here is plain
//! request/response glue with no retries and no caching of its own.

mod http;

pub use http::HttpDirectoryClient;

use crate::directory::UserRecord;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Fields for a new provider account
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub username: String,
    pub name: String,
    pub email: String,
    pub groups: Vec<String>,
}

/// A created invitation
#[derive(Debug, Clone, PartialEq)]
pub struct Invite {
    /// Provider-assigned invitation token
    pub id: String,
    pub expires: DateTime<Utc>,
}

/// Operations the identity provider exposes
///
/// `list_users` always returns the complete matching set; pagination is
/// the implementation's problem, not the caller's.
pub trait DirectoryClient {
    fn list_users(&self, search: Option<&str>) -> Result<Vec<UserRecord>>;

    /// Returns `None` when the provider rejects the account (e.g. the
    /// username is already taken), the created user's id otherwise.
    fn create_user(&self, user: &NewUser) -> Result<Option<String>>;

    fn set_user_active(&self, user_id: &str, is_active: bool) -> Result<()>;

    fn delete_user(&self, user_id: &str) -> Result<bool>;

    fn set_password(&self, user_id: &str, new_password: &str) -> Result<()>;

    fn get_recovery_link(&self, user_id: &str) -> Result<String>;

    fn create_invite(&self, label: &str, expires: DateTime<Utc>) -> Result<Invite>;

    /// Resolve a username to the provider's user id
    fn get_user_id_by_username(&self, username: &str) -> Result<String> {
        let needle = username.to_lowercase();
        self.list_users(Some(username))?
            .into_iter()
            .find(|u| u.username.to_lowercase() == needle)
            .map(|u| u.id)
            .ok_or_else(|| Error::UserNotFound(username.to_string()))
    }
}
