//! Administrative flows against the identity provider
//!
//! Ties the cache, the username resolver and the provider client together.
//! Every flow is a blocking call; the service owns the derived cache key
//! and the snapshot store explicitly, nothing is ambient.

use crate::config::{Config, DEFAULT_INVITE_HOURS};
use crate::crypto::CacheKey;
use crate::directory::{refresh, DirectorySnapshot, SnapshotStore, UserRecord};
use crate::error::{Error, Result};
use crate::provider::{DirectoryClient, NewUser};
use crate::shortener::shorten_url;
use crate::username::{derive_base_username, exists, resolve_unique};
use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

/// Enrollment flow slug used in invitation links
const ENROLLMENT_FLOW_SLUG: &str = "simple-enrollment-flow";

/// Inputs for account creation
#[derive(Debug, Clone, Default)]
pub struct CreateUserRequest {
    pub first_name: String,
    pub last_name: String,
    /// Explicit username; derived from the name parts when absent
    pub username: Option<String>,
    /// Explicit email; defaults to `{username}@{base_domain}`
    pub email: Option<String>,
}

/// A successfully created account
#[derive(Debug, Clone)]
pub struct CreatedAccount {
    pub id: String,
    pub username: String,
    pub email: String,
    pub name: String,
}

/// A generated invitation link
#[derive(Debug, Clone)]
pub struct InviteLink {
    pub link: String,
    pub expires: DateTime<Utc>,
}

/// Admin operations service
pub struct AdminService<C: DirectoryClient> {
    client: C,
    store: SnapshotStore,
    key: CacheKey,
    config: Config,
}

impl<C: DirectoryClient> AdminService<C> {
    pub fn new(client: C, key: CacheKey, config: Config) -> Self {
        let store = SnapshotStore::new(&config.cache.snapshot_path);
        AdminService {
            client,
            store,
            key,
            config,
        }
    }

    /// Pull the live directory and overwrite the local snapshot
    pub fn refresh(&self) -> Result<DirectorySnapshot> {
        refresh(&self.client, &self.store, &self.key)
    }

    /// Current snapshot, refreshing when none is usable yet
    ///
    /// A missing or unparseable snapshot is rebuilt from the live
    /// directory; a wrong-key decryption failure propagates untouched.
    pub fn snapshot(&self) -> Result<DirectorySnapshot> {
        match self.store.load(&self.key) {
            Ok(snapshot) => Ok(snapshot),
            Err(Error::SnapshotNotFound(_)) => self.refresh(),
            Err(Error::CorruptSnapshot(reason)) => {
                warn!("Discarding corrupt snapshot ({}), refreshing", reason);
                self.refresh()
            }
            Err(e) => Err(e),
        }
    }

    /// Check whether a username is taken, against a fresh snapshot
    pub fn username_taken(&self, username: &str) -> Result<bool> {
        let snapshot = self.refresh()?;
        Ok(exists(username, &snapshot))
    }

    /// Create a provider account with a collision-free username
    pub fn create_user(&self, request: &CreateUserRequest) -> Result<CreatedAccount> {
        let base = match &request.username {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => derive_base_username(&request.first_name, &request.last_name),
        };

        // Sync the snapshot right before the uniqueness check
        let snapshot = self.refresh()?;
        let mut username = if exists(&base, &snapshot) {
            resolve_unique(&base, &snapshot.usernames())
        } else {
            base.clone()
        };

        let mut attempt = self.build_new_user(request, &username);
        let created = match self.client.create_user(&attempt)? {
            Some(id) => id,
            None => {
                // The cache lost a race with another admin; re-resolve
                // against the live listing and try once more.
                let live: std::collections::HashSet<String> = self
                    .client
                    .list_users(None)?
                    .into_iter()
                    .map(|u| u.username)
                    .collect();
                username = resolve_unique(&base, &live);
                attempt = self.build_new_user(request, &username);

                self.client.create_user(&attempt)?.ok_or_else(|| {
                    Error::DirectoryClient(format!(
                        "Provider rejected user '{}' twice",
                        username
                    ))
                })?
            }
        };

        info!(username = %username, id = %created, "Created provider account");
        Ok(CreatedAccount {
            id: created,
            username,
            email: attempt.email,
            name: attempt.name,
        })
    }

    fn build_new_user(&self, request: &CreateUserRequest, username: &str) -> NewUser {
        let name = format!(
            "{} {}",
            request.first_name.trim(),
            request.last_name.trim()
        )
        .trim()
        .to_string();

        let email = match &request.email {
            Some(email) if !email.trim().is_empty() => email.trim().to_string(),
            _ => format!("{}@{}", username, self.config.provider.base_domain),
        };

        let groups = if self.config.provider.group_id.is_empty() {
            Vec::new()
        } else {
            vec![self.config.provider.group_id.clone()]
        };

        NewUser {
            username: username.to_string(),
            name: if name.is_empty() {
                username.to_string()
            } else {
                name
            },
            email,
            groups,
        }
    }

    /// Password-recovery link for an existing account, shortened when a
    /// shortener is configured
    pub fn recovery_link(&self, username: &str) -> Result<String> {
        let user_id = self.client.get_user_id_by_username(username)?;
        let link = self.client.get_recovery_link(&user_id)?;

        Ok(shorten_url(
            self.config.shortener.as_ref(),
            &link,
            "recovery",
            Some(username),
        ))
    }

    /// Create a single-use enrollment invitation
    pub fn create_invite(
        &self,
        label: Option<&str>,
        expires: Option<DateTime<Utc>>,
    ) -> Result<InviteLink> {
        let now = Utc::now();
        let label = match label {
            Some(label) if !label.trim().is_empty() => {
                format!("{}-{}", label.trim(), now.format("%H-%M"))
            }
            _ => now.format("%H-%M").to_string(),
        };
        let expires = expires.unwrap_or(now + Duration::hours(DEFAULT_INVITE_HOURS));

        let invite = self.client.create_invite(&label, expires)?;

        let link = format!(
            "{}/if/flow/{}/?itoken={}",
            self.provider_root(),
            ENROLLMENT_FLOW_SLUG,
            invite.id
        );

        Ok(InviteLink {
            link: shorten_url(self.config.shortener.as_ref(), &link, "invite", None),
            expires: invite.expires,
        })
    }

    pub fn list_users(&self, search: Option<&str>) -> Result<Vec<UserRecord>> {
        self.client.list_users(search)
    }

    pub fn set_user_active(&self, user_id: &str, is_active: bool) -> Result<()> {
        self.client.set_user_active(user_id, is_active)
    }

    pub fn delete_user(&self, user_id: &str) -> Result<bool> {
        self.client.delete_user(user_id)
    }

    pub fn reset_password(&self, user_id: &str, new_password: &str) -> Result<()> {
        self.client.set_password(user_id, new_password)
    }

    /// Provider web root, without the API path suffix
    fn provider_root(&self) -> String {
        self.config
            .provider
            .api_url
            .trim_end_matches('/')
            .trim_end_matches("/api/v3")
            .to_string()
    }
}
