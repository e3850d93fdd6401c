//! ssoadm - Admin tooling for an SSO identity provider
//!
//! This library creates and manages provider accounts, issues recovery
//! links and invitations, and keeps a locally cached, encrypted mirror of
//! the user directory so new usernames never collide with existing ones.

pub mod admin;
pub mod config;
pub mod crypto;
pub mod directory;
pub mod error;
pub mod provider;
pub mod shortener;
pub mod username;

pub use config::Config;
pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::admin::{AdminService, CreateUserRequest};
    pub use crate::config::Config;
    pub use crate::crypto::CacheKey;
    pub use crate::directory::{DirectorySnapshot, SnapshotStore, UserRecord};
    pub use crate::error::{Error, Result};
    pub use crate::provider::DirectoryClient;
}
