//! Encrypted on-disk store for the directory snapshot
//!
//! The whole directory is one encrypted blob at a single configured path.
//! Writes go to a temp file in the same directory and are renamed into
//! place, so readers only ever see a complete prior or complete current
//! snapshot.

use crate::crypto::{decrypt, encrypt, CacheKey};
use crate::directory::{table, DirectorySnapshot};
use crate::error::{Error, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Store for the encrypted directory snapshot
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Create a store backed by the given file path
    ///
    /// The path comes from configuration; nothing is read or written until
    /// `save`/`load` is called.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        SnapshotStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist a snapshot, fully replacing any prior content
    pub fn save(&self, snapshot: &DirectorySnapshot, key: &CacheKey) -> Result<()> {
        let plaintext = table::to_table(snapshot);
        let armored = encrypt(&plaintext, key)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Write-to-temp-then-rename keeps the replacement atomic
        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, armored)?;
        fs::rename(&tmp_path, &self.path)?;

        debug!(
            path = %self.path.display(),
            users = snapshot.len(),
            "Saved directory snapshot"
        );
        Ok(())
    }

    /// Load and decrypt the stored snapshot
    ///
    /// Fails with `SnapshotNotFound` when nothing has been saved yet,
    /// `Decryption` on a wrong key or tampered blob, and `CorruptSnapshot`
    /// when the decrypted text does not parse as a user table.
    pub fn load(&self, key: &CacheKey) -> Result<DirectorySnapshot> {
        let armored = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::SnapshotNotFound(self.path.clone()))
            }
            Err(e) => return Err(e.into()),
        };

        let plaintext = decrypt(&armored, key)?;
        let snapshot = table::from_table(&plaintext)?;

        debug!(
            path = %self.path.display(),
            users = snapshot.len(),
            "Loaded directory snapshot"
        );
        Ok(snapshot)
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "snapshot".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
