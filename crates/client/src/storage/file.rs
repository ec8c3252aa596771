//! File-backed storage.
//!
//! # Storage Layout
//!
//! ```text
//! <data_dir>/
//!   chef_bot_token
//!   chef_bot_refresh_token
//!   chef_bot_token_expiry
//!   chef_bot_user
//!   chef_bot_device_id
//! ```
//!
//! Writes go to a `.tmp` sibling first and are renamed into place, so a
//! crash mid-write never leaves a truncated value behind.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::SessionStorage;
use crate::error::{ClientError, ClientResult};

/// [`SessionStorage`] persisting one file per key.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open storage in `dir`, creating the directory if needed.
    pub async fn new(dir: impl Into<PathBuf>) -> ClientResult<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            ClientError::Storage(format!(
                "failed to create storage dir {}: {e}",
                dir.display()
            ))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> ClientResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(ClientError::Storage(format!("invalid storage key '{key}'")));
        }
        Ok(self.dir.join(key))
    }
}

#[async_trait]
impl SessionStorage for FileStorage {
    async fn get(&self, key: &str) -> ClientResult<Option<String>> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ClientError::Storage(format!(
                "failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    async fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("tmp");

        write_private(&tmp, value).await.map_err(|e| {
            ClientError::Storage(format!("failed to write {}: {e}", tmp.display()))
        })?;
        tokio::fs::rename(&tmp, &path).await.map_err(|e| {
            ClientError::Storage(format!("failed to replace {}: {e}", path.display()))
        })?;

        tracing::trace!(key, "Persisted storage key");
        Ok(())
    }

    async fn remove(&self, key: &str) -> ClientResult<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::Storage(format!(
                "failed to remove {}: {e}",
                path.display()
            ))),
        }
    }
}

/// Write `value` to a fresh file readable only by the owner (on Unix).
async fn write_private(path: &Path, value: &str) -> std::io::Result<()> {
    use tokio::io::AsyncWriteExt;

    // Permissions apply only at creation, so never reuse a stale temp file.
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e),
        _ => {}
    }

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(value.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn values_persist_across_instances() {
        let tmp = tempfile::tempdir().unwrap();

        let storage = FileStorage::new(tmp.path().join("nested")).await.unwrap();
        storage.set("chef_bot_token", "T1").await.unwrap();
        drop(storage);

        let reopened = FileStorage::new(tmp.path().join("nested")).await.unwrap();
        assert_eq!(
            reopened.get("chef_bot_token").await.unwrap().as_deref(),
            Some("T1")
        );
        assert!(!reopened.dir().join("chef_bot_token.tmp").exists());
    }

    #[tokio::test]
    async fn missing_key_reads_as_none_and_removes_cleanly() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(tmp.path()).await.unwrap();

        assert!(storage.get("chef_bot_user").await.unwrap().is_none());
        storage.remove("chef_bot_user").await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn values_are_private_to_the_owner() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(tmp.path()).await.unwrap();
        storage.set("chef_bot_refresh_token", "R1").await.unwrap();
        storage.set("chef_bot_refresh_token", "R2").await.unwrap();

        let meta = std::fs::metadata(tmp.path().join("chef_bot_refresh_token")).unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o600);
        assert_eq!(
            storage.get("chef_bot_refresh_token").await.unwrap().as_deref(),
            Some("R2")
        );
    }

    #[tokio::test]
    async fn path_traversal_keys_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(tmp.path()).await.unwrap();

        for key in ["", "../escape", "a/b", "a.b"] {
            assert!(
                matches!(storage.set(key, "x").await, Err(ClientError::Storage(_))),
                "{key:?} should be rejected"
            );
        }
    }
}
