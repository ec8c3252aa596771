//! Persistence for session state and device identity.
//!
//! - [`SessionStorage`] trait: independent get/set/remove by key
//! - [`MemoryStorage`]: process-local map, for tests and ephemeral sessions
//! - [`FileStorage`]: one file per key under a data directory

mod file;
mod memory;

use async_trait::async_trait;

use crate::error::ClientResult;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Key/value persistence used by the session manager.
///
/// Keys are read and written independently; implementations give no
/// transactional guarantee across keys.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Read a value. Returns `Ok(None)` if the key is absent.
    async fn get(&self, key: &str) -> ClientResult<Option<String>>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> ClientResult<()>;

    /// Delete a value. Returns `Ok(())` even if the key is absent.
    async fn remove(&self, key: &str) -> ClientResult<()>;
}
