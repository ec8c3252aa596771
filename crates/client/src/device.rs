//! Loads or creates the per-install [`DeviceIdentity`].

use std::sync::Arc;

use tokio::sync::OnceCell;

use chefbot_core::device::DeviceIdentity;
use chefbot_core::storage_keys;

use crate::error::ClientResult;
use crate::storage::SessionStorage;

/// Lazily resolved device identity.
///
/// The first call to [`identity`](Self::identity) reads the persisted
/// identity, generating and persisting one if none exists. Later calls
/// return the cached value without touching storage.
pub struct DeviceRegistry<S: SessionStorage> {
    storage: Arc<S>,
    platform: String,
    cached: OnceCell<DeviceIdentity>,
}

impl<S: SessionStorage> DeviceRegistry<S> {
    pub fn new(storage: Arc<S>, platform: impl Into<String>) -> Self {
        Self {
            storage,
            platform: platform.into(),
            cached: OnceCell::new(),
        }
    }

    /// The identity of this install.
    pub async fn identity(&self) -> ClientResult<&DeviceIdentity> {
        self.cached.get_or_try_init(|| self.load_or_create()).await
    }

    async fn load_or_create(&self) -> ClientResult<DeviceIdentity> {
        if let Some(raw) = self.storage.get(storage_keys::DEVICE_ID).await? {
            match serde_json::from_str::<DeviceIdentity>(&raw) {
                Ok(identity) if identity.is_well_formed() => {
                    tracing::debug!(device_id = %identity.device_id, "Loaded device identity");
                    return Ok(identity);
                }
                Ok(_) | Err(_) => {
                    tracing::warn!("Stored device identity is corrupt, generating a new one");
                }
            }
        }

        let identity = DeviceIdentity::generate(&self.platform);
        self.storage
            .set(storage_keys::DEVICE_ID, &serde_json::to_string(&identity)?)
            .await?;
        tracing::info!(
            device_id = %identity.device_id,
            platform = %identity.platform,
            "Generated device identity",
        );
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[tokio::test]
    async fn identity_is_generated_once_and_persisted() {
        let storage = Arc::new(MemoryStorage::new());
        let registry = DeviceRegistry::new(storage.clone(), "android");

        let first = registry.identity().await.unwrap().clone();
        let second = registry.identity().await.unwrap().clone();
        assert_eq!(first, second);
        assert!(first.device_id.starts_with("android_"));

        let raw = storage.get(storage_keys::DEVICE_ID).await.unwrap().unwrap();
        let stored: DeviceIdentity = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored, first);
    }

    #[tokio::test]
    async fn identity_is_stable_across_registries() {
        let storage = Arc::new(MemoryStorage::new());
        let a = DeviceRegistry::new(storage.clone(), "ios")
            .identity()
            .await
            .unwrap()
            .clone();
        let b = DeviceRegistry::new(storage, "android")
            .identity()
            .await
            .unwrap()
            .clone();
        assert_eq!(a, b);
        assert_eq!(b.platform, "ios");
    }

    #[tokio::test]
    async fn corrupt_identity_is_replaced() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(storage_keys::DEVICE_ID, "not json").await.unwrap();

        let identity = DeviceRegistry::new(storage.clone(), "linux")
            .identity()
            .await
            .unwrap()
            .clone();
        assert!(identity.device_id.starts_with("linux_"));

        let raw = storage.get(storage_keys::DEVICE_ID).await.unwrap().unwrap();
        assert!(raw.contains(&identity.device_id));
    }
}
