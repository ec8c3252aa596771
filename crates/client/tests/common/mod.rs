//! Shared fixtures for the client integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chefbot_client::storage::{MemoryStorage, SessionStorage};
use chefbot_client::{ChefBotClient, ClientConfig};
use chefbot_core::storage_keys;
use chefbot_core::types::Timestamp;
use serde_json::{json, Value};

/// Build a test `ClientConfig` pointing at `base_url`.
///
/// Retries are kept (two of them) but the delay is 10ms and each attempt
/// times out after 300ms so failure paths finish quickly.
pub fn test_config(base_url: &str) -> ClientConfig {
    let mut config = ClientConfig::new(base_url);
    config.retry_delay = Duration::from_millis(10);
    config.request_timeout = Duration::from_millis(300);
    config.platform = "linux".to_string();
    config
}

/// A client backed by fresh in-memory storage. The storage handle is
/// returned so tests can seed and inspect it.
pub fn memory_client(config: ClientConfig) -> (ChefBotClient<MemoryStorage>, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let client = ChefBotClient::with_storage(config, storage.clone());
    (client, storage)
}

/// Write a session directly into storage, bypassing the login flow.
pub async fn seed_session(
    storage: &MemoryStorage,
    token: &str,
    refresh_token: Option<&str>,
    expires_at: Timestamp,
) {
    storage
        .set(storage_keys::ACCESS_TOKEN, token)
        .await
        .unwrap();
    storage
        .set(
            storage_keys::TOKEN_EXPIRY,
            &expires_at.timestamp_millis().to_string(),
        )
        .await
        .unwrap();
    if let Some(refresh_token) = refresh_token {
        storage
            .set(storage_keys::REFRESH_TOKEN, refresh_token)
            .await
            .unwrap();
    }
}

pub fn in_hours(hours: i64) -> Timestamp {
    chrono::Utc::now() + chrono::Duration::hours(hours)
}

/// Body of a successful token-issuing response.
pub fn auth_body(token: &str, refresh_token: Option<&str>) -> Value {
    let mut body = json!({
        "token": token,
        "user": { "id": 7, "email": "a@b.com", "plan": "free" },
    });
    if let Some(refresh_token) = refresh_token {
        body["refresh_token"] = json!(refresh_token);
    }
    body
}

/// Stored session keys, in `SESSION_KEYS` order.
pub async fn stored_session(storage: &MemoryStorage) -> Vec<Option<String>> {
    let mut values = Vec::new();
    for key in storage_keys::SESSION_KEYS {
        values.push(storage.get(key).await.unwrap());
    }
    values
}
