// Key-value storage abstraction.
//
// The SDK persists small pieces of client state (tokens, drop drafts,
// OAuth continuation flags) through this seam. Hosts plug in whatever
// durable store they have (browser storage bridges, a config file, a
// keychain); tests use `MemoryStore`.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;

/// A durable string key-value store.
///
/// Implementations may fail or be entirely unavailable (e.g. private
/// browsing). Callers that must not propagate storage failures wrap the
/// store in [`TieredStore`], which degrades instead of erroring.
#[async_trait]
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    /// Get a value by key. `None` if the key doesn't exist.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Set a key-value pair.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Errors from key-value storage operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage operation failed: {0}")]
    OperationFailed(String),
}

/// An in-memory store backed by a `HashMap`.
///
/// Used in tests and as the default store for hosts without durable
/// storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

/// A two-tier store with a self-healing fallback.
///
/// Writes go to the primary tier; if the primary fails, the value lands
/// in the fallback tier under a suffixed key. Reads check the primary
/// first, then the fallback, and a fallback hit is promoted back into
/// the primary and removed from the fallback.
///
/// Every operation is infallible from the caller's perspective: tier
/// failures are logged and swallowed, so a host with no working storage
/// at all still gets a functioning (if amnesiac) store.
#[derive(Debug, Clone)]
pub struct TieredStore {
    primary: Arc<dyn KeyValueStore>,
    fallback: Arc<dyn KeyValueStore>,
    fallback_suffix: String,
}

/// Suffix appended to keys stored in the fallback tier.
pub const FALLBACK_SUFFIX: &str = "_fallback";

impl TieredStore {
    pub fn new(primary: Arc<dyn KeyValueStore>, fallback: Arc<dyn KeyValueStore>) -> Self {
        Self {
            primary,
            fallback,
            fallback_suffix: FALLBACK_SUFFIX.to_string(),
        }
    }

    fn fallback_key(&self, key: &str) -> String {
        format!("{}{}", key, self.fallback_suffix)
    }

    /// Read a value, promoting fallback hits back into the primary tier.
    pub async fn get(&self, key: &str) -> Option<String> {
        match self.primary.get(key).await {
            Ok(Some(value)) => return Some(value),
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(key, %err, "primary storage read failed");
            }
        }

        let fallback_key = self.fallback_key(key);
        match self.fallback.get(&fallback_key).await {
            Ok(Some(value)) => {
                // Self-heal: move the value back to where it belongs.
                if self.primary.set(key, &value).await.is_ok() {
                    if let Err(err) = self.fallback.remove(&fallback_key).await {
                        tracing::warn!(key, %err, "failed to clean up fallback entry");
                    }
                }
                Some(value)
            }
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(key, %err, "fallback storage read failed");
                None
            }
        }
    }

    /// Write a value to the primary tier, spilling to the fallback tier
    /// if the primary is unavailable.
    pub async fn set(&self, key: &str, value: &str) {
        match self.primary.set(key, value).await {
            Ok(()) => {}
            Err(err) => {
                tracing::warn!(key, %err, "primary storage write failed, using fallback");
                if let Err(err) = self.fallback.set(&self.fallback_key(key), value).await {
                    tracing::warn!(key, %err, "fallback storage write failed, value dropped");
                }
            }
        }
    }

    /// Remove a key from both tiers.
    pub async fn remove(&self, key: &str) {
        if let Err(err) = self.primary.remove(key).await {
            tracing::warn!(key, %err, "primary storage remove failed");
        }
        if let Err(err) = self.fallback.remove(&self.fallback_key(key)).await {
            tracing::warn!(key, %err, "fallback storage remove failed");
        }
    }
}
