//! Cross-navigation scratch storage for drop drafts.
//!
//! Marketing pages capture drop-creation prefills before the user has
//! an account; the draft has to survive the signup dialog's
//! mount/unmount and full page navigations, so it lives in the tiered
//! store rather than memory. Storage failures are logged and swallowed;
//! a host with no working storage still gets in-memory behavior.

use std::collections::HashMap;
use std::sync::Arc;

use g3ms_core::storage::{KeyValueStore, TieredStore};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Storage key for the serialized draft.
pub const DROP_DATA_KEY: &str = "g3ms_drop_creation_data";
/// Storage key for the "user is mid drop-creation funnel" flag.
pub const DROP_FLOW_FLAG_KEY: &str = "g3ms_drop_creation_flow";

/// Loosely-typed drop-creation prefills captured from the homepage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DropFormData {
    pub drop_type: Option<String>,
    pub grade: Option<String>,
    pub subject: Option<String>,
    pub rti_tier: Option<String>,
    pub learning_goal: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl From<DropFormData> for g3ms_client::CreateDropRequest {
    /// Hand the funnel prefills to the create-drop endpoint once the
    /// user is authenticated.
    fn from(data: DropFormData) -> Self {
        Self {
            drop_type: data.drop_type,
            grade: data.grade,
            subject: data.subject,
            rti_tier: data.rti_tier,
            learning_goal: data.learning_goal,
            extra: data.extra,
        }
    }
}

/// Durable scratch store for the in-progress drop draft.
#[derive(Debug)]
pub struct DropDraftStore {
    store: TieredStore,
    current: RwLock<Option<DropFormData>>,
}

impl DropDraftStore {
    /// Build over a primary and fallback store tier.
    pub fn new(primary: Arc<dyn KeyValueStore>, fallback: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store: TieredStore::new(primary, fallback),
            current: RwLock::new(None),
        }
    }

    /// Load the persisted draft into memory, healing a fallback-tier
    /// copy back into the primary. Call once on construction ("provider
    /// mount").
    pub async fn load(&self) -> Option<DropFormData> {
        let data = match self.store.get(DROP_DATA_KEY).await {
            Some(json) => match serde_json::from_str::<DropFormData>(&json) {
                Ok(data) => Some(data),
                Err(err) => {
                    tracing::warn!(%err, "discarding unparseable drop draft");
                    None
                }
            },
            None => None,
        };
        *self.current.write().await = data.clone();
        data
    }

    /// The in-memory draft.
    pub async fn get(&self) -> Option<DropFormData> {
        self.current.read().await.clone()
    }

    /// Replace the draft. `Some` persists it and marks the creation
    /// funnel active; `None` removes the persisted copy.
    pub async fn set(&self, data: Option<DropFormData>) {
        match &data {
            Some(draft) => match serde_json::to_string(draft) {
                Ok(json) => {
                    self.store.set(DROP_DATA_KEY, &json).await;
                    self.store.set(DROP_FLOW_FLAG_KEY, "true").await;
                }
                Err(err) => {
                    tracing::warn!(%err, "failed to serialize drop draft");
                }
            },
            None => self.store.remove(DROP_DATA_KEY).await,
        }
        *self.current.write().await = data;
    }

    /// Whether the drop-creation funnel is active.
    pub async fn is_flow_active(&self) -> bool {
        self.store
            .get(DROP_FLOW_FLAG_KEY)
            .await
            .map(|v| v == "true")
            .unwrap_or(false)
    }

    /// Drop the draft and the funnel flag from every tier and reset the
    /// in-memory state. Called after a drop is created or the funnel is
    /// abandoned.
    pub async fn clear(&self) {
        self.store.remove(DROP_DATA_KEY).await;
        self.store.remove(DROP_FLOW_FLAG_KEY).await;
        *self.current.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use g3ms_core::storage::MemoryStore;

    fn draft() -> DropFormData {
        DropFormData {
            drop_type: Some("quiz".into()),
            grade: Some("5".into()),
            subject: Some("math".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_set_then_load_roundtrip() {
        let primary = Arc::new(MemoryStore::new());
        let fallback = Arc::new(MemoryStore::new());

        let store = DropDraftStore::new(primary.clone(), fallback.clone());
        store.set(Some(draft())).await;
        assert!(store.is_flow_active().await);

        // A fresh store over the same backing tiers sees the draft.
        let remounted = DropDraftStore::new(primary, fallback);
        assert_eq!(remounted.load().await, Some(draft()));
        assert_eq!(remounted.get().await, Some(draft()));
    }

    #[tokio::test]
    async fn test_clear_removes_draft_and_flag() {
        let primary = Arc::new(MemoryStore::new());
        let fallback = Arc::new(MemoryStore::new());
        let store = DropDraftStore::new(primary.clone(), fallback);

        store.set(Some(draft())).await;
        store.clear().await;

        assert_eq!(store.get().await, None);
        assert!(!store.is_flow_active().await);
        assert_eq!(primary.get(DROP_DATA_KEY).await.unwrap(), None);
        assert_eq!(primary.get(DROP_FLOW_FLAG_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_none_removes_persisted_copy() {
        let primary = Arc::new(MemoryStore::new());
        let store = DropDraftStore::new(primary.clone(), Arc::new(MemoryStore::new()));
        store.set(Some(draft())).await;
        store.set(None).await;
        assert_eq!(primary.get(DROP_DATA_KEY).await.unwrap(), None);
        assert_eq!(store.get().await, None);
    }

    #[tokio::test]
    async fn test_unparseable_draft_discarded() {
        let primary = Arc::new(MemoryStore::new());
        primary.set(DROP_DATA_KEY, "not json").await.unwrap();
        let store = DropDraftStore::new(primary, Arc::new(MemoryStore::new()));
        assert_eq!(store.load().await, None);
    }

    #[test]
    fn test_draft_converts_to_create_request() {
        let request: g3ms_client::CreateDropRequest = draft().into();
        assert_eq!(request.drop_type.as_deref(), Some("quiz"));
        assert_eq!(request.grade.as_deref(), Some("5"));
        assert!(request.learning_goal.is_none());
    }

    #[tokio::test]
    async fn test_extra_fields_roundtrip() {
        let mut data = draft();
        data.extra
            .insert("ctaSource".into(), serde_json::json!("homepage-hero"));

        let primary = Arc::new(MemoryStore::new());
        let store = DropDraftStore::new(primary.clone(), Arc::new(MemoryStore::new()));
        store.set(Some(data.clone())).await;

        let remounted = DropDraftStore::new(primary, Arc::new(MemoryStore::new()));
        assert_eq!(remounted.load().await, Some(data));
    }
}
