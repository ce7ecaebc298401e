// ── Local persistence boundary ──
//
// The catalog never owns an on-device schema. Embedders implement
// `LocalStore` over whatever they persist with; `MemoryStore` covers tests
// and hosts without persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::model::{ChannelRef, Tag, TagCatalog};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("stored data is corrupt: {message}")]
    Corrupt { message: String },
}

/// A channel followed locally, without an account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalFollow {
    pub channel_id: Option<String>,
    pub login: Option<String>,
    pub display_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub followed_at: Option<DateTime<Utc>>,
}

impl LocalFollow {
    pub fn new(channel_id: impl Into<String>, login: impl Into<String>) -> Self {
        Self {
            channel_id: Some(channel_id.into()),
            login: Some(login.into()),
            ..Self::default()
        }
    }

    pub fn channel_ref(&self) -> ChannelRef {
        ChannelRef {
            id: self.channel_id.clone(),
            login: self.login.clone(),
            display_name: self.display_name.clone(),
            profile_image_url: self.profile_image_url.clone(),
        }
    }

    pub fn merge_key(&self) -> Option<String> {
        self.channel_ref().merge_key()
    }
}

/// Read side of the embedder's persistence, plus the tag catalog snapshot.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Channels the user follows locally.
    async fn followed_channels(&self) -> Result<Vec<LocalFollow>, StoreError>;

    /// Last persisted copy of a tag catalog, if any.
    async fn tag_catalog(&self, _catalog: TagCatalog) -> Result<Option<Vec<Tag>>, StoreError> {
        Ok(None)
    }

    /// Persist a freshly fetched tag catalog.
    async fn save_tag_catalog(&self, _catalog: TagCatalog, _tags: &[Tag]) -> Result<(), StoreError> {
        Ok(())
    }
}

// ── In-memory implementation ─────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryStore {
    follows: RwLock<Vec<LocalFollow>>,
    tags: DashMap<TagCatalog, Vec<Tag>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_follows(follows: Vec<LocalFollow>) -> Self {
        Self {
            follows: RwLock::new(follows),
            tags: DashMap::new(),
        }
    }

    pub async fn set_follows(&self, follows: Vec<LocalFollow>) {
        *self.follows.write().await = follows;
    }

    /// Add a follow, replacing any entry with the same merge key.
    pub async fn follow(&self, follow: LocalFollow) {
        let key = follow.merge_key();
        let mut follows = self.follows.write().await;
        follows.retain(|f| key.is_none() || f.merge_key() != key);
        follows.push(follow);
    }

    pub async fn unfollow(&self, merge_key: &str) {
        self.follows
            .write()
            .await
            .retain(|f| f.merge_key().as_deref() != Some(merge_key));
    }
}

#[async_trait]
impl LocalStore for MemoryStore {
    async fn followed_channels(&self) -> Result<Vec<LocalFollow>, StoreError> {
        Ok(self.follows.read().await.clone())
    }

    async fn tag_catalog(&self, catalog: TagCatalog) -> Result<Option<Vec<Tag>>, StoreError> {
        Ok(self.tags.get(&catalog).map(|t| t.value().clone()))
    }

    async fn save_tag_catalog(&self, catalog: TagCatalog, tags: &[Tag]) -> Result<(), StoreError> {
        self.tags.insert(catalog, tags.to_vec());
        Ok(())
    }
}
