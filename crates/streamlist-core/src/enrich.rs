// ── Secondary enrichment ──
//
// Some providers return items without profile data. An `Enricher` runs
// after such a page is fetched, batches the missing lookups and merges the
// results back by key. Enrichment never fails a page: a chunk whose lookup
// fails leaves its items as they were.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use indexmap::IndexSet;
use streamlist_api::rest::client::MAX_LOOKUP_IDS;
use tracing::{debug, warn};

use crate::model::{ChannelRef, Item, ListingFilter, ListingKind};
use crate::provider::ProviderFailure;

/// Ids per secondary lookup request.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Largest batch any backend accepts in one lookup.
pub const MAX_BATCH_SIZE: usize = MAX_LOOKUP_IDS;

/// Post-fetch step that fills fields the primary response left out.
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(
        &self,
        items: Vec<Item>,
        kind: ListingKind,
        filter: &ListingFilter,
    ) -> Vec<Item>;
}

/// Bulk profile lookup by channel id.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    /// Whether the source can be called at all (e.g. has its token).
    fn is_available(&self) -> bool {
        true
    }

    /// Profiles for up to one batch of ids. Unknown ids are omitted.
    async fn profiles(&self, ids: &[String]) -> Result<Vec<ChannelRef>, ProviderFailure>;
}

/// Fills profile images, logins and display names from the first available
/// source, falling back to the next source per chunk.
pub struct ProfileEnricher {
    sources: Vec<Arc<dyn ProfileSource>>,
    batch_size: usize,
}

impl ProfileEnricher {
    pub fn new(sources: Vec<Arc<dyn ProfileSource>>) -> Self {
        Self {
            sources,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Ids per lookup, clamped to `1..=MAX_BATCH_SIZE`.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_BATCH_SIZE);
        self
    }

    async fn lookup_chunk(&self, chunk: &[String]) -> Option<Vec<ChannelRef>> {
        for source in self.sources.iter().filter(|s| s.is_available()) {
            match source.profiles(chunk).await {
                Ok(profiles) => return Some(profiles),
                Err(e) => warn!(
                    source = source.source_name(),
                    error = %e,
                    ids = chunk.len(),
                    "profile lookup failed"
                ),
            }
        }
        None
    }
}

fn needs_profile(channel: &ChannelRef) -> bool {
    let blank = |v: &Option<String>| v.as_deref().is_none_or(str::is_empty);
    blank(&channel.profile_image_url) || blank(&channel.login) || blank(&channel.display_name)
}

#[async_trait]
impl Enricher for ProfileEnricher {
    async fn enrich(
        &self,
        mut items: Vec<Item>,
        kind: ListingKind,
        _filter: &ListingFilter,
    ) -> Vec<Item> {
        let keys: IndexSet<String> = items
            .iter()
            .filter_map(Item::channel)
            .filter(|c| needs_profile(c))
            .filter_map(|c| c.id.clone())
            .collect();
        if keys.is_empty() {
            return items;
        }

        let keys: Vec<String> = keys.into_iter().collect();
        let lookups = keys
            .chunks(self.batch_size)
            .map(|chunk| self.lookup_chunk(chunk));
        let profiles: HashMap<String, ChannelRef> = join_all(lookups)
            .await
            .into_iter()
            .flatten()
            .flatten()
            .filter_map(|p| p.id.clone().map(|id| (id, p)))
            .collect();

        debug!(%kind, requested = keys.len(), found = profiles.len(), "enriched profiles");

        for item in &mut items {
            if let Some(channel) = item.channel_mut() {
                if let Some(profile) = channel.id.as_ref().and_then(|id| profiles.get(id)) {
                    channel.fill_from(profile);
                }
            }
        }
        items
    }
}
