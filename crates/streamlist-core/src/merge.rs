// ── Followed-listing merge ──
//
// Followed streams and channels combine the remote account listing with
// channels followed locally. Local follows get their live status from a
// status resolver, local entries win over remote ones for the same channel
// and the first page is ordered by popularity. Later pages are remote only.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::engine::PagingEngine;
use crate::enrich::{DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE};
use crate::model::{Channel, ChannelRef, Item, ListingKind, LiveStatus, Page, Stream};
use crate::provider::ProviderFailure;
use crate::store::{LocalFollow, LocalStore};

/// Live status by channel id and by lowercased login.
pub type StatusMap = HashMap<String, LiveStatus>;

pub(crate) fn insert_status(map: &mut StatusMap, channel: &ChannelRef, status: LiveStatus) {
    if let Some(login) = &channel.login {
        map.insert(login.to_lowercase(), status.clone());
    }
    if let Some(id) = &channel.id {
        map.insert(id.clone(), status);
    }
}

fn lookup<'a>(map: &'a StatusMap, follow: &LocalFollow) -> Option<&'a LiveStatus> {
    follow
        .channel_id
        .as_ref()
        .and_then(|id| map.get(id))
        .or_else(|| {
            follow
                .login
                .as_ref()
                .and_then(|login| map.get(&login.to_lowercase()))
        })
}

/// Resolves the current live status of locally followed channels.
#[async_trait]
pub trait StatusResolver: Send + Sync {
    fn source_name(&self) -> &'static str;

    fn is_available(&self) -> bool {
        true
    }

    /// Status for the live channels among `follows`. Offline channels are absent.
    async fn resolve(&self, follows: &[LocalFollow]) -> Result<StatusMap, ProviderFailure>;
}

pub struct MergeSource {
    engine: PagingEngine,
    store: Arc<dyn LocalStore>,
    resolvers: Vec<Arc<dyn StatusResolver>>,
    batch_size: usize,
    merged: bool,
}

impl MergeSource {
    pub fn new(
        engine: PagingEngine,
        store: Arc<dyn LocalStore>,
        resolvers: Vec<Arc<dyn StatusResolver>>,
    ) -> Self {
        Self {
            engine,
            store,
            resolvers,
            batch_size: DEFAULT_BATCH_SIZE,
            merged: false,
        }
    }

    /// Follows per resolver call, clamped to `1..=MAX_BATCH_SIZE`.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_BATCH_SIZE);
        self
    }

    pub fn engine(&self) -> &PagingEngine {
        &self.engine
    }

    pub fn refresh(&mut self) {
        self.engine.refresh();
        self.merged = false;
    }

    pub async fn load_page(&mut self, page_size: u32) -> Page {
        self.try_load_page(page_size)
            .await
            .unwrap_or_else(Page::abandoned)
    }

    pub(crate) async fn try_load_page(&mut self, page_size: u32) -> Option<Page> {
        if self.merged {
            return self.engine.try_load_page(page_size).await;
        }

        let cancel = self.engine.cancel_token();
        let local = tokio::select! {
            biased;
            () = cancel.cancelled() => return None,
            local = self.local_items() => local,
        };
        let remote = self.engine.try_load_page(page_size).await?;
        self.merged = true;
        Some(merge(local, remote))
    }

    async fn local_items(&self) -> Vec<Item> {
        let kind = self.engine.kind();
        let follows = match self.store.followed_channels().await {
            Ok(follows) => follows,
            Err(err) => {
                warn!(%kind, error = %err, "local follows unavailable");
                return Vec::new();
            }
        };
        if follows.is_empty() {
            return Vec::new();
        }
        let statuses = self.resolve_statuses(&follows).await;
        debug!(%kind, follows = follows.len(), live = statuses.len(), "resolved local follows");
        local_entries(kind, &follows, &statuses)
    }

    /// First resolver whose every chunk succeeds wins. All failing means offline.
    async fn resolve_statuses(&self, follows: &[LocalFollow]) -> StatusMap {
        for resolver in self.resolvers.iter().filter(|r| r.is_available()) {
            let results = join_all(
                follows
                    .chunks(self.batch_size)
                    .map(|chunk| resolver.resolve(chunk)),
            )
            .await;
            match results.into_iter().collect::<Result<Vec<_>, _>>() {
                Ok(maps) => return maps.into_iter().flatten().collect(),
                Err(err) => {
                    warn!(resolver = resolver.source_name(), error = %err, "status resolver failed");
                }
            }
        }
        warn!("no status resolver succeeded, treating local follows as offline");
        StatusMap::new()
    }
}

fn local_entries(kind: ListingKind, follows: &[LocalFollow], statuses: &StatusMap) -> Vec<Item> {
    follows
        .iter()
        .filter_map(|follow| {
            let status = lookup(statuses, follow);
            match kind {
                ListingKind::FollowedStreams => status.map(|live| {
                    Item::Stream(Stream {
                        id: live.stream_id.clone(),
                        channel: follow.channel_ref(),
                        title: live.title.clone(),
                        game: live.game.clone(),
                        viewer_count: live.viewer_count,
                        started_at: live.started_at,
                        thumbnail_url: live.thumbnail_url.clone(),
                        ..Stream::default()
                    })
                }),
                _ => Some(Item::Channel(Channel {
                    channel: follow.channel_ref(),
                    live: status.cloned(),
                    followed_at: follow.followed_at,
                    ..Channel::default()
                })),
            }
        })
        .collect()
}

fn channel_keys(channel: &ChannelRef) -> impl Iterator<Item = String> + '_ {
    channel
        .id
        .iter()
        .cloned()
        .chain(channel.login.iter().map(|l| l.to_lowercase()))
}

/// Local entries first, remote duplicates dropped, then stable popularity order.
fn merge(local: Vec<Item>, remote: Page) -> Page {
    let local_keys: HashSet<String> = local
        .iter()
        .filter_map(Item::channel)
        .flat_map(channel_keys)
        .collect();

    let mut items = local;
    for item in remote.items {
        let duplicate = item
            .channel()
            .is_some_and(|c| channel_keys(c).any(|k| local_keys.contains(&k)));
        if !duplicate {
            items.push(item);
        }
    }
    items.sort_by(|a, b| b.popularity().cmp(&a.popularity()));

    Page {
        items,
        next_key: remote.next_key,
        is_terminal: remote.is_terminal,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::ListingFilter;
    use crate::plan::{AuthState, PlanEntry, ProviderPlan};
    use crate::provider::{Backend, ProviderPage};
    use crate::store::MemoryStore;
    use crate::testing::{FakeProvider, item_ids, stream};

    struct FixedResolver {
        statuses: Option<StatusMap>,
        calls: AtomicUsize,
    }

    impl FixedResolver {
        fn live(entries: &[(&str, u64)]) -> Self {
            let mut statuses = StatusMap::new();
            for (id, viewers) in entries {
                statuses.insert(
                    (*id).to_owned(),
                    LiveStatus {
                        stream_id: Some(format!("live_{id}")),
                        viewer_count: *viewers,
                        ..LiveStatus::default()
                    },
                );
            }
            Self {
                statuses: Some(statuses),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                statuses: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl StatusResolver for FixedResolver {
        fn source_name(&self) -> &'static str {
            "fixed"
        }

        async fn resolve(&self, follows: &[LocalFollow]) -> Result<StatusMap, ProviderFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let statuses = self
                .statuses
                .as_ref()
                .ok_or_else(|| ProviderFailure::new(Backend::Rest, "down"))?;
            Ok(follows
                .iter()
                .filter_map(|f| {
                    let id = f.channel_id.clone()?;
                    statuses.get(&id).map(|s| (id, s.clone()))
                })
                .collect())
        }
    }

    fn source(
        kind: ListingKind,
        remote: ProviderPage,
        follows: Vec<LocalFollow>,
        resolvers: Vec<Arc<dyn StatusResolver>>,
    ) -> (MergeSource, Arc<FakeProvider>) {
        let provider = Arc::new(FakeProvider::new(Backend::Graph).respond(remote));
        let plan = ProviderPlan::new(vec![PlanEntry::new(provider.clone())]).unwrap();
        let engine = PagingEngine::new(kind, ListingFilter::new(), plan, AuthState::default());
        let store = Arc::new(MemoryStore::with_follows(follows));
        (MergeSource::new(engine, store, resolvers), provider)
    }

    #[tokio::test]
    async fn local_live_entry_replaces_remote_duplicate() {
        let remote = ProviderPage::flagged(
            vec![stream("stale", "u1", 10), stream("s2", "u2", 100)],
            None,
            false,
        );
        let resolver: Arc<dyn StatusResolver> = Arc::new(FixedResolver::live(&[("u1", 500)]));
        let (mut merged, _) = source(
            ListingKind::FollowedStreams,
            remote,
            vec![LocalFollow::new("u1", "one"), LocalFollow::new("u3", "three")],
            vec![resolver],
        );

        let page = merged.load_page(20).await;

        assert_eq!(item_ids(&page.items), vec!["live_u1", "s2"]);
        assert_eq!(page.items[0].popularity(), Some(500));
        assert!(page.is_terminal);
    }

    #[tokio::test]
    async fn resolver_failure_falls_back_to_next() {
        let first = Arc::new(FixedResolver::failing());
        let second = Arc::new(FixedResolver::live(&[("u1", 7)]));
        let (mut merged, _) = source(
            ListingKind::FollowedStreams,
            ProviderPage::flagged(Vec::new(), None, false),
            vec![LocalFollow::new("u1", "one")],
            vec![
                Arc::clone(&first) as Arc<dyn StatusResolver>,
                Arc::clone(&second) as Arc<dyn StatusResolver>,
            ],
        );

        let page = merged.load_page(20).await;

        assert_eq!(item_ids(&page.items), vec!["live_u1"]);
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn resolution_is_chunked_by_batch_size() {
        let resolver = Arc::new(FixedResolver::live(&[]));
        let follows = (0..5)
            .map(|i| LocalFollow::new(format!("u{i}"), format!("l{i}")))
            .collect();
        let (merged, _) = source(
            ListingKind::FollowedChannels,
            ProviderPage::flagged(Vec::new(), None, false),
            follows,
            vec![Arc::clone(&resolver) as Arc<dyn StatusResolver>],
        );
        let mut merged = merged.with_batch_size(2);

        merged.load_page(20).await;
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn oversized_batch_is_clamped_to_lookup_limit() {
        let live: Vec<(String, u64)> = (0..150).map(|i| (format!("u{i}"), 1)).collect();
        let live: Vec<(&str, u64)> = live.iter().map(|(id, v)| (id.as_str(), *v)).collect();
        let resolver = Arc::new(FixedResolver::live(&live));
        let follows = (0..150)
            .map(|i| LocalFollow::new(format!("u{i}"), format!("l{i}")))
            .collect();
        let (merged, _) = source(
            ListingKind::FollowedStreams,
            ProviderPage::flagged(Vec::new(), None, false),
            follows,
            vec![Arc::clone(&resolver) as Arc<dyn StatusResolver>],
        );
        let mut merged = merged.with_batch_size(150);

        let page = merged.load_page(20).await;
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
        assert_eq!(page.items.len(), 150);
    }

    #[tokio::test]
    async fn followed_channels_keep_offline_follows_last() {
        let resolver: Arc<dyn StatusResolver> = Arc::new(FixedResolver::failing());
        let (mut merged, _) = source(
            ListingKind::FollowedChannels,
            ProviderPage::flagged(vec![stream("s9", "u9", 3)], None, false),
            vec![LocalFollow::new("u1", "one")],
            vec![resolver],
        );

        let page = merged.load_page(20).await;

        assert_eq!(page.items.len(), 2);
        assert_eq!(item_ids(&page.items), vec!["s9", "u1"]);
        let Item::Channel(channel) = &page.items[1] else {
            panic!("expected a channel entry");
        };
        assert_eq!(channel.live, None);
    }

    #[tokio::test]
    async fn later_pages_skip_the_merge() {
        let provider = Arc::new(
            FakeProvider::new(Backend::Rest)
                .respond(ProviderPage::trailing(
                    vec![stream("s1", "u2", 1)],
                    Some("next".into()),
                ))
                .respond(ProviderPage::trailing(vec![stream("s2", "u1", 1)], None)),
        );
        let plan = ProviderPlan::new(vec![PlanEntry::new(provider.clone())]).unwrap();
        let engine = PagingEngine::new(
            ListingKind::FollowedStreams,
            ListingFilter::new(),
            plan,
            AuthState::default(),
        );
        let resolver: Arc<dyn StatusResolver> = Arc::new(FixedResolver::live(&[("u1", 50)]));
        let store = Arc::new(MemoryStore::with_follows(vec![LocalFollow::new("u1", "one")]));
        let mut merged = MergeSource::new(engine, store, vec![resolver]);

        let first = merged.load_page(10).await;
        let second = merged.load_page(10).await;

        assert_eq!(item_ids(&first.items), vec!["live_u1", "s1"]);
        assert_eq!(item_ids(&second.items), vec!["s2"]);
    }

    #[test]
    fn keyless_remote_items_are_kept() {
        let remote = Page {
            items: vec![Item::Stream(Stream::default())],
            next_key: None,
            is_terminal: true,
        };
        let merged = merge(vec![stream("a", "u1", 1)], remote);
        assert_eq!(merged.items.len(), 2);
    }

    #[test]
    fn equal_popularity_keeps_local_then_remote_arrival_order() {
        let local = vec![stream("l1", "u1", 5), stream("l2", "u2", 5)];
        let remote = Page {
            items: vec![
                stream("r1", "u3", 5),
                stream("r2", "u4", 9),
                stream("r3", "u5", 5),
            ],
            next_key: None,
            is_terminal: true,
        };

        let merged = merge(local, remote);

        assert_eq!(item_ids(&merged.items), vec!["r2", "l1", "l2", "r1", "r3"]);
    }
}
