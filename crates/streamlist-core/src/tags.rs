// ── Tag catalog cache ──
//
// Process-wide snapshot of the two tag catalogs. Readers never block; the
// first fetch of a catalog may run more than once under concurrency and the
// last completed write wins. Fresh catalogs are written through to the
// local store, which also serves as the fallback when fetching fails.
// Population always requests a fixed number of tags, so the cached content
// does not depend on which session came first.

use std::future::Future;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tracing::{debug, warn};

use crate::cursor::CursorState;
use crate::engine::PagingEngine;
use crate::model::{Item, Page, Tag, TagCatalog};
use crate::store::LocalStore;

pub const DEFAULT_MAX_TAG_PAGES: u32 = 10;

/// Tags requested per call when populating a catalog.
pub const DEFAULT_TAG_CATALOG_LIMIT: u32 = 500;

/// Result of one attempt to populate a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    /// The whole catalog. Cached and persisted.
    Complete(Vec<Tag>),
    /// Collection stopped early. Served once, never cached or persisted.
    Partial(Vec<Tag>),
    Failed,
}

#[derive(Default)]
pub struct TagCache {
    category: ArcSwapOption<Vec<Tag>>,
    stream: ArcSwapOption<Vec<Tag>>,
    store: Option<Arc<dyn LocalStore>>,
}

impl TagCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: Arc<dyn LocalStore>) -> Self {
        Self {
            store: Some(store),
            ..Self::default()
        }
    }

    fn slot(&self, catalog: TagCatalog) -> &ArcSwapOption<Vec<Tag>> {
        match catalog {
            TagCatalog::Category => &self.category,
            TagCatalog::Stream => &self.stream,
        }
    }

    pub fn cached(&self, catalog: TagCatalog) -> Option<Arc<Vec<Tag>>> {
        self.slot(catalog).load_full()
    }

    /// Cached catalog, else the result of `fetch`, else the stored copy.
    ///
    /// A stored fallback or a partial fetch is returned but not cached, so
    /// the next call fetches again.
    pub async fn get_or_fetch<F, Fut>(&self, catalog: TagCatalog, fetch: F) -> Option<Arc<Vec<Tag>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Fetched>,
    {
        if let Some(tags) = self.cached(catalog) {
            debug!(%catalog, tags = tags.len(), "tag catalog served from cache");
            return Some(tags);
        }

        match fetch().await {
            Fetched::Complete(fresh) => {
                let tags = Arc::new(fresh);
                self.slot(catalog).store(Some(Arc::clone(&tags)));
                if let Some(store) = &self.store {
                    if let Err(err) = store.save_tag_catalog(catalog, &tags).await {
                        warn!(%catalog, error = %err, "failed to persist tag catalog");
                    }
                }
                return Some(tags);
            }
            Fetched::Partial(partial) => return Some(Arc::new(partial)),
            Fetched::Failed => {}
        }

        let store = self.store.as_ref()?;
        match store.tag_catalog(catalog).await {
            Ok(Some(stored)) => {
                debug!(%catalog, tags = stored.len(), "tag catalog served from store");
                Some(Arc::new(stored))
            }
            Ok(None) => None,
            Err(err) => {
                warn!(%catalog, error = %err, "stored tag catalog unavailable");
                None
            }
        }
    }
}

/// How a catalog is paged through when it is populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TagCollection {
    /// Tags requested per call.
    pub(crate) limit: u32,
    pub(crate) max_pages: u32,
}

/// Unfiltered tag listing: the whole catalog as one terminal page.
pub(crate) struct CachedTagSource {
    catalog: TagCatalog,
    cache: Arc<TagCache>,
    engine: PagingEngine,
    collection: TagCollection,
    served: bool,
}

impl CachedTagSource {
    pub(crate) fn new(
        catalog: TagCatalog,
        cache: Arc<TagCache>,
        engine: PagingEngine,
        collection: TagCollection,
    ) -> Self {
        Self {
            catalog,
            cache,
            engine,
            collection: TagCollection {
                limit: collection.limit.max(1),
                max_pages: collection.max_pages.max(1),
            },
            served: false,
        }
    }

    pub(crate) fn engine(&self) -> &PagingEngine {
        &self.engine
    }

    pub(crate) fn refresh(&mut self) {
        self.engine.refresh();
        self.served = false;
    }

    /// The caller's page size is ignored: the catalog is collected with
    /// the configured limit and served whole.
    pub(crate) async fn try_load_page(&mut self, _page_size: u32) -> Option<Page> {
        if self.served {
            return Some(Page::terminal());
        }
        let cancel = self.engine.cancel_token();
        let Self {
            catalog,
            cache,
            engine,
            collection,
            ..
        } = &mut *self;
        let tags = tokio::select! {
            biased;
            () = cancel.cancelled() => return None,
            tags = cache.get_or_fetch(*catalog, || collect(engine, *collection)) => tags,
        };
        self.served = true;
        Some(Page {
            items: tags
                .map(|tags| tags.iter().cloned().map(Item::Tag).collect())
                .unwrap_or_default(),
            next_key: None,
            is_terminal: true,
        })
    }
}

/// Page through the whole catalog, at most `collection.max_pages` pages.
async fn collect(engine: &mut PagingEngine, collection: TagCollection) -> Fetched {
    engine.refresh();
    let mut tags = Vec::new();
    for _ in 0..collection.max_pages {
        let Some(page) = engine.try_load_page(collection.limit).await else {
            return Fetched::Failed;
        };
        if matches!(engine.cursor(), CursorState::Exhausted) {
            return Fetched::Failed;
        }
        tags.extend(page.items.into_iter().filter_map(|item| match item {
            Item::Tag(tag) => Some(tag),
            _ => None,
        }));
        if page.is_terminal {
            return Fetched::Complete(tags);
        }
    }
    warn!(
        kind = %engine.kind(),
        pages = collection.max_pages,
        tags = tags.len(),
        "tag catalog truncated at page limit, not caching"
    );
    Fetched::Partial(tags)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{ListingFilter, ListingKind};
    use crate::plan::{AuthState, PlanEntry, ProviderPlan};
    use crate::provider::{Backend, ProviderPage};
    use crate::store::MemoryStore;
    use crate::testing::FakeProvider;

    fn tags(names: &[&str]) -> Vec<Tag> {
        names.iter().map(|n| Tag::new(*n, *n)).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_first_fetches_both_run_then_cache_serves() {
        const ONE: &[&str] = &["a"];
        const TWO: &[&str] = &["a", "b"];
        const THREE: &[&str] = &["c"];

        let cache = TagCache::new();
        let fetches = AtomicUsize::new(0);
        let fetch = |names: &'static [&'static str], delay_ms: u64| {
            let fetches = &fetches;
            move || async move {
                fetches.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Fetched::Complete(tags(names))
            }
        };

        let (first, second) = tokio::join!(
            cache.get_or_fetch(TagCatalog::Stream, fetch(ONE, 10)),
            cache.get_or_fetch(TagCatalog::Stream, fetch(TWO, 20)),
        );
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
        assert!(first.is_some() && second.is_some());

        let third = cache
            .get_or_fetch(TagCatalog::Stream, fetch(THREE, 0))
            .await
            .unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
        assert_eq!(third.len(), 2);
        assert!(cache.cached(TagCatalog::Category).is_none());
    }

    #[tokio::test]
    async fn failed_fetch_falls_back_to_store_without_caching() {
        let store = Arc::new(MemoryStore::new());
        store
            .save_tag_catalog(TagCatalog::Category, &tags(&["rpg"]))
            .await
            .unwrap();
        let cache = TagCache::with_store(store);

        let served = cache
            .get_or_fetch(TagCatalog::Category, || async { Fetched::Failed })
            .await
            .unwrap();
        assert_eq!(served.as_slice(), tags(&["rpg"]).as_slice());
        assert!(cache.cached(TagCatalog::Category).is_none());
    }

    #[tokio::test]
    async fn fresh_catalog_is_written_through() {
        let store = Arc::new(MemoryStore::new());
        let cache = TagCache::with_store(store.clone());

        cache
            .get_or_fetch(TagCatalog::Stream, || async { Fetched::Complete(tags(&["x"])) })
            .await;

        let stored = store.tag_catalog(TagCatalog::Stream).await.unwrap();
        assert_eq!(stored, Some(tags(&["x"])));
    }

    fn tag_page(names: &[&str], token: Option<&str>, more: bool) -> ProviderPage {
        ProviderPage::flagged(
            tags(names).into_iter().map(Item::Tag).collect(),
            token.map(str::to_owned),
            more,
        )
    }

    const COLLECTION: TagCollection = TagCollection {
        limit: DEFAULT_TAG_CATALOG_LIMIT,
        max_pages: DEFAULT_MAX_TAG_PAGES,
    };

    fn tag_source(
        provider: Arc<FakeProvider>,
        cache: Arc<TagCache>,
        collection: TagCollection,
    ) -> CachedTagSource {
        let plan = ProviderPlan::new(vec![PlanEntry::new(provider)]).unwrap();
        let engine = PagingEngine::new(
            ListingKind::StreamTags,
            ListingFilter::new(),
            plan,
            AuthState::default(),
        );
        CachedTagSource::new(TagCatalog::Stream, cache, engine, collection)
    }

    #[tokio::test]
    async fn cached_source_collects_every_page_once() {
        let provider = Arc::new(
            FakeProvider::new(Backend::Graph)
                .respond(tag_page(&["a", "b"], Some("p2"), true))
                .respond(tag_page(&["c"], None, false)),
        );
        let cache = Arc::new(TagCache::new());
        let mut source = tag_source(provider.clone(), cache.clone(), COLLECTION);

        let page = source.try_load_page(50).await.unwrap();
        assert_eq!(page.items.len(), 3);
        assert!(page.is_terminal);
        assert_eq!(source.try_load_page(50).await.unwrap(), Page::terminal());

        let mut another = tag_source(provider.clone(), cache, COLLECTION);
        assert_eq!(another.try_load_page(50).await.unwrap().items.len(), 3);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn failed_collection_is_not_cached() {
        let provider = Arc::new(
            FakeProvider::new(Backend::Graph)
                .respond(tag_page(&["a"], Some("p2"), true))
                .fail(),
        );
        let cache = Arc::new(TagCache::new());
        let mut source = tag_source(provider, cache.clone(), COLLECTION);

        let page = source.try_load_page(50).await.unwrap();
        assert_eq!(page, Page::terminal());
        assert!(cache.cached(TagCatalog::Stream).is_none());
    }

    #[tokio::test]
    async fn population_ignores_the_callers_page_size() {
        let names: Vec<String> = (0..8).map(|i| format!("t{i}")).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let provider = Arc::new(
            FakeProvider::new(Backend::Graph).respond(ProviderPage::single(
                tags(&names).into_iter().map(Item::Tag).collect(),
            )),
        );
        let cache = Arc::new(TagCache::new());

        let mut small = tag_source(provider.clone(), cache.clone(), COLLECTION);
        assert_eq!(small.try_load_page(5).await.unwrap().items.len(), 8);

        let mut large = tag_source(provider.clone(), cache, COLLECTION);
        let page = large.try_load_page(200).await.unwrap();
        assert_eq!(page.items.len(), 8);
        assert!(page.is_terminal);
        assert_eq!(provider.page_sizes(), vec![DEFAULT_TAG_CATALOG_LIMIT]);
    }

    #[tokio::test]
    async fn truncated_collection_is_served_but_not_cached() {
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(
            FakeProvider::new(Backend::Graph)
                .respond(tag_page(&["a"], Some("p2"), true))
                .respond(tag_page(&["b"], Some("p3"), true)),
        );
        let cache = Arc::new(TagCache::with_store(store.clone()));
        let collection = TagCollection {
            limit: 10,
            max_pages: 2,
        };
        let mut source = tag_source(provider.clone(), cache.clone(), collection);

        let page = source.try_load_page(50).await.unwrap();

        assert_eq!(page.items.len(), 2);
        assert!(page.is_terminal);
        assert_eq!(provider.calls(), 2);
        assert!(cache.cached(TagCatalog::Stream).is_none());
        assert_eq!(store.tag_catalog(TagCatalog::Stream).await.unwrap(), None);
    }
}
