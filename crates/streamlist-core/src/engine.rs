// ── Paging engine ──
//
// Drives one listing session: walks the provider plan on the first load,
// binds to the first provider that succeeds, then pages through that
// provider only. A failure after binding ends the listing.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::cursor::CursorState;
use crate::enrich::Enricher;
use crate::model::{Item, ListingFilter, ListingKind, Page};
use crate::plan::{AuthState, EligibilityContext, ProviderPlan};
use crate::provider::{Backend, Provider, ProviderPage};

/// Result of one fetch attempt, applied to the cursor only if not cancelled.
enum Outcome {
    Loaded {
        entry: usize,
        backend: Backend,
        page: ProviderPage,
        items: Vec<Item>,
    },
    Failed,
    Finished,
}

pub struct PagingEngine {
    kind: ListingKind,
    filter: ListingFilter,
    plan: ProviderPlan,
    auth: AuthState,
    enricher: Option<Arc<dyn Enricher>>,
    cursor: CursorState,
    page_index: u32,
    cancel: CancellationToken,
}

impl PagingEngine {
    pub fn new(
        kind: ListingKind,
        filter: ListingFilter,
        plan: ProviderPlan,
        auth: AuthState,
    ) -> Self {
        Self {
            kind,
            filter,
            plan,
            auth,
            enricher: None,
            cursor: CursorState::Unstarted,
            page_index: 0,
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_enricher(mut self, enricher: Arc<dyn Enricher>) -> Self {
        self.enricher = Some(enricher);
        self
    }

    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn kind(&self) -> ListingKind {
        self.kind
    }

    pub fn filter(&self) -> &ListingFilter {
        &self.filter
    }

    pub fn cursor(&self) -> &CursorState {
        &self.cursor
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Forget the binding; the next load starts from the top of the plan.
    pub fn refresh(&mut self) {
        trace!(kind = %self.kind, "refresh");
        self.cursor = CursorState::Unstarted;
        self.page_index = 0;
    }

    /// Load the next page. Returns an empty, non-terminal page when cancelled.
    pub async fn load_page(&mut self, page_size: u32) -> Page {
        self.try_load_page(page_size)
            .await
            .unwrap_or_else(Page::abandoned)
    }

    /// `None` when cancelled; the cursor is then left untouched.
    pub(crate) async fn try_load_page(&mut self, page_size: u32) -> Option<Page> {
        let page_size = page_size.max(1);
        let cancel = self.cancel.clone();
        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            outcome = self.fetch(page_size) => Some(outcome),
        };
        match outcome {
            Some(outcome) => Some(self.commit(outcome)),
            None => {
                debug!(kind = %self.kind, "page load cancelled");
                None
            }
        }
    }

    async fn fetch(&self, page_size: u32) -> Outcome {
        match &self.cursor {
            CursorState::Exhausted => Outcome::Finished,
            CursorState::Bound { entry, backend, .. } => {
                if !self.cursor.has_more() {
                    return Outcome::Finished;
                }
                let Some(plan_entry) = self.plan.get(*entry) else {
                    return Outcome::Failed;
                };
                let provider = Arc::clone(plan_entry.provider());
                match self.attempt(&provider, page_size, self.cursor.token()).await {
                    Some((page, items)) => Outcome::Loaded {
                        entry: *entry,
                        backend: *backend,
                        page,
                        items,
                    },
                    None => Outcome::Failed,
                }
            }
            CursorState::Unstarted => self.first_page(page_size).await,
        }
    }

    async fn first_page(&self, page_size: u32) -> Outcome {
        let ctx = EligibilityContext {
            kind: self.kind,
            filter: &self.filter,
            auth: &self.auth,
        };
        let eligible = self.plan.eligible(&ctx);
        if eligible.is_empty() {
            warn!(kind = %self.kind, "no eligible provider");
            return Outcome::Failed;
        }
        for (entry, provider) in eligible {
            if let Some((page, items)) = self.attempt(&provider, page_size, None).await {
                info!(kind = %self.kind, provider = provider.name(), "bound listing");
                return Outcome::Loaded {
                    entry,
                    backend: provider.backend(),
                    page,
                    items,
                };
            }
        }
        warn!(kind = %self.kind, "every provider failed");
        Outcome::Failed
    }

    async fn attempt(
        &self,
        provider: &Arc<dyn Provider>,
        page_size: u32,
        token: Option<&str>,
    ) -> Option<(ProviderPage, Vec<Item>)> {
        debug!(kind = %self.kind, provider = provider.name(), token, "fetch page");
        let mut page = match provider
            .fetch_page(self.kind, &self.filter, page_size, token)
            .await
        {
            Ok(page) => page,
            Err(err) => {
                warn!(
                    kind = %self.kind,
                    provider = provider.name(),
                    class = %err.class,
                    error = %err,
                    "provider failed"
                );
                return None;
            }
        };
        let mut items = std::mem::take(&mut page.items);
        if provider.needs_enrichment(self.kind) {
            if let Some(enricher) = &self.enricher {
                items = enricher.enrich(items, self.kind, &self.filter).await;
            }
        }
        Some((page, items))
    }

    fn commit(&mut self, outcome: Outcome) -> Page {
        match outcome {
            Outcome::Loaded {
                entry,
                backend,
                page,
                items,
            } => {
                if self.cursor.is_bound() {
                    self.cursor.advance(&page);
                } else {
                    self.cursor = CursorState::bind(entry, backend, &page);
                }
                self.page_index = self.page_index.saturating_add(1);
                let next_key = self.cursor.has_more().then_some(self.page_index);
                trace!(kind = %self.kind, ?next_key, items = items.len(), "page loaded");
                Page {
                    items,
                    next_key,
                    is_terminal: next_key.is_none(),
                }
            }
            Outcome::Failed => {
                trace!(kind = %self.kind, "cursor exhausted");
                self.cursor = CursorState::Exhausted;
                Page::terminal()
            }
            Outcome::Finished => Page::terminal(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::plan::PlanEntry;
    use crate::testing::{FakeProvider, item_ids, stream};

    fn build(entries: Vec<PlanEntry>, auth: AuthState) -> PagingEngine {
        let plan = ProviderPlan::new(entries).unwrap();
        PagingEngine::new(ListingKind::TopStreams, ListingFilter::new(), plan, auth)
    }

    #[tokio::test]
    async fn falls_back_past_ineligible_and_failing_entries() {
        let a = Arc::new(FakeProvider::new(Backend::Rest));
        let b = Arc::new(FakeProvider::new(Backend::Graph).fail());
        let c = Arc::new(FakeProvider::new(Backend::Legacy).respond(ProviderPage::flagged(
            vec![stream("s1", "u1", 10)],
            Some("c1".into()),
            true,
        )));

        let mut engine = build(
            vec![
                PlanEntry::new(a.clone()).requires_token(),
                PlanEntry::new(b.clone()),
                PlanEntry::new(c.clone()),
            ],
            AuthState::default(),
        );
        let page = engine.load_page(20).await;

        assert_eq!(a.calls(), 0);
        assert_eq!(b.calls(), 1);
        assert_eq!(item_ids(&page.items), vec!["s1"]);
        assert_eq!(page.next_key, Some(1));
        assert!(!page.is_terminal);
        assert_eq!(
            engine.cursor(),
            &CursorState::Bound {
                entry: 2,
                backend: Backend::Legacy,
                token: Some("c1".into()),
                more_pages: true,
                pages_loaded: 1,
            }
        );
    }

    #[tokio::test]
    async fn bound_provider_is_reused_with_its_token() {
        let rest = Arc::new(
            FakeProvider::new(Backend::Rest)
                .respond(ProviderPage::trailing(
                    vec![stream("s1", "u1", 5)],
                    Some("t1".into()),
                ))
                .respond(ProviderPage::trailing(vec![stream("s2", "u2", 4)], None)),
        );
        let graph = Arc::new(FakeProvider::new(Backend::Graph));
        let mut engine = build(
            vec![PlanEntry::new(rest.clone()), PlanEntry::new(graph.clone())],
            AuthState::default(),
        );

        let first = engine.load_page(10).await;
        let second = engine.load_page(10).await;

        assert_eq!(first.next_key, Some(1));
        assert_eq!(item_ids(&second.items), vec!["s2"]);
        assert!(second.is_terminal);
        assert_eq!(rest.tokens(), vec![None, Some("t1".into())]);
        assert_eq!(graph.calls(), 0);

        let after = engine.load_page(10).await;
        assert_eq!(after, Page::terminal());
        assert_eq!(rest.calls(), 2);
    }

    #[tokio::test]
    async fn failure_after_binding_does_not_fall_back() {
        let graph = Arc::new(
            FakeProvider::new(Backend::Graph)
                .respond(ProviderPage::flagged(
                    vec![stream("s1", "u1", 5)],
                    Some("g1".into()),
                    true,
                ))
                .fail(),
        );
        let legacy = Arc::new(FakeProvider::new(Backend::Legacy));
        let mut engine = build(
            vec![PlanEntry::new(graph.clone()), PlanEntry::new(legacy.clone())],
            AuthState::default(),
        );

        engine.load_page(10).await;
        let page = engine.load_page(10).await;

        assert_eq!(page, Page::terminal());
        assert_eq!(engine.cursor(), &CursorState::Exhausted);
        assert_eq!(legacy.calls(), 0);
    }

    #[tokio::test]
    async fn no_eligible_provider_ends_listing() {
        let rest = Arc::new(FakeProvider::new(Backend::Rest));
        let mut engine = build(
            vec![PlanEntry::new(rest.clone()).requires_token()],
            AuthState::default(),
        );

        assert_eq!(engine.load_page(10).await, Page::terminal());
        assert_eq!(rest.calls(), 0);
        assert_eq!(engine.cursor(), &CursorState::Exhausted);
    }

    #[tokio::test]
    async fn graph_first_page_with_blank_token_asks_again() {
        let graph = Arc::new(
            FakeProvider::new(Backend::Graph)
                .respond(ProviderPage::flagged(vec![stream("s1", "u1", 5)], None, true))
                .respond(ProviderPage::flagged(vec![stream("s2", "u2", 3)], None, true)),
        );
        let mut engine = build(vec![PlanEntry::new(graph.clone())], AuthState::default());

        let first = engine.load_page(10).await;
        assert_eq!(first.next_key, Some(1));

        let second = engine.load_page(10).await;
        assert!(second.is_terminal);
        assert_eq!(graph.tokens(), vec![None, None]);
    }

    #[tokio::test]
    async fn refresh_restarts_from_the_plan() {
        let rest = Arc::new(
            FakeProvider::new(Backend::Rest)
                .respond(ProviderPage::trailing(vec![stream("s1", "u1", 5)], None))
                .respond(ProviderPage::trailing(vec![stream("s1", "u1", 6)], None)),
        );
        let mut engine = build(vec![PlanEntry::new(rest.clone())], AuthState::default());

        assert!(engine.load_page(10).await.is_terminal);
        engine.refresh();
        assert_eq!(engine.cursor(), &CursorState::Unstarted);

        let again = engine.load_page(10).await;
        assert_eq!(item_ids(&again.items), vec!["s1"]);
        assert_eq!(rest.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_load_leaves_cursor_untouched() {
        let slow = Arc::new(
            FakeProvider::new(Backend::Rest)
                .with_delay(Duration::from_secs(5))
                .respond(ProviderPage::trailing(
                    vec![stream("s1", "u1", 5)],
                    Some("t1".into()),
                )),
        );
        let mut engine = build(vec![PlanEntry::new(slow.clone())], AuthState::default());
        let cancel = engine.cancel_token();

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            cancel.cancel();
        });
        let page = engine.load_page(10).await;
        canceller.await.unwrap();

        assert_eq!(page, Page::abandoned());
        assert!(!page.is_terminal);
        assert_eq!(engine.cursor(), &CursorState::Unstarted);
    }

    struct Tagging;

    #[async_trait]
    impl Enricher for Tagging {
        async fn enrich(
            &self,
            mut items: Vec<Item>,
            _kind: ListingKind,
            _filter: &ListingFilter,
        ) -> Vec<Item> {
            for item in &mut items {
                if let Some(channel) = item.channel_mut() {
                    channel.display_name = Some("enriched".into());
                }
            }
            items
        }
    }

    #[tokio::test]
    async fn enrichment_runs_only_when_provider_asks() {
        let plain = Arc::new(
            FakeProvider::new(Backend::Rest)
                .respond(ProviderPage::trailing(vec![stream("s1", "u1", 5)], None)),
        );
        let mut engine = build(vec![PlanEntry::new(plain)], AuthState::default())
            .with_enricher(Arc::new(Tagging));
        let page = engine.load_page(10).await;
        assert_eq!(page.items[0].channel().unwrap().display_name, None);

        let needs = Arc::new(
            FakeProvider::new(Backend::Rest)
                .enriched()
                .respond(ProviderPage::trailing(vec![stream("s1", "u1", 5)], None)),
        );
        let mut engine = build(vec![PlanEntry::new(needs)], AuthState::default())
            .with_enricher(Arc::new(Tagging));
        let page = engine.load_page(10).await;
        assert_eq!(
            page.items[0].channel().unwrap().display_name.as_deref(),
            Some("enriched")
        );
    }
}
