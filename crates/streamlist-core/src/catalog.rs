// ── Catalog facade ──
//
// Owns the backend clients, the shared tag cache and the local store, and
// vends one `Session` per listing the caller opens.

use std::collections::HashMap;
use std::sync::Arc;

use async_stream::stream;
use futures_core::Stream;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use streamlist_api::{GraphClient, LegacyClient, RestClient, TlsMode, TransportConfig};

use crate::config::CatalogConfig;
use crate::engine::PagingEngine;
use crate::enrich::{Enricher, ProfileEnricher, ProfileSource};
use crate::error::CoreError;
use crate::merge::{MergeSource, StatusResolver};
use crate::model::{ListingFilter, ListingKind, Page};
use crate::plan::{AuthState, PlanEntry, ProviderPlan};
use crate::provider::{Backend, GraphProvider, LegacyProvider, Provider, RestProvider};
use crate::store::LocalStore;
use crate::tags::{CachedTagSource, TagCache, TagCollection};

/// Backend-facing pieces a `Catalog` is assembled from.
#[derive(Default)]
pub struct CatalogParts {
    pub providers: Vec<Arc<dyn Provider>>,
    pub profile_sources: Vec<Arc<dyn ProfileSource>>,
    pub resolvers: Vec<Arc<dyn StatusResolver>>,
}

pub struct Catalog {
    config: CatalogConfig,
    providers: HashMap<Backend, Arc<dyn Provider>>,
    resolvers: Vec<Arc<dyn StatusResolver>>,
    enricher: Arc<dyn Enricher>,
    store: Arc<dyn LocalStore>,
    tags: Arc<TagCache>,
    auth: AuthState,
}

impl Catalog {
    /// Build the three backend clients from `config`.
    pub fn new(config: CatalogConfig, store: Arc<dyn LocalStore>) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: config
                .ca_cert
                .clone()
                .map_or(TlsMode::System, TlsMode::CustomCa),
            timeout: config.timeout,
        };

        let rest_client = RestClient::new(
            &config.rest.url,
            &config.client_id,
            config.rest.token.as_ref(),
            &transport,
        )
        .map_err(|e| endpoint_error("rest", e))?;
        let graph_client = GraphClient::new(
            &config.graph.url,
            &config.client_id,
            config.graph.token.as_ref(),
            &transport,
        )
        .map_err(|e| endpoint_error("graph", e))?;
        let legacy_client = LegacyClient::new(&config.legacy.url, &config.client_id, &transport)
            .map_err(|e| endpoint_error("legacy", e))?;

        let rest = Arc::new(
            RestProvider::new(Arc::new(rest_client))
                .with_account(config.account.as_ref().map(|a| a.id.clone())),
        );
        let graph = Arc::new(GraphProvider::new(Arc::new(graph_client)));
        let legacy = Arc::new(LegacyProvider::new(Arc::new(legacy_client)));

        let parts = CatalogParts {
            providers: vec![rest.clone(), graph.clone(), legacy],
            profile_sources: vec![rest.clone(), graph.clone()],
            resolvers: vec![rest, graph],
        };
        Ok(Self::from_parts(config, parts, store))
    }

    /// Assemble a catalog from prebuilt providers.
    pub fn from_parts(config: CatalogConfig, parts: CatalogParts, store: Arc<dyn LocalStore>) -> Self {
        let auth = AuthState {
            rest_token: config.has_rest_token(),
            graph_token: config.has_graph_token(),
        };
        let enricher = Arc::new(
            ProfileEnricher::new(parts.profile_sources)
                .with_batch_size(config.enrichment_batch_size),
        );
        let providers = parts
            .providers
            .into_iter()
            .map(|p| (p.backend(), p))
            .collect();
        Self {
            providers,
            resolvers: parts.resolvers,
            enricher,
            tags: Arc::new(TagCache::with_store(Arc::clone(&store))),
            store,
            auth,
            config,
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn auth_state(&self) -> AuthState {
        self.auth
    }

    pub fn tag_cache(&self) -> &Arc<TagCache> {
        &self.tags
    }

    /// Plan for `kind` from the configured backend order.
    ///
    /// REST always needs a token; Graph needs one for followed listings.
    pub fn plan_for(&self, kind: ListingKind) -> Result<ProviderPlan, CoreError> {
        let entries: Vec<PlanEntry> = self
            .config
            .order_for(kind)
            .iter()
            .filter_map(|backend| self.providers.get(backend))
            .map(|provider| {
                let entry = PlanEntry::new(Arc::clone(provider));
                match provider.backend() {
                    Backend::Rest => entry.requires_token(),
                    Backend::Graph if kind.is_followed() => entry.requires_token(),
                    Backend::Graph | Backend::Legacy => entry,
                }
            })
            .collect();
        if entries.is_empty() {
            return Err(CoreError::NoProvider {
                listing: kind.to_string(),
            });
        }
        ProviderPlan::new(entries)
    }

    pub fn create_session(
        &self,
        kind: ListingKind,
        filter: ListingFilter,
    ) -> Result<Session, CoreError> {
        let plan = self.plan_for(kind)?;
        Ok(self.create_session_with_plan(kind, filter, plan))
    }

    pub fn create_session_with_plan(
        &self,
        kind: ListingKind,
        filter: ListingFilter,
        plan: ProviderPlan,
    ) -> Session {
        let cached_catalog = match kind {
            ListingKind::CategoryTags | ListingKind::StreamTags if filter.query().is_none() => {
                kind.tag_catalog(&filter)
            }
            _ => None,
        };
        let engine = PagingEngine::new(kind, filter, plan, self.auth)
            .with_enricher(Arc::clone(&self.enricher));

        let source = if kind.is_followed() {
            SessionSource::Merged(
                MergeSource::new(engine, Arc::clone(&self.store), self.resolvers.clone())
                    .with_batch_size(self.config.enrichment_batch_size),
            )
        } else if let Some(catalog) = cached_catalog {
            SessionSource::Tags(CachedTagSource::new(
                catalog,
                Arc::clone(&self.tags),
                engine,
                TagCollection {
                    limit: self.config.tag_catalog_limit,
                    max_pages: self.config.max_tag_pages,
                },
            ))
        } else {
            SessionSource::Plain(engine)
        };
        debug!(%kind, "session created");
        Session { source }
    }
}

fn endpoint_error(backend: &'static str, err: streamlist_api::Error) -> CoreError {
    match err {
        streamlist_api::Error::InvalidUrl(e) => CoreError::InvalidEndpoint {
            backend,
            reason: e.to_string(),
        },
        other => CoreError::from(other),
    }
}

// ── Sessions ─────────────────────────────────────────────────────────

enum SessionSource {
    Plain(PagingEngine),
    Merged(MergeSource),
    Tags(CachedTagSource),
}

/// One paginated listing. Pages are loaded one at a time.
pub struct Session {
    source: SessionSource,
}

impl Session {
    fn engine(&self) -> &PagingEngine {
        match &self.source {
            SessionSource::Plain(engine) => engine,
            SessionSource::Merged(merged) => merged.engine(),
            SessionSource::Tags(tags) => tags.engine(),
        }
    }

    pub fn kind(&self) -> ListingKind {
        self.engine().kind()
    }

    pub fn filter(&self) -> &ListingFilter {
        self.engine().filter()
    }

    /// Token that abandons in-flight and future loads of this session.
    pub fn cancel_token(&self) -> CancellationToken {
        self.engine().cancel_token()
    }

    pub fn cancel(&self) {
        self.engine().cancel_token().cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.engine().cancel_token().is_cancelled()
    }

    pub async fn load_page(&mut self, page_size: u32) -> Page {
        let page = match &mut self.source {
            SessionSource::Plain(engine) => engine.try_load_page(page_size).await,
            SessionSource::Merged(merged) => merged.try_load_page(page_size).await,
            SessionSource::Tags(tags) => tags.try_load_page(page_size).await,
        };
        page.unwrap_or_else(Page::abandoned)
    }

    /// Start over from the top of the plan.
    pub fn refresh(&mut self) {
        match &mut self.source {
            SessionSource::Plain(engine) => engine.refresh(),
            SessionSource::Merged(merged) => merged.refresh(),
            SessionSource::Tags(tags) => tags.refresh(),
        }
    }

    /// Every remaining page, ending after the terminal page or on cancel.
    pub fn pages(&mut self, page_size: u32) -> impl Stream<Item = Page> + '_ {
        stream! {
            loop {
                let page = self.load_page(page_size).await;
                if self.is_cancelled() {
                    break;
                }
                let done = page.is_terminal;
                yield page;
                if done {
                    break;
                }
            }
        }
    }
}
