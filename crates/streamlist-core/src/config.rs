// ── Runtime catalog configuration ──
//
// Everything the catalog needs to build clients and plans. Carries tokens
// and ordering but never touches disk: `streamlist-config` (or any other
// embedder) constructs a `CatalogConfig` and hands it in.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::model::ListingKind;
use crate::provider::Backend;

pub const DEFAULT_REST_URL: &str = "https://api.twitch.tv/helix/";
pub const DEFAULT_GRAPH_URL: &str = "https://gql.twitch.tv/gql";
pub const DEFAULT_LEGACY_URL: &str = "https://gql.twitch.tv/gql";

/// Where one backend lives and the token it authenticates with.
#[derive(Debug, Clone)]
pub struct BackendEndpoint {
    pub url: String,
    pub token: Option<SecretString>,
}

impl BackendEndpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }
}

/// The signed-in account, used by followed listings on REST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub login: Option<String>,
}

/// Configuration for a `Catalog`.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub rest: BackendEndpoint,
    pub graph: BackendEndpoint,
    pub legacy: BackendEndpoint,
    /// Sent as `Client-Id` to every backend.
    pub client_id: String,
    pub account: Option<Account>,
    /// Default backend priority for every listing.
    pub backend_order: Vec<Backend>,
    /// Per-listing priority overrides.
    pub listing_order: HashMap<ListingKind, Vec<Backend>>,
    /// Ids per secondary lookup request.
    pub enrichment_batch_size: usize,
    /// Request timeout.
    pub timeout: Duration,
    /// Upper bound on pages collected when populating a tag catalog.
    pub max_tag_pages: u32,
    /// Tags requested per call when populating a tag catalog. Independent
    /// of the page size of the session that triggers the population.
    pub tag_catalog_limit: u32,
    /// Extra CA certificate to trust.
    pub ca_cert: Option<PathBuf>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            rest: BackendEndpoint::new(DEFAULT_REST_URL),
            graph: BackendEndpoint::new(DEFAULT_GRAPH_URL),
            legacy: BackendEndpoint::new(DEFAULT_LEGACY_URL),
            client_id: String::new(),
            account: None,
            backend_order: vec![Backend::Graph, Backend::Rest, Backend::Legacy],
            listing_order: HashMap::new(),
            enrichment_batch_size: crate::enrich::DEFAULT_BATCH_SIZE,
            timeout: Duration::from_secs(15),
            max_tag_pages: crate::tags::DEFAULT_MAX_TAG_PAGES,
            tag_catalog_limit: crate::tags::DEFAULT_TAG_CATALOG_LIMIT,
            ca_cert: None,
        }
    }
}

impl CatalogConfig {
    /// Backend priority for `kind`: the override if one exists, else the default.
    pub fn order_for(&self, kind: ListingKind) -> &[Backend] {
        self.listing_order
            .get(&kind)
            .map_or(self.backend_order.as_slice(), Vec::as_slice)
    }

    pub fn has_rest_token(&self) -> bool {
        self.rest.token.is_some()
    }

    pub fn has_graph_token(&self) -> bool {
        self.graph.token.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_override_wins() {
        let mut config = CatalogConfig::default();
        config
            .listing_order
            .insert(ListingKind::GameClips, vec![Backend::Legacy]);

        assert_eq!(config.order_for(ListingKind::GameClips), &[Backend::Legacy]);
        assert_eq!(
            config.order_for(ListingKind::TopStreams),
            &[Backend::Graph, Backend::Rest, Backend::Legacy]
        );
    }
}
