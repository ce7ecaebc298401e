// Scripted fakes shared by the unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::model::{ChannelRef, Item, ListingFilter, ListingKind, Stream};
use crate::provider::{Backend, Provider, ProviderFailure, ProviderPage};

pub(crate) struct FakeProvider {
    backend: Backend,
    supported: bool,
    enrich: bool,
    delay: Option<Duration>,
    responses: Mutex<VecDeque<Result<ProviderPage, ProviderFailure>>>,
    tokens: Mutex<Vec<Option<String>>>,
    page_sizes: Mutex<Vec<u32>>,
}

impl FakeProvider {
    pub(crate) fn new(backend: Backend) -> Self {
        Self {
            backend,
            supported: true,
            enrich: false,
            delay: None,
            responses: Mutex::new(VecDeque::new()),
            tokens: Mutex::new(Vec::new()),
            page_sizes: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn respond(self, page: ProviderPage) -> Self {
        self.responses.lock().unwrap().push_back(Ok(page));
        self
    }

    pub(crate) fn fail(self) -> Self {
        let failure = ProviderFailure::new(self.backend, "scripted failure");
        self.responses.lock().unwrap().push_back(Err(failure));
        self
    }

    pub(crate) fn unsupported(mut self) -> Self {
        self.supported = false;
        self
    }

    pub(crate) fn enriched(mut self) -> Self {
        self.enrich = true;
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Tokens passed to each `fetch_page` call, in order.
    pub(crate) fn tokens(&self) -> Vec<Option<String>> {
        self.tokens.lock().unwrap().clone()
    }

    /// Page sizes passed to each `fetch_page` call, in order.
    pub(crate) fn page_sizes(&self) -> Vec<u32> {
        self.page_sizes.lock().unwrap().clone()
    }

    pub(crate) fn calls(&self) -> usize {
        self.tokens.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for FakeProvider {
    fn backend(&self) -> Backend {
        self.backend
    }

    fn supports(&self, _kind: ListingKind, _filter: &ListingFilter) -> bool {
        self.supported
    }

    fn needs_enrichment(&self, _kind: ListingKind) -> bool {
        self.enrich
    }

    async fn fetch_page(
        &self,
        _kind: ListingKind,
        _filter: &ListingFilter,
        page_size: u32,
        token: Option<&str>,
    ) -> Result<ProviderPage, ProviderFailure> {
        self.tokens.lock().unwrap().push(token.map(str::to_owned));
        self.page_sizes.lock().unwrap().push(page_size);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(ProviderFailure::new(self.backend, "no scripted response")))
    }
}

pub(crate) fn channel(id: &str) -> ChannelRef {
    ChannelRef {
        id: Some(id.to_owned()),
        login: Some(format!("login_{id}")),
        ..ChannelRef::default()
    }
}

pub(crate) fn stream(id: &str, channel_id: &str, viewers: u64) -> Item {
    Item::Stream(Stream {
        id: Some(id.to_owned()),
        channel: channel(channel_id),
        viewer_count: viewers,
        ..Stream::default()
    })
}

pub(crate) fn item_ids(items: &[Item]) -> Vec<&str> {
    items.iter().filter_map(Item::key).collect()
}
