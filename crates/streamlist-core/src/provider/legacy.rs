// Legacy query-graph provider.
//
// Addresses games by name and channels by login, has no follow listings,
// and its stream nodes frequently omit profile images.

use std::sync::Arc;

use async_trait::async_trait;

use streamlist_api::LegacyClient;
use streamlist_api::defaults;
use streamlist_api::legacy::LegacyPage;

use super::graph::{broadcast_type, graph_period, graph_sort, tag_kind};
use super::{Backend, Provider, ProviderFailure, ProviderPage};
use crate::model::{Item, ListingFilter, ListingKind, TagCatalog};

const BACKEND: Backend = Backend::Legacy;

pub struct LegacyProvider {
    client: Arc<LegacyClient>,
}

impl LegacyProvider {
    pub fn new(client: Arc<LegacyClient>) -> Self {
        Self { client }
    }
}

/// Normalize a legacy page the same way as a typed graph connection.
fn legacy_page<T>(page: LegacyPage<T>, map: impl Fn(T) -> Item) -> ProviderPage {
    let more = defaults::has_next_page(page.has_next_page);
    let items = page.items.into_iter().map(map).collect();
    ProviderPage::flagged(items, page.cursor, more)
}

#[async_trait]
impl Provider for LegacyProvider {
    fn backend(&self) -> Backend {
        BACKEND
    }

    fn supports(&self, kind: ListingKind, filter: &ListingFilter) -> bool {
        match kind {
            ListingKind::TopStreams | ListingKind::CategoryTags | ListingKind::StreamTags => true,
            ListingKind::GameStreams | ListingKind::GameVideos | ListingKind::GameClips => {
                filter.game_name.is_some()
            }
            ListingKind::ChannelVideos | ListingKind::ChannelClips => {
                filter.channel_login.is_some()
            }
            ListingKind::SearchChannels | ListingKind::SearchStreams | ListingKind::SearchTags => {
                filter.query().is_some()
            }
            ListingKind::FollowedStreams | ListingKind::FollowedChannels => false,
        }
    }

    fn needs_enrichment(&self, kind: ListingKind) -> bool {
        matches!(
            kind,
            ListingKind::TopStreams | ListingKind::GameStreams | ListingKind::SearchStreams
        )
    }

    async fn fetch_page(
        &self,
        kind: ListingKind,
        filter: &ListingFilter,
        page_size: u32,
        token: Option<&str>,
    ) -> Result<ProviderPage, ProviderFailure> {
        let fail = ProviderFailure::api(BACKEND);
        let missing = |what: &str| ProviderFailure::new(BACKEND, format!("{kind} needs {what}"));
        let game = filter.game_name.as_deref();
        let login = filter.channel_login.as_deref();
        let video_type = filter.video_kind.and_then(broadcast_type);
        let sort = filter.video_sort.map(graph_sort);
        let period = filter.clip_period.map(graph_period);

        let page = match kind {
            ListingKind::TopStreams => {
                let page = self
                    .client
                    .top_streams(page_size, token, &filter.languages, &filter.tags)
                    .await
                    .map_err(fail)?;
                legacy_page(page, |s| Item::Stream(s.into()))
            }
            ListingKind::GameStreams => {
                let game = game.ok_or_else(|| missing("a game name"))?;
                let page = self
                    .client
                    .game_streams(game, page_size, token, &filter.languages, &filter.tags)
                    .await
                    .map_err(fail)?;
                legacy_page(page, |s| Item::Stream(s.into()))
            }
            ListingKind::ChannelVideos => {
                let login = login.ok_or_else(|| missing("a channel login"))?;
                let page = self
                    .client
                    .channel_videos(login, page_size, token, sort, video_type)
                    .await
                    .map_err(fail)?;
                legacy_page(page, |v| Item::Video(v.into()))
            }
            ListingKind::GameVideos => {
                let game = game.ok_or_else(|| missing("a game name"))?;
                let page = self
                    .client
                    .game_videos(game, page_size, token, sort, video_type, &filter.languages)
                    .await
                    .map_err(fail)?;
                legacy_page(page, |v| Item::Video(v.into()))
            }
            ListingKind::ChannelClips => {
                let login = login.ok_or_else(|| missing("a channel login"))?;
                let page = self
                    .client
                    .channel_clips(login, page_size, token, period)
                    .await
                    .map_err(fail)?;
                legacy_page(page, |c| Item::Clip(c.into()))
            }
            ListingKind::GameClips => {
                let game = game.ok_or_else(|| missing("a game name"))?;
                let page = self
                    .client
                    .game_clips(game, page_size, token, period, &filter.languages)
                    .await
                    .map_err(fail)?;
                legacy_page(page, |c| Item::Clip(c.into()))
            }
            ListingKind::SearchChannels => {
                let query = filter.query().ok_or_else(|| missing("a query"))?;
                let page = self
                    .client
                    .search_channels(query, page_size, token)
                    .await
                    .map_err(fail)?;
                legacy_page(page, |c| Item::Channel(c.into()))
            }
            ListingKind::SearchStreams => {
                let query = filter.query().ok_or_else(|| missing("a query"))?;
                let page = self
                    .client
                    .search_streams(query, page_size, token)
                    .await
                    .map_err(fail)?;
                legacy_page(page, |s| Item::Stream(s.into()))
            }
            ListingKind::CategoryTags | ListingKind::StreamTags | ListingKind::SearchTags => {
                let catalog = kind.tag_catalog(filter).unwrap_or(TagCatalog::Stream);
                let tags = self
                    .client
                    .search_tags(tag_kind(catalog), filter.query(), page_size)
                    .await
                    .map_err(fail)?;
                ProviderPage::single(tags.into_iter().map(|t| Item::Tag(t.into())).collect())
            }
            ListingKind::FollowedStreams | ListingKind::FollowedChannels => {
                return Err(ProviderFailure::unsupported(BACKEND, kind));
            }
        };
        Ok(page)
    }
}
