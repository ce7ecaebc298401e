// Typed query-graph provider: flagged pagination, complete payloads.

use std::sync::Arc;

use async_trait::async_trait;

use streamlist_api::GraphClient;
use streamlist_api::graph::{self as api, Connection, Selector};

use super::{Backend, Provider, ProviderFailure, ProviderPage};
use crate::convert::graph_user_stream;
use crate::enrich::ProfileSource;
use crate::merge::{StatusMap, StatusResolver};
use crate::model::{
    Channel, ChannelRef, ClipPeriod, Item, ListingFilter, ListingKind, LiveStatus, TagCatalog,
    VideoKind, VideoSort,
};
use crate::store::LocalFollow;

const BACKEND: Backend = Backend::Graph;

pub struct GraphProvider {
    client: Arc<GraphClient>,
}

impl GraphProvider {
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

fn game_selector(filter: &ListingFilter) -> Option<Selector<'_>> {
    filter
        .game_id
        .as_deref()
        .map(Selector::Id)
        .or_else(|| filter.game_name.as_deref().map(Selector::Name))
}

fn channel_selector(filter: &ListingFilter) -> Option<Selector<'_>> {
    filter
        .channel_id
        .as_deref()
        .map(Selector::Id)
        .or_else(|| filter.channel_login.as_deref().map(Selector::Name))
}

/// Flagged page from a connection, mapping each node.
fn connection_page<T>(conn: Connection<T>, map: impl Fn(T) -> Option<Item>) -> ProviderPage {
    let token = conn.last_cursor();
    let more = conn.has_next_page();
    let items = conn.into_nodes().into_iter().filter_map(map).collect();
    ProviderPage::flagged(items, token, more)
}

#[async_trait]
impl Provider for GraphProvider {
    fn backend(&self) -> Backend {
        BACKEND
    }

    fn supports(&self, kind: ListingKind, filter: &ListingFilter) -> bool {
        match kind {
            ListingKind::TopStreams
            | ListingKind::FollowedStreams
            | ListingKind::FollowedChannels
            | ListingKind::CategoryTags
            | ListingKind::StreamTags => true,
            ListingKind::GameStreams | ListingKind::GameVideos | ListingKind::GameClips => {
                filter.has_game()
            }
            ListingKind::ChannelVideos | ListingKind::ChannelClips => filter.has_channel(),
            ListingKind::SearchChannels | ListingKind::SearchStreams | ListingKind::SearchTags => {
                filter.query().is_some()
            }
        }
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
        let types: Vec<String> = filter
            .video_kind
            .and_then(broadcast_type)
            .map(|t| vec![t.to_owned()])
            .unwrap_or_default();

        let page = match kind {
            ListingKind::TopStreams => {
                let conn = self
                    .client
                    .top_streams(page_size, token, &filter.tags, &filter.languages)
                    .await
                    .map_err(fail)?;
                connection_page(conn, |s| Some(Item::Stream(s.into())))
            }
            ListingKind::GameStreams => {
                let game = game_selector(filter).ok_or_else(|| missing("a game"))?;
                let conn = self
                    .client
                    .game_streams(game, page_size, token, &filter.tags, &filter.languages)
                    .await
                    .map_err(fail)?;
                connection_page(conn, |s| Some(Item::Stream(s.into())))
            }
            ListingKind::SearchStreams => {
                let query = filter.query().ok_or_else(|| missing("a query"))?;
                let conn = self
                    .client
                    .search_streams(query, page_size, token)
                    .await
                    .map_err(fail)?;
                connection_page(conn, |s| Some(Item::Stream(s.into())))
            }
            ListingKind::FollowedStreams => {
                let conn = self
                    .client
                    .followed_streams(page_size, token)
                    .await
                    .map_err(fail)?;
                connection_page(conn, |u| graph_user_stream(u).map(Item::Stream))
            }
            ListingKind::FollowedChannels => {
                let conn = self
                    .client
                    .followed_channels(page_size, token)
                    .await
                    .map_err(fail)?;
                let token = conn.last_cursor();
                let more = conn.has_next_page();
                let items = conn
                    .edges
                    .into_iter()
                    .filter_map(|edge| {
                        let followed_at =
                            crate::convert::parse_datetime(edge.followed_at.as_deref());
                        edge.node.map(|user| {
                            Item::Channel(Channel {
                                followed_at,
                                ..Channel::from(user)
                            })
                        })
                    })
                    .collect();
                ProviderPage::flagged(items, token, more)
            }
            ListingKind::ChannelVideos => {
                let user = channel_selector(filter).ok_or_else(|| missing("a channel"))?;
                let sort = filter.video_sort.map(graph_sort);
                let conn = self
                    .client
                    .user_videos(user, page_size, token, sort, &types)
                    .await
                    .map_err(fail)?;
                connection_page(conn, |v| Some(Item::Video(v.into())))
            }
            ListingKind::GameVideos => {
                let game = game_selector(filter).ok_or_else(|| missing("a game"))?;
                let sort = filter.video_sort.map(graph_sort);
                let conn = self
                    .client
                    .game_videos(game, page_size, token, sort, &types, &filter.languages)
                    .await
                    .map_err(fail)?;
                connection_page(conn, |v| Some(Item::Video(v.into())))
            }
            ListingKind::ChannelClips => {
                let user = channel_selector(filter).ok_or_else(|| missing("a channel"))?;
                let period = filter.clip_period.map(graph_period);
                let conn = self
                    .client
                    .user_clips(user, page_size, token, period)
                    .await
                    .map_err(fail)?;
                connection_page(conn, |c| Some(Item::Clip(c.into())))
            }
            ListingKind::GameClips => {
                let game = game_selector(filter).ok_or_else(|| missing("a game"))?;
                let period = filter.clip_period.map(graph_period);
                let conn = self
                    .client
                    .game_clips(game, page_size, token, period, &filter.languages)
                    .await
                    .map_err(fail)?;
                connection_page(conn, |c| Some(Item::Clip(c.into())))
            }
            ListingKind::SearchChannels => {
                let query = filter.query().ok_or_else(|| missing("a query"))?;
                let conn = self
                    .client
                    .search_channels(query, page_size, token)
                    .await
                    .map_err(fail)?;
                connection_page(conn, |u| Some(Item::Channel(u.into())))
            }
            ListingKind::CategoryTags | ListingKind::StreamTags | ListingKind::SearchTags => {
                let catalog = kind.tag_catalog(filter).unwrap_or(TagCatalog::Stream);
                let tags = self
                    .client
                    .tags(tag_kind(catalog), filter.query(), page_size)
                    .await
                    .map_err(fail)?;
                ProviderPage::single(tags.into_iter().map(|t| Item::Tag(t.into())).collect())
            }
        };
        Ok(page)
    }
}

#[async_trait]
impl ProfileSource for GraphProvider {
    fn source_name(&self) -> &'static str {
        BACKEND.as_str()
    }

    async fn profiles(&self, ids: &[String]) -> Result<Vec<ChannelRef>, ProviderFailure> {
        let users = self
            .client
            .users(ids)
            .await
            .map_err(ProviderFailure::api(BACKEND))?;
        Ok(users.iter().map(ChannelRef::from).collect())
    }
}

#[async_trait]
impl StatusResolver for GraphProvider {
    fn source_name(&self) -> &'static str {
        BACKEND.as_str()
    }

    async fn resolve(&self, follows: &[LocalFollow]) -> Result<StatusMap, ProviderFailure> {
        let ids: Vec<String> = follows.iter().filter_map(|f| f.channel_id.clone()).collect();
        if ids.is_empty() {
            return Ok(StatusMap::new());
        }
        let users = self
            .client
            .users(&ids)
            .await
            .map_err(ProviderFailure::api(BACKEND))?;

        let mut statuses = StatusMap::new();
        for user in users {
            let channel = ChannelRef::from(&user);
            if let Some(stream) = user.stream {
                crate::merge::insert_status(&mut statuses, &channel, LiveStatus::from(stream));
            }
        }
        Ok(statuses)
    }
}

// ── Parameter mapping ────────────────────────────────────────────────

pub(crate) fn graph_sort(sort: VideoSort) -> api::VideoSort {
    match sort {
        VideoSort::Time => api::VideoSort::Time,
        VideoSort::Views => api::VideoSort::Views,
    }
}

pub(crate) fn graph_period(period: ClipPeriod) -> api::ClipPeriod {
    match period {
        ClipPeriod::Day => api::ClipPeriod::LastDay,
        ClipPeriod::Week => api::ClipPeriod::LastWeek,
        ClipPeriod::Month => api::ClipPeriod::LastMonth,
        ClipPeriod::All => api::ClipPeriod::AllTime,
    }
}

pub(crate) fn tag_kind(catalog: TagCatalog) -> api::TagKind {
    match catalog {
        TagCatalog::Category => api::TagKind::Category,
        TagCatalog::Stream => api::TagKind::Stream,
    }
}

pub(crate) fn broadcast_type(kind: VideoKind) -> Option<&'static str> {
    match kind {
        VideoKind::Archive => Some("ARCHIVE"),
        VideoKind::Highlight => Some("HIGHLIGHT"),
        VideoKind::Upload => Some("UPLOAD"),
        VideoKind::Unknown => None,
    }
}
