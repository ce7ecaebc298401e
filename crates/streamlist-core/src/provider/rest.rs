// REST provider: trailing-cursor pagination, token required everywhere.
//
// REST responses lack profile images and (for clips and game videos) game
// names. Game names are joined here; profiles come from the enricher.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, TimeDelta, Utc};
use futures_util::future::join_all;
use tracing::{debug, warn};

use streamlist_api::RestClient;
use streamlist_api::rest::client::MAX_LOOKUP_IDS;
use streamlist_api::rest::{ClipQuery, StreamQuery, VideoQuery};

use super::{Backend, Provider, ProviderFailure, ProviderPage};
use crate::enrich::ProfileSource;
use crate::merge::{StatusMap, StatusResolver};
use crate::model::{
    ChannelRef, ClipPeriod, GameRef, Item, ListingFilter, ListingKind, Stream, VideoKind,
    VideoSort,
};
use crate::store::LocalFollow;

const BACKEND: Backend = Backend::Rest;

pub struct RestProvider {
    client: Arc<RestClient>,
    account_id: Option<String>,
}

impl RestProvider {
    pub fn new(client: Arc<RestClient>) -> Self {
        Self {
            client,
            account_id: None,
        }
    }

    /// Account used for followed listings when the filter names none.
    pub fn with_account(mut self, account_id: Option<String>) -> Self {
        self.account_id = account_id;
        self
    }

    fn user_id<'a>(&'a self, filter: &'a ListingFilter) -> Option<&'a str> {
        filter.user_id.as_deref().or(self.account_id.as_deref())
    }

    // ── Listings ─────────────────────────────────────────────────────

    async fn streams(
        &self,
        filter: &ListingFilter,
        first: u32,
        after: Option<&str>,
    ) -> Result<ProviderPage, ProviderFailure> {
        let query = StreamQuery {
            first,
            after: after.map(str::to_owned),
            game_ids: filter.game_id.iter().cloned().collect(),
            languages: filter.languages.clone(),
            ..StreamQuery::default()
        };
        let page = self
            .client
            .get_streams(&query)
            .await
            .map_err(ProviderFailure::api(BACKEND))?;
        let token = page.cursor();
        let items = page.data.into_iter().map(|s| Item::Stream(s.into())).collect();
        Ok(ProviderPage::trailing(items, token))
    }

    async fn followed_streams(
        &self,
        user_id: &str,
        first: u32,
        after: Option<&str>,
    ) -> Result<ProviderPage, ProviderFailure> {
        let page = self
            .client
            .get_followed_streams(user_id, first, after)
            .await
            .map_err(ProviderFailure::api(BACKEND))?;
        let token = page.cursor();
        let items = page.data.into_iter().map(|s| Item::Stream(s.into())).collect();
        Ok(ProviderPage::trailing(items, token))
    }

    async fn followed_channels(
        &self,
        user_id: &str,
        first: u32,
        after: Option<&str>,
    ) -> Result<ProviderPage, ProviderFailure> {
        let page = self
            .client
            .get_followed_channels(user_id, first, after)
            .await
            .map_err(ProviderFailure::api(BACKEND))?;
        let token = page.cursor();
        let items = page.data.into_iter().map(|c| Item::Channel(c.into())).collect();
        Ok(ProviderPage::trailing(items, token))
    }

    async fn videos(
        &self,
        kind: ListingKind,
        filter: &ListingFilter,
        first: u32,
        after: Option<&str>,
    ) -> Result<ProviderPage, ProviderFailure> {
        let by_game = kind == ListingKind::GameVideos;
        let query = VideoQuery {
            first,
            after: after.map(str::to_owned),
            user_id: if by_game { None } else { filter.channel_id.clone() },
            game_id: if by_game { filter.game_id.clone() } else { None },
            language: filter.languages.first().cloned(),
            period: None,
            sort: filter.video_sort.map(|s| video_sort(s).to_owned()),
            video_type: filter.video_kind.and_then(video_type).map(str::to_owned),
        };
        let page = self
            .client
            .get_videos(&query)
            .await
            .map_err(ProviderFailure::api(BACKEND))?;
        let token = page.cursor();
        let mut items: Vec<Item> = page.data.into_iter().map(|v| Item::Video(v.into())).collect();

        // Videos carry no game; a game listing knows its game by id.
        if let Some(game_id) = query.game_id {
            let games = self.game_names(vec![game_id.clone()]).await;
            let game = games.get(&game_id).cloned().unwrap_or(GameRef {
                id: Some(game_id),
                ..GameRef::default()
            });
            for item in &mut items {
                if let Item::Video(video) = item {
                    video.game = Some(game.clone());
                }
            }
        }
        Ok(ProviderPage::trailing(items, token))
    }

    async fn clips(
        &self,
        kind: ListingKind,
        filter: &ListingFilter,
        first: u32,
        after: Option<&str>,
    ) -> Result<ProviderPage, ProviderFailure> {
        let by_game = kind == ListingKind::GameClips;
        let query = ClipQuery {
            first,
            after: after.map(str::to_owned),
            broadcaster_id: if by_game { None } else { filter.channel_id.clone() },
            game_id: if by_game { filter.game_id.clone() } else { None },
            started_at: filter.clip_period.and_then(period_start),
            ended_at: None,
        };
        let page = self
            .client
            .get_clips(&query)
            .await
            .map_err(ProviderFailure::api(BACKEND))?;
        let token = page.cursor();
        let mut items: Vec<Item> = page.data.into_iter().map(|c| Item::Clip(c.into())).collect();

        let ids: Vec<String> = items
            .iter()
            .filter_map(|item| match item {
                Item::Clip(c) => c.game.as_ref().and_then(|g| g.id.clone()),
                _ => None,
            })
            .collect();
        let games = self.game_names(ids).await;
        for item in &mut items {
            if let Item::Clip(clip) = item {
                if let Some(game) = clip.game.as_mut() {
                    if let Some(found) = game.id.as_ref().and_then(|id| games.get(id)) {
                        *game = found.clone();
                    }
                }
            }
        }
        Ok(ProviderPage::trailing(items, token))
    }

    async fn search_channels(
        &self,
        filter: &ListingFilter,
        first: u32,
        after: Option<&str>,
    ) -> Result<ProviderPage, ProviderFailure> {
        let query = filter
            .query()
            .ok_or_else(|| ProviderFailure::new(BACKEND, "search needs a query"))?;
        let page = self
            .client
            .search_channels(query, first, after, false)
            .await
            .map_err(ProviderFailure::api(BACKEND))?;
        let token = page.cursor();
        let items = page.data.into_iter().map(|c| Item::Channel(c.into())).collect();
        Ok(ProviderPage::trailing(items, token))
    }

    // ── Game-name join ───────────────────────────────────────────────

    /// Look up numeric game ids in batches. Failed batches are left out.
    async fn game_names(&self, ids: Vec<String>) -> HashMap<String, GameRef> {
        let mut ids: Vec<String> = ids
            .into_iter()
            .filter(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return HashMap::new();
        }

        let lookups = ids
            .chunks(MAX_LOOKUP_IDS)
            .map(|chunk| self.client.get_games(chunk));
        let mut games = HashMap::new();
        for result in join_all(lookups).await {
            match result {
                Ok(found) => {
                    for game in found {
                        games.insert(game.id.clone(), GameRef::from(game));
                    }
                }
                Err(e) => warn!(error = %e, "game name lookup failed"),
            }
        }
        debug!(requested = ids.len(), resolved = games.len(), "joined game names");
        games
    }
}

#[async_trait]
impl Provider for RestProvider {
    fn backend(&self) -> Backend {
        BACKEND
    }

    fn supports(&self, kind: ListingKind, filter: &ListingFilter) -> bool {
        // Free-form tag filtering has no REST equivalent.
        if !filter.tags.is_empty() {
            return false;
        }
        match kind {
            ListingKind::TopStreams => true,
            ListingKind::GameStreams | ListingKind::GameClips => filter.game_id.is_some(),
            ListingKind::GameVideos => filter.game_id.is_some() && filter.languages.len() <= 1,
            ListingKind::ChannelVideos => {
                filter.channel_id.is_some() && filter.languages.len() <= 1
            }
            ListingKind::ChannelClips => filter.channel_id.is_some(),
            ListingKind::FollowedStreams | ListingKind::FollowedChannels => {
                self.user_id(filter).is_some()
            }
            ListingKind::SearchChannels => filter.query().is_some(),
            ListingKind::SearchStreams
            | ListingKind::CategoryTags
            | ListingKind::StreamTags
            | ListingKind::SearchTags => false,
        }
    }

    fn needs_enrichment(&self, kind: ListingKind) -> bool {
        matches!(
            kind,
            ListingKind::TopStreams
                | ListingKind::GameStreams
                | ListingKind::FollowedStreams
                | ListingKind::FollowedChannels
                | ListingKind::ChannelVideos
                | ListingKind::GameVideos
                | ListingKind::ChannelClips
                | ListingKind::GameClips
        )
    }

    async fn fetch_page(
        &self,
        kind: ListingKind,
        filter: &ListingFilter,
        page_size: u32,
        token: Option<&str>,
    ) -> Result<ProviderPage, ProviderFailure> {
        match kind {
            ListingKind::TopStreams | ListingKind::GameStreams => {
                self.streams(filter, page_size, token).await
            }
            ListingKind::FollowedStreams | ListingKind::FollowedChannels => {
                let user_id = self
                    .user_id(filter)
                    .ok_or_else(|| ProviderFailure::new(BACKEND, "no account for follows"))?;
                if kind == ListingKind::FollowedStreams {
                    self.followed_streams(user_id, page_size, token).await
                } else {
                    self.followed_channels(user_id, page_size, token).await
                }
            }
            ListingKind::ChannelVideos | ListingKind::GameVideos => {
                self.videos(kind, filter, page_size, token).await
            }
            ListingKind::ChannelClips | ListingKind::GameClips => {
                self.clips(kind, filter, page_size, token).await
            }
            ListingKind::SearchChannels => self.search_channels(filter, page_size, token).await,
            _ => Err(ProviderFailure::unsupported(BACKEND, kind)),
        }
    }
}

#[async_trait]
impl ProfileSource for RestProvider {
    fn source_name(&self) -> &'static str {
        BACKEND.as_str()
    }

    fn is_available(&self) -> bool {
        self.client.has_token()
    }

    async fn profiles(&self, ids: &[String]) -> Result<Vec<ChannelRef>, ProviderFailure> {
        let users = self
            .client
            .get_users(ids)
            .await
            .map_err(ProviderFailure::api(BACKEND))?;
        Ok(users.into_iter().map(ChannelRef::from).collect())
    }
}

#[async_trait]
impl StatusResolver for RestProvider {
    fn source_name(&self) -> &'static str {
        BACKEND.as_str()
    }

    fn is_available(&self) -> bool {
        self.client.has_token()
    }

    async fn resolve(&self, follows: &[LocalFollow]) -> Result<StatusMap, ProviderFailure> {
        let mut query = StreamQuery {
            first: 100,
            ..StreamQuery::default()
        };
        for follow in follows {
            match (&follow.channel_id, &follow.login) {
                (Some(id), _) => query.user_ids.push(id.clone()),
                (None, Some(login)) => query.user_logins.push(login.clone()),
                (None, None) => {}
            }
        }
        let page = self
            .client
            .get_streams(&query)
            .await
            .map_err(ProviderFailure::api(BACKEND))?;

        let mut statuses = StatusMap::new();
        for raw in page.data {
            let stream = Stream::from(raw);
            crate::merge::insert_status(&mut statuses, &stream.channel, stream.live_status());
        }
        Ok(statuses)
    }
}

// ── Parameter mapping ────────────────────────────────────────────────

fn video_sort(sort: VideoSort) -> &'static str {
    match sort {
        VideoSort::Time => "time",
        VideoSort::Views => "views",
    }
}

fn video_type(kind: VideoKind) -> Option<&'static str> {
    match kind {
        VideoKind::Archive => Some("archive"),
        VideoKind::Highlight => Some("highlight"),
        VideoKind::Upload => Some("upload"),
        VideoKind::Unknown => None,
    }
}

fn period_start(period: ClipPeriod) -> Option<String> {
    let days = match period {
        ClipPeriod::Day => 1,
        ClipPeriod::Week => 7,
        ClipPeriod::Month => 30,
        ClipPeriod::All => return None,
    };
    let start = Utc::now() - TimeDelta::days(days);
    Some(start.to_rfc3339_opts(SecondsFormat::Secs, true))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn provider(server: &MockServer) -> RestProvider {
        let client = RestClient::from_reqwest(&server.uri(), reqwest::Client::new(), true).unwrap();
        RestProvider::new(Arc::new(client)).with_account(Some("42".into()))
    }

    #[test]
    fn tag_filters_and_multi_language_videos_are_unsupported() {
        let client =
            RestClient::from_reqwest("http://localhost", reqwest::Client::new(), true).unwrap();
        let provider = RestProvider::new(Arc::new(client));

        let tagged = ListingFilter::new().with_tags(["English"]);
        assert!(!provider.supports(ListingKind::TopStreams, &tagged));

        let videos = ListingFilter::new()
            .with_game_id("1")
            .with_languages(["en", "de"]);
        assert!(!provider.supports(ListingKind::GameVideos, &videos));
        assert!(provider.supports(ListingKind::GameStreams, &videos));

        assert!(!provider.supports(ListingKind::FollowedStreams, &ListingFilter::new()));
        assert!(provider.supports(
            ListingKind::FollowedStreams,
            &ListingFilter::new().with_user_id("9")
        ));
    }

    #[tokio::test]
    async fn clips_join_game_names() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clips"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    { "id": "c1", "broadcaster_id": "7", "game_id": "509658", "view_count": 10 },
                    { "id": "c2", "broadcaster_id": "7", "game_id": "" }
                ],
                "pagination": { "cursor": "n1" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/games"))
            .and(query_param("id", "509658"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [ { "id": "509658", "name": "Just Chatting" } ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = provider(&server)
            .await
            .fetch_page(
                ListingKind::ChannelClips,
                &ListingFilter::new().with_channel_id("7"),
                20,
                None,
            )
            .await
            .unwrap();

        assert_eq!(page.next_token.as_deref(), Some("n1"));
        assert!(page.more_pages);
        let Item::Clip(first) = &page.items[0] else {
            panic!("expected clip");
        };
        assert_eq!(
            first.game.as_ref().and_then(|g| g.name.as_deref()),
            Some("Just Chatting")
        );
        let Item::Clip(second) = &page.items[1] else {
            panic!("expected clip");
        };
        assert_eq!(second.game, None);
    }

    #[tokio::test]
    async fn failed_game_join_keeps_clips() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clips"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [ { "id": "c1", "broadcaster_id": "7", "game_id": "1" } ],
                "pagination": {}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/games"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let page = provider(&server)
            .await
            .fetch_page(
                ListingKind::GameClips,
                &ListingFilter::new().with_game_id("1"),
                20,
                None,
            )
            .await
            .unwrap();

        assert_eq!(page.items.len(), 1);
        assert!(!page.more_pages);
    }

    #[tokio::test]
    async fn followed_streams_use_configured_account() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/streams/followed"))
            .and(query_param("user_id", "42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [ { "id": "s1", "user_id": "u1", "viewer_count": 5 } ],
                "pagination": { "cursor": "" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = provider(&server)
            .await
            .fetch_page(ListingKind::FollowedStreams, &ListingFilter::new(), 20, None)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.next_token, None);
        assert!(!page.more_pages);
    }

    #[tokio::test]
    async fn resolver_keys_by_id_and_login() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/streams"))
            .and(query_param("user_id", "1"))
            .and(query_param("user_login", "beta"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    { "id": "s2", "user_id": "2", "user_login": "beta", "viewer_count": 70 }
                ]
            })))
            .mount(&server)
            .await;

        let follows = vec![
            LocalFollow::new("1", "alpha"),
            LocalFollow {
                login: Some("beta".into()),
                ..LocalFollow::default()
            },
        ];
        let statuses = provider(&server).await.resolve(&follows).await.unwrap();

        assert!(!statuses.contains_key("1"));
        assert_eq!(statuses.get("beta").map(|s| s.viewer_count), Some(70));
        assert_eq!(statuses.get("2").map(|s| s.viewer_count), Some(70));
    }

    #[test]
    fn all_time_clips_have_no_start() {
        assert_eq!(period_start(ClipPeriod::All), None);
        assert!(period_start(ClipPeriod::Week).unwrap().ends_with('Z'));
    }
}
