// Legacy listing operations: streams, videos, clips and search.
//
// Games are addressed by name and channels by login; the legacy endpoint
// has no id-based variants of these operations.

use serde_json::json;

use super::client::LegacyClient;
use super::models::{LegacyChannel, LegacyClip, LegacyPage, LegacyStream, LegacyVideo};
use crate::Error;
use crate::graph::{ClipPeriod, VideoSort};

impl LegacyClient {
    // ── Streams ──────────────────────────────────────────────────────

    pub async fn top_streams(
        &self,
        limit: u32,
        cursor: Option<&str>,
        languages: &[String],
        tags: &[String],
    ) -> Result<LegacyPage<LegacyStream>, Error> {
        let vars = json!({
            "limit": limit,
            "cursor": cursor,
            "options": {
                "sort": "VIEWER_COUNT",
                "broadcasterLanguages": languages,
                "freeformTags": tags,
            },
        });
        self.page("BrowsePage_Popular", vars, &["streams"]).await
    }

    pub async fn game_streams(
        &self,
        game_name: &str,
        limit: u32,
        cursor: Option<&str>,
        languages: &[String],
        tags: &[String],
    ) -> Result<LegacyPage<LegacyStream>, Error> {
        let vars = json!({
            "name": game_name.to_lowercase(),
            "limit": limit,
            "cursor": cursor,
            "options": {
                "sort": "VIEWER_COUNT",
                "broadcasterLanguages": languages,
                "freeformTags": tags,
            },
        });
        self.page("DirectoryPage_Game", vars, &["game", "streams"])
            .await
    }

    // ── Videos ───────────────────────────────────────────────────────

    pub async fn channel_videos(
        &self,
        login: &str,
        limit: u32,
        cursor: Option<&str>,
        sort: Option<VideoSort>,
        broadcast_type: Option<&str>,
    ) -> Result<LegacyPage<LegacyVideo>, Error> {
        let vars = json!({
            "channelOwnerLogin": login,
            "limit": limit,
            "cursor": cursor,
            "videoSort": sort.map(VideoSort::as_str),
            "broadcastType": broadcast_type,
        });
        self.page("FilterableVideoTower_Videos", vars, &["user", "videos"])
            .await
    }

    pub async fn game_videos(
        &self,
        game_name: &str,
        limit: u32,
        cursor: Option<&str>,
        sort: Option<VideoSort>,
        broadcast_type: Option<&str>,
        languages: &[String],
    ) -> Result<LegacyPage<LegacyVideo>, Error> {
        let vars = json!({
            "gameName": game_name,
            "limit": limit,
            "cursor": cursor,
            "videoSort": sort.map(VideoSort::as_str),
            "broadcastTypes": broadcast_type.map(|t| vec![t]),
            "languages": languages,
        });
        self.page("DirectoryVideos_Game", vars, &["game", "videos"])
            .await
    }

    // ── Clips ────────────────────────────────────────────────────────

    pub async fn channel_clips(
        &self,
        login: &str,
        limit: u32,
        cursor: Option<&str>,
        period: Option<ClipPeriod>,
    ) -> Result<LegacyPage<LegacyClip>, Error> {
        let vars = json!({
            "login": login,
            "limit": limit,
            "cursor": cursor,
            "criteria": { "filter": period.map(ClipPeriod::as_str) },
        });
        self.page("ClipsCards__User", vars, &["user", "clips"]).await
    }

    pub async fn game_clips(
        &self,
        game_name: &str,
        limit: u32,
        cursor: Option<&str>,
        period: Option<ClipPeriod>,
        languages: &[String],
    ) -> Result<LegacyPage<LegacyClip>, Error> {
        let vars = json!({
            "gameName": game_name,
            "limit": limit,
            "cursor": cursor,
            "criteria": {
                "filter": period.map(ClipPeriod::as_str),
                "languages": languages,
            },
        });
        self.page("ClipsCards__Game", vars, &["game", "clips"]).await
    }

    // ── Search ───────────────────────────────────────────────────────

    pub async fn search_channels(
        &self,
        query: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<LegacyPage<LegacyChannel>, Error> {
        let vars = json!({
            "query": query,
            "options": { "targets": [ { "index": "CHANNEL", "cursor": cursor, "limit": limit } ] },
        });
        self.page(
            "SearchResultsPage_SearchResults",
            vars,
            &["searchFor", "channels"],
        )
        .await
    }

    pub async fn search_streams(
        &self,
        query: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<LegacyPage<LegacyStream>, Error> {
        let vars = json!({
            "query": query,
            "options": { "targets": [ { "index": "STREAM", "cursor": cursor, "limit": limit } ] },
        });
        self.page(
            "SearchResultsPage_SearchResults",
            vars,
            &["searchFor", "streams"],
        )
        .await
    }
}
