// Hand-crafted async client for the typed query-graph API.
//
// One POST endpoint; each call sends `{ operationName, query, variables }`
// and receives `{ data, errors }`. Any entry in `errors` fails the call:
// partial data is never returned.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use super::queries;
use super::types::{
    Connection, GraphClip, GraphResponse, GraphStream, GraphTag, GraphUser, GraphVideo,
};
use crate::Error;
use crate::transport::TransportConfig;

/// Maximum ids accepted by the `users` lookup.
pub const MAX_USER_IDS: usize = 100;

// ── Argument enums ───────────────────────────────────────────────────

/// Time window for clip listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipPeriod {
    LastDay,
    LastWeek,
    LastMonth,
    AllTime,
}

impl ClipPeriod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LastDay => "LAST_DAY",
            Self::LastWeek => "LAST_WEEK",
            Self::LastMonth => "LAST_MONTH",
            Self::AllTime => "ALL_TIME",
        }
    }
}

/// Ordering for video listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoSort {
    Time,
    Views,
}

impl VideoSort {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Time => "TIME",
            Self::Views => "VIEWS",
        }
    }
}

/// Which global tag catalog to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Category,
    Stream,
}

impl TagKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Category => "CATEGORY",
            Self::Stream => "STREAM",
        }
    }
}

/// Selects a game or user either by id or by name/login.
#[derive(Debug, Clone, Copy)]
pub enum Selector<'a> {
    Id(&'a str),
    Name(&'a str),
}

impl Selector<'_> {
    fn split(self) -> (Option<String>, Option<String>) {
        match self {
            Self::Id(id) => (Some(id.to_owned()), None),
            Self::Name(name) => (None, Some(name.to_owned())),
        }
    }
}

// ── Response wrappers ────────────────────────────────────────────────

#[derive(Deserialize)]
struct GameData<T> {
    game: Option<T>,
}

#[derive(Deserialize)]
struct UserData<T> {
    user: Option<T>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentUserData<T> {
    current_user: Option<T>,
}

#[derive(Deserialize)]
struct StreamsField {
    streams: Option<Connection<GraphStream>>,
}

#[derive(Deserialize)]
struct VideosField {
    videos: Option<Connection<GraphVideo>>,
}

#[derive(Deserialize)]
struct ClipsField {
    clips: Option<Connection<GraphClip>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FollowedLiveField {
    followed_live_users: Option<Connection<GraphUser>>,
}

#[derive(Deserialize)]
struct FollowsField {
    follows: Option<Connection<GraphUser>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchUsersData {
    search_users: Option<Connection<GraphUser>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchStreamsData {
    search_streams: Option<Connection<GraphStream>>,
}

#[derive(Deserialize)]
struct UsersData {
    users: Option<Vec<Option<GraphUser>>>,
}

#[derive(Deserialize)]
struct TagsData {
    tags: Option<Vec<GraphTag>>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the typed query-graph API.
pub struct GraphClient {
    http: reqwest::Client,
    endpoint: Url,
    authenticated: bool,
}

impl GraphClient {
    /// Build from a client id, an optional user token, and a transport config.
    pub fn new(
        endpoint: &str,
        client_id: &str,
        token: Option<&SecretString>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let id_value = HeaderValue::from_str(client_id).map_err(|e| Error::Authentication {
            message: format!("invalid client id header value: {e}"),
        })?;
        headers.insert("Client-Id", id_value);

        if let Some(token) = token {
            let mut auth_value =
                HeaderValue::from_str(&format!("OAuth {}", token.expose_secret())).map_err(
                    |e| Error::Authentication {
                        message: format!("invalid token header value: {e}"),
                    },
                )?;
            auth_value.set_sensitive(true);
            headers.insert(reqwest::header::AUTHORIZATION, auth_value);
        }

        Ok(Self {
            http: transport.build_client_with_headers(headers)?,
            endpoint: Url::parse(endpoint)?,
            authenticated: token.is_some(),
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(
        endpoint: &str,
        http: reqwest::Client,
        authenticated: bool,
    ) -> Result<Self, Error> {
        Ok(Self {
            http,
            endpoint: Url::parse(endpoint)?,
            authenticated,
        })
    }

    /// Whether requests carry a user token.
    pub fn has_token(&self) -> bool {
        self.authenticated
    }

    // ── Transport ────────────────────────────────────────────────────

    async fn query<T: DeserializeOwned>(
        &self,
        operation: &str,
        document: String,
        variables: Value,
    ) -> Result<T, Error> {
        debug!(operation, "POST {}", self.endpoint);

        let body = json!({
            "operationName": operation,
            "query": document,
            "variables": variables,
        });
        let resp = self
            .http
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: format!("{operation}: token rejected"),
            });
        }
        let raw = resp.text().await?;
        if !status.is_success() {
            let preview: String = raw.chars().take(200).collect();
            return Err(Error::Graph {
                messages: vec![format!("HTTP {status}: {preview}")],
            });
        }

        let envelope: GraphResponse<T> =
            serde_json::from_str(&raw).map_err(|e| Error::decode(&e, raw.clone()))?;

        let errors: Vec<String> = envelope
            .errors
            .unwrap_or_default()
            .into_iter()
            .map(|e| e.message.unwrap_or_else(|| "unknown error".into()))
            .collect();
        if !errors.is_empty() {
            return Err(Error::Graph { messages: errors });
        }

        envelope.data.ok_or_else(|| Error::Graph {
            messages: vec![format!("{operation}: response contained no data")],
        })
    }

    fn require_token(&self) -> Result<(), Error> {
        if self.authenticated {
            Ok(())
        } else {
            Err(Error::MissingToken { backend: "graph" })
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Streams ──────────────────────────────────────────────────────

    pub async fn top_streams(
        &self,
        first: u32,
        after: Option<&str>,
        tags: &[String],
        languages: &[String],
    ) -> Result<Connection<GraphStream>, Error> {
        let doc = queries::document(
            queries::TOP_STREAMS,
            &[queries::STREAM_FIELDS, queries::BROADCASTER_FIELDS],
        );
        let vars = json!({
            "first": first,
            "after": after,
            "tags": non_empty(tags),
            "languages": non_empty(languages),
        });
        let data: StreamsField = self.query("TopStreams", doc, vars).await?;
        Ok(data.streams.unwrap_or_else(Connection::empty))
    }

    pub async fn game_streams(
        &self,
        game: Selector<'_>,
        first: u32,
        after: Option<&str>,
        tags: &[String],
        languages: &[String],
    ) -> Result<Connection<GraphStream>, Error> {
        let doc = queries::document(
            queries::GAME_STREAMS,
            &[queries::STREAM_FIELDS, queries::BROADCASTER_FIELDS],
        );
        let (id, name) = game.split();
        let vars = json!({
            "id": id,
            "name": name,
            "first": first,
            "after": after,
            "tags": non_empty(tags),
            "languages": non_empty(languages),
        });
        let data: GameData<StreamsField> = self.query("GameStreams", doc, vars).await?;
        Ok(data
            .game
            .and_then(|g| g.streams)
            .unwrap_or_else(Connection::empty))
    }

    pub async fn search_streams(
        &self,
        query: &str,
        first: u32,
        after: Option<&str>,
    ) -> Result<Connection<GraphStream>, Error> {
        let doc = queries::document(
            queries::SEARCH_STREAMS,
            &[queries::STREAM_FIELDS, queries::BROADCASTER_FIELDS],
        );
        let vars = json!({ "query": query, "first": first, "after": after });
        let data: SearchStreamsData = self.query("SearchStreams", doc, vars).await?;
        Ok(data.search_streams.unwrap_or_else(Connection::empty))
    }

    // ── Follows (token required) ─────────────────────────────────────

    /// Live channels the token's user follows. Each node carries its `stream`.
    pub async fn followed_streams(
        &self,
        first: u32,
        after: Option<&str>,
    ) -> Result<Connection<GraphUser>, Error> {
        self.require_token()?;
        let doc = queries::document(queries::FOLLOWED_STREAMS, &[queries::USER_FIELDS]);
        let vars = json!({ "first": first, "after": after });
        let data: CurrentUserData<FollowedLiveField> =
            self.query("FollowedStreams", doc, vars).await?;
        Ok(data
            .current_user
            .and_then(|u| u.followed_live_users)
            .unwrap_or_else(Connection::empty))
    }

    pub async fn followed_channels(
        &self,
        first: u32,
        after: Option<&str>,
    ) -> Result<Connection<GraphUser>, Error> {
        self.require_token()?;
        let doc = queries::document(queries::FOLLOWED_CHANNELS, &[queries::USER_FIELDS]);
        let vars = json!({ "first": first, "after": after });
        let data: CurrentUserData<FollowsField> =
            self.query("FollowedChannels", doc, vars).await?;
        Ok(data
            .current_user
            .and_then(|u| u.follows)
            .unwrap_or_else(Connection::empty))
    }

    // ── Videos ───────────────────────────────────────────────────────

    pub async fn user_videos(
        &self,
        user: Selector<'_>,
        first: u32,
        after: Option<&str>,
        sort: Option<VideoSort>,
        types: &[String],
    ) -> Result<Connection<GraphVideo>, Error> {
        let doc = queries::document(
            queries::USER_VIDEOS,
            &[queries::VIDEO_FIELDS, queries::BROADCASTER_FIELDS],
        );
        let (id, login) = user.split();
        let vars = json!({
            "id": id,
            "login": login,
            "first": first,
            "after": after,
            "sort": sort.map(VideoSort::as_str),
            "types": non_empty(types),
        });
        let data: UserData<VideosField> = self.query("UserVideos", doc, vars).await?;
        Ok(data
            .user
            .and_then(|u| u.videos)
            .unwrap_or_else(Connection::empty))
    }

    pub async fn game_videos(
        &self,
        game: Selector<'_>,
        first: u32,
        after: Option<&str>,
        sort: Option<VideoSort>,
        types: &[String],
        languages: &[String],
    ) -> Result<Connection<GraphVideo>, Error> {
        let doc = queries::document(
            queries::GAME_VIDEOS,
            &[queries::VIDEO_FIELDS, queries::BROADCASTER_FIELDS],
        );
        let (id, name) = game.split();
        let vars = json!({
            "id": id,
            "name": name,
            "first": first,
            "after": after,
            "sort": sort.map(VideoSort::as_str),
            "types": non_empty(types),
            "languages": non_empty(languages),
        });
        let data: GameData<VideosField> = self.query("GameVideos", doc, vars).await?;
        Ok(data
            .game
            .and_then(|g| g.videos)
            .unwrap_or_else(Connection::empty))
    }

    // ── Clips ────────────────────────────────────────────────────────

    pub async fn user_clips(
        &self,
        user: Selector<'_>,
        first: u32,
        after: Option<&str>,
        period: Option<ClipPeriod>,
    ) -> Result<Connection<GraphClip>, Error> {
        let doc = queries::document(
            queries::USER_CLIPS,
            &[queries::CLIP_FIELDS, queries::BROADCASTER_FIELDS],
        );
        let (id, login) = user.split();
        let vars = json!({
            "id": id,
            "login": login,
            "first": first,
            "after": after,
            "period": period.map(ClipPeriod::as_str),
        });
        let data: UserData<ClipsField> = self.query("UserClips", doc, vars).await?;
        Ok(data
            .user
            .and_then(|u| u.clips)
            .unwrap_or_else(Connection::empty))
    }

    pub async fn game_clips(
        &self,
        game: Selector<'_>,
        first: u32,
        after: Option<&str>,
        period: Option<ClipPeriod>,
        languages: &[String],
    ) -> Result<Connection<GraphClip>, Error> {
        let doc = queries::document(
            queries::GAME_CLIPS,
            &[queries::CLIP_FIELDS, queries::BROADCASTER_FIELDS],
        );
        let (id, name) = game.split();
        let vars = json!({
            "id": id,
            "name": name,
            "first": first,
            "after": after,
            "period": period.map(ClipPeriod::as_str),
            "languages": non_empty(languages),
        });
        let data: GameData<ClipsField> = self.query("GameClips", doc, vars).await?;
        Ok(data
            .game
            .and_then(|g| g.clips)
            .unwrap_or_else(Connection::empty))
    }

    // ── Search ───────────────────────────────────────────────────────

    pub async fn search_channels(
        &self,
        query: &str,
        first: u32,
        after: Option<&str>,
    ) -> Result<Connection<GraphUser>, Error> {
        let doc = queries::document(queries::SEARCH_CHANNELS, &[queries::USER_FIELDS]);
        let vars = json!({ "query": query, "first": first, "after": after });
        let data: SearchUsersData = self.query("SearchChannels", doc, vars).await?;
        Ok(data.search_users.unwrap_or_else(Connection::empty))
    }

    // ── Lookups ──────────────────────────────────────────────────────

    /// Look up users by id. Unknown ids are dropped. More than
    /// [`MAX_USER_IDS`] ids is an error.
    pub async fn users(&self, ids: &[String]) -> Result<Vec<GraphUser>, Error> {
        if ids.len() > MAX_USER_IDS {
            return Err(Error::TooManyIds {
                count: ids.len(),
                max: MAX_USER_IDS,
            });
        }
        let doc = queries::document(queries::USERS, &[queries::USER_FIELDS]);
        let data: UsersData = self.query("Users", doc, json!({ "ids": ids })).await?;
        Ok(data.users.unwrap_or_default().into_iter().flatten().collect())
    }

    /// Tag catalog lookup. Unpaged: the backend returns up to `limit` tags.
    pub async fn tags(
        &self,
        kind: TagKind,
        query: Option<&str>,
        limit: u32,
    ) -> Result<Vec<GraphTag>, Error> {
        let vars = json!({ "tagType": kind.as_str(), "query": query, "limit": limit });
        let data: TagsData = self.query("Tags", queries::TAGS.to_owned(), vars).await?;
        Ok(data.tags.unwrap_or_default())
    }
}

fn non_empty(values: &[String]) -> Option<&[String]> {
    (!values.is_empty()).then_some(values)
}
