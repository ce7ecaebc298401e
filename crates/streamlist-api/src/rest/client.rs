// Hand-crafted async HTTP client for the REST catalog API.
//
// Auth: `Client-Id` header plus `Authorization: Bearer <token>`.
// Every endpoint requires a token; calls without one fail fast with
// `Error::MissingToken` instead of round-tripping a 401.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::types;
use crate::Error;
use crate::transport::TransportConfig;

/// Maximum ids accepted by the `users` and `games` lookups.
pub const MAX_LOOKUP_IDS: usize = 100;

// ── Error response shape from the REST API ──────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

// ── Query builders ──────────────────────────────────────────────────

/// Filters for `GET streams`.
#[derive(Debug, Clone, Default)]
pub struct StreamQuery {
    pub first: u32,
    pub after: Option<String>,
    pub game_ids: Vec<String>,
    pub user_ids: Vec<String>,
    pub user_logins: Vec<String>,
    pub languages: Vec<String>,
}

impl StreamQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = paging_params(self.first, self.after.as_deref());
        params.extend(self.game_ids.iter().map(|v| ("game_id", v.clone())));
        params.extend(self.user_ids.iter().map(|v| ("user_id", v.clone())));
        params.extend(self.user_logins.iter().map(|v| ("user_login", v.clone())));
        params.extend(self.languages.iter().map(|v| ("language", v.clone())));
        params
    }
}

/// Filters for `GET videos`. Exactly one of `user_id` / `game_id` is required.
#[derive(Debug, Clone, Default)]
pub struct VideoQuery {
    pub first: u32,
    pub after: Option<String>,
    pub user_id: Option<String>,
    pub game_id: Option<String>,
    pub language: Option<String>,
    /// `all`, `day`, `week`, or `month`.
    pub period: Option<String>,
    /// `time`, `trending`, or `views`.
    pub sort: Option<String>,
    /// `all`, `archive`, `highlight`, or `upload`.
    pub video_type: Option<String>,
}

impl VideoQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = paging_params(self.first, self.after.as_deref());
        push_opt(&mut params, "user_id", self.user_id.as_ref());
        push_opt(&mut params, "game_id", self.game_id.as_ref());
        push_opt(&mut params, "language", self.language.as_ref());
        push_opt(&mut params, "period", self.period.as_ref());
        push_opt(&mut params, "sort", self.sort.as_ref());
        push_opt(&mut params, "type", self.video_type.as_ref());
        params
    }
}

/// Filters for `GET clips`. Exactly one of `broadcaster_id` / `game_id` is required.
#[derive(Debug, Clone, Default)]
pub struct ClipQuery {
    pub first: u32,
    pub after: Option<String>,
    pub broadcaster_id: Option<String>,
    pub game_id: Option<String>,
    /// RFC 3339 lower bound.
    pub started_at: Option<String>,
    /// RFC 3339 upper bound.
    pub ended_at: Option<String>,
}

impl ClipQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = paging_params(self.first, self.after.as_deref());
        push_opt(&mut params, "broadcaster_id", self.broadcaster_id.as_ref());
        push_opt(&mut params, "game_id", self.game_id.as_ref());
        push_opt(&mut params, "started_at", self.started_at.as_ref());
        push_opt(&mut params, "ended_at", self.ended_at.as_ref());
        params
    }
}

fn paging_params(first: u32, after: Option<&str>) -> Vec<(&'static str, String)> {
    let mut params = vec![("first", first.clamp(1, 100).to_string())];
    if let Some(cursor) = after.filter(|c| !c.trim().is_empty()) {
        params.push(("after", cursor.to_owned()));
    }
    params
}

fn check_lookup_len(count: usize) -> Result<(), Error> {
    if count > MAX_LOOKUP_IDS {
        return Err(Error::TooManyIds {
            count,
            max: MAX_LOOKUP_IDS,
        });
    }
    Ok(())
}

fn lookup_params(key: &'static str, ids: &[String]) -> Result<Vec<(&'static str, String)>, Error> {
    check_lookup_len(ids.len())?;
    Ok(ids.iter().map(|id| (key, id.clone())).collect())
}

fn push_opt(params: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<&String>) {
    if let Some(v) = value {
        params.push((key, v.clone()));
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the REST catalog API.
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
    authenticated: bool,
}

impl RestClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a client id, an optional token, and a transport config.
    ///
    /// Injects `Client-Id` and (when a token is present) `Authorization`
    /// as default headers on every request.
    pub fn new(
        base_url: &str,
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
                HeaderValue::from_str(&format!("Bearer {}", token.expose_secret())).map_err(
                    |e| Error::Authentication {
                        message: format!("invalid token header value: {e}"),
                    },
                )?;
            auth_value.set_sensitive(true);
            headers.insert(reqwest::header::AUTHORIZATION, auth_value);
        }

        let http = transport.build_client_with_headers(headers)?;
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
            authenticated: token.is_some(),
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(
        base_url: &str,
        http: reqwest::Client,
        authenticated: bool,
    ) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
            authenticated,
        })
    }

    /// Whether requests carry an access token.
    pub fn has_token(&self) -> bool {
        self.authenticated
    }

    // ── HTTP plumbing ────────────────────────────────────────────────

    async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        if !self.authenticated {
            return Err(Error::MissingToken { backend: "rest" });
        }

        let url = self.base_url.join(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        handle_response(resp).await
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Streams ──────────────────────────────────────────────────────

    pub async fn get_streams(
        &self,
        query: &StreamQuery,
    ) -> Result<types::Page<types::StreamResponse>, Error> {
        check_lookup_len(query.user_ids.len() + query.user_logins.len())?;
        self.get_with_params("streams", &query.params()).await
    }

    pub async fn get_followed_streams(
        &self,
        user_id: &str,
        first: u32,
        after: Option<&str>,
    ) -> Result<types::Page<types::StreamResponse>, Error> {
        let mut params = paging_params(first, after);
        params.push(("user_id", user_id.to_owned()));
        self.get_with_params("streams/followed", &params).await
    }

    // ── Videos / clips ───────────────────────────────────────────────

    pub async fn get_videos(
        &self,
        query: &VideoQuery,
    ) -> Result<types::Page<types::VideoResponse>, Error> {
        self.get_with_params("videos", &query.params()).await
    }

    pub async fn get_clips(
        &self,
        query: &ClipQuery,
    ) -> Result<types::Page<types::ClipResponse>, Error> {
        self.get_with_params("clips", &query.params()).await
    }

    // ── Search ───────────────────────────────────────────────────────

    pub async fn search_channels(
        &self,
        query: &str,
        first: u32,
        after: Option<&str>,
        live_only: bool,
    ) -> Result<types::Page<types::ChannelSearchResponse>, Error> {
        let mut params = paging_params(first, after);
        params.push(("query", query.to_owned()));
        if live_only {
            params.push(("live_only", "true".into()));
        }
        self.get_with_params("search/channels", &params).await
    }

    // ── Follows ──────────────────────────────────────────────────────

    pub async fn get_followed_channels(
        &self,
        user_id: &str,
        first: u32,
        after: Option<&str>,
    ) -> Result<types::Page<types::FollowedChannelResponse>, Error> {
        let mut params = paging_params(first, after);
        params.push(("user_id", user_id.to_owned()));
        self.get_with_params("channels/followed", &params).await
    }

    // ── Lookups ──────────────────────────────────────────────────────

    /// Look up users by id. More than [`MAX_LOOKUP_IDS`] ids is an error.
    pub async fn get_users(&self, ids: &[String]) -> Result<Vec<types::UserResponse>, Error> {
        let params = lookup_params("id", ids)?;
        let page: types::Page<types::UserResponse> =
            self.get_with_params("users", &params).await?;
        Ok(page.data)
    }

    /// Look up games by id. More than [`MAX_LOOKUP_IDS`] ids is an error.
    pub async fn get_games(&self, ids: &[String]) -> Result<Vec<types::GameResponse>, Error> {
        let params = lookup_params("id", ids)?;
        let page: types::Page<types::GameResponse> =
            self.get_with_params("games", &params).await?;
        Ok(page.data)
    }
}

// ── Response handling ────────────────────────────────────────────────

fn normalize_base_url(raw: &str) -> Result<Url, Error> {
    let mut url = Url::parse(raw)?;
    let path = url.path().trim_end_matches('/').to_owned();
    url.set_path(&format!("{path}/"));
    Ok(url)
}

async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();
    if status.is_success() {
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| Error::decode(&e, body))
    } else {
        Err(parse_error(status, resp).await)
    }
}

async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        return Error::RateLimited { retry_after_secs };
    }

    let raw = resp.text().await.unwrap_or_default();
    let parsed = serde_json::from_str::<ErrorResponse>(&raw).ok();
    let message = parsed
        .and_then(|e| e.message.or(e.error))
        .unwrap_or_else(|| if raw.is_empty() { status.to_string() } else { raw });

    if status == reqwest::StatusCode::UNAUTHORIZED {
        Error::Authentication { message }
    } else {
        Error::Rest {
            status: status.as_u16(),
            message,
        }
    }
}
