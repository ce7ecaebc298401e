// REST API response types
//
// Shapes returned by the REST API. Only the fields the catalog needs are
// modelled; unknown fields are ignored by serde.

use serde::Deserialize;

// ── Pagination ──────────────────────────────────────────────────────

/// Standard REST list page.
///
/// ```json
/// { "data": [...], "pagination": { "cursor": "eyJi..." } }
/// ```
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub cursor: Option<String>,
}

impl<T> Page<T> {
    /// The trailing cursor, or `None` when absent or blank.
    pub fn cursor(&self) -> Option<String> {
        crate::defaults::cursor(self.pagination.as_ref().and_then(|p| p.cursor.clone()))
    }
}

// ── Streams ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct StreamResponse {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub user_login: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub game_id: Option<String>,
    #[serde(default)]
    pub game_name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub viewer_count: Option<i64>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

// ── Videos ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct VideoResponse {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub user_login: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub view_count: Option<i64>,
    /// Human duration, e.g. `"1h2m33s"`.
    #[serde(default)]
    pub duration: Option<String>,
    /// `archive`, `highlight`, or `upload`.
    #[serde(default, rename = "type")]
    pub video_type: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

// ── Clips ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ClipResponse {
    pub id: String,
    pub broadcaster_id: String,
    #[serde(default)]
    pub broadcaster_name: Option<String>,
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub game_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub view_count: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub vod_offset: Option<i64>,
}

// ── Users / games ───────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub login: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameResponse {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub box_art_url: Option<String>,
}

// ── Search / follows ────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelSearchResponse {
    pub id: String,
    pub broadcaster_login: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub is_live: bool,
    #[serde(default)]
    pub game_id: Option<String>,
    #[serde(default)]
    pub game_name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FollowedChannelResponse {
    pub broadcaster_id: String,
    #[serde(default)]
    pub broadcaster_login: Option<String>,
    #[serde(default)]
    pub broadcaster_name: Option<String>,
    #[serde(default)]
    pub followed_at: Option<String>,
}
