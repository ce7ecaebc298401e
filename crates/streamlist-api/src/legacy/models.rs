// Legacy API response types
//
// Every field is optional and numbers may arrive as strings, so models use
// `#[serde(default)]` throughout with lenient deserializers. Undocumented
// fields land in `extra`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ── Response Envelope ────────────────────────────────────────────────

/// Raw legacy envelope: `{ "data": {...}, "errors": [...] }`.
#[derive(Debug, Deserialize)]
pub(crate) struct LegacyResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Option<Vec<LegacyErrorEntry>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LegacyErrorEntry {
    #[serde(default, deserialize_with = "loose_string")]
    pub message: Option<String>,
}

/// One page of a legacy listing after cursor normalization.
#[derive(Debug, Clone)]
pub struct LegacyPage<T> {
    pub items: Vec<T>,
    /// Last non-blank edge cursor, else the container's `cursor` field.
    pub cursor: Option<String>,
    /// `pageInfo.hasNextPage` (or a bare `hasNextPage`) when the backend sent one.
    pub has_next_page: Option<bool>,
}

impl<T> LegacyPage<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            cursor: None,
            has_next_page: Some(false),
        }
    }
}

// ── Nodes ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LegacyUser {
    #[serde(deserialize_with = "loose_string")]
    pub id: Option<String>,
    pub login: Option<String>,
    pub display_name: Option<String>,
    #[serde(rename = "profileImageURL")]
    pub profile_image_url: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LegacyGame {
    #[serde(deserialize_with = "loose_string")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub display_name: Option<String>,
    #[serde(rename = "boxArtURL")]
    pub box_art_url: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl LegacyGame {
    /// Display name if present, else the canonical name.
    pub fn label(&self) -> Option<&str> {
        self.display_name.as_deref().or(self.name.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LegacyTag {
    #[serde(deserialize_with = "loose_string")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub localized_name: Option<String>,
}

impl LegacyTag {
    pub fn label(&self) -> Option<&str> {
        self.localized_name.as_deref().or(self.name.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LegacyStream {
    #[serde(deserialize_with = "loose_string")]
    pub id: Option<String>,
    pub title: Option<String>,
    #[serde(deserialize_with = "loose_count")]
    pub viewers_count: Option<i64>,
    pub created_at: Option<String>,
    pub broadcaster_language: Option<String>,
    #[serde(rename = "previewImageURL")]
    pub preview_image_url: Option<String>,
    pub broadcaster: Option<LegacyUser>,
    pub game: Option<LegacyGame>,
    pub freeform_tags: Option<Vec<LegacyTag>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LegacyVideo {
    #[serde(deserialize_with = "loose_string")]
    pub id: Option<String>,
    pub title: Option<String>,
    #[serde(deserialize_with = "loose_count")]
    pub view_count: Option<i64>,
    #[serde(deserialize_with = "loose_count")]
    pub length_seconds: Option<i64>,
    pub published_at: Option<String>,
    pub broadcast_type: Option<String>,
    #[serde(rename = "previewThumbnailURL")]
    pub preview_thumbnail_url: Option<String>,
    pub owner: Option<LegacyUser>,
    pub game: Option<LegacyGame>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LegacyClip {
    #[serde(deserialize_with = "loose_string")]
    pub id: Option<String>,
    pub slug: Option<String>,
    pub title: Option<String>,
    #[serde(deserialize_with = "loose_count")]
    pub view_count: Option<i64>,
    pub duration_seconds: Option<f64>,
    pub created_at: Option<String>,
    #[serde(rename = "thumbnailURL")]
    pub thumbnail_url: Option<String>,
    #[serde(deserialize_with = "loose_count")]
    pub video_offset_seconds: Option<i64>,
    pub broadcaster: Option<LegacyUser>,
    pub game: Option<LegacyGame>,
    pub video: Option<LegacyVideoRef>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyVideoRef {
    #[serde(deserialize_with = "loose_string")]
    pub id: Option<String>,
}

/// Search result for a channel: the user plus an optional live stream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LegacyChannel {
    #[serde(deserialize_with = "loose_string")]
    pub id: Option<String>,
    pub login: Option<String>,
    pub display_name: Option<String>,
    #[serde(rename = "profileImageURL")]
    pub profile_image_url: Option<String>,
    pub description: Option<String>,
    pub followers: Option<LegacyCount>,
    pub stream: Option<LegacyStream>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LegacyCount {
    #[serde(deserialize_with = "loose_count")]
    pub total_count: Option<i64>,
}

// ── Lenient deserializers ────────────────────────────────────────────

/// Accepts a string or a number; anything else becomes `None`.
pub(crate) fn loose_string<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(de)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Accepts an integer, a float, or a numeric string.
#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
pub(crate) fn loose_count<'de, D>(de: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(de)? {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}
