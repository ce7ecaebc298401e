// Typed query-graph response types
//
// Every listing is a connection. `pageInfo` may be missing entirely on some
// fields, in which case `hasNextPage` falls back to the named default policy.

use serde::Deserialize;

use crate::defaults;

// ── Envelope ────────────────────────────────────────────────────────

/// `{ "data": {...}, "errors": [{ "message": "..." }] }`
#[derive(Debug, Deserialize)]
pub(crate) struct GraphResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Option<Vec<GraphErrorEntry>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphErrorEntry {
    #[serde(default)]
    pub message: Option<String>,
}

// ── Connections ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    #[serde(default = "Vec::new")]
    pub edges: Vec<Edge<T>>,
    #[serde(default)]
    pub page_info: Option<PageInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge<T> {
    #[serde(default)]
    pub cursor: Option<String>,
    pub node: Option<T>,
    /// Only present on follow edges.
    #[serde(default)]
    pub followed_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub has_next_page: Option<bool>,
}

impl<T> Connection<T> {
    /// A connection with no edges and no further pages.
    pub fn empty() -> Self {
        Self {
            edges: Vec::new(),
            page_info: Some(PageInfo {
                has_next_page: Some(false),
            }),
        }
    }

    /// Cursor of the last edge, or `None` when absent or blank.
    pub fn last_cursor(&self) -> Option<String> {
        defaults::cursor(self.edges.last().and_then(|e| e.cursor.clone()))
    }

    /// Explicit next-page flag, defaulted when the backend omits it.
    pub fn has_next_page(&self) -> bool {
        defaults::has_next_page(self.page_info.as_ref().and_then(|p| p.has_next_page))
    }

    /// Drop edges without a node and return the nodes in order.
    pub fn into_nodes(self) -> Vec<T> {
        self.edges.into_iter().filter_map(|e| e.node).collect()
    }
}

// ── Nodes ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphBroadcaster {
    pub id: Option<String>,
    pub login: Option<String>,
    pub display_name: Option<String>,
    #[serde(rename = "profileImageURL")]
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphGame {
    pub id: Option<String>,
    pub display_name: Option<String>,
    #[serde(rename = "boxArtURL")]
    pub box_art_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphTag {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStream {
    pub id: Option<String>,
    pub title: Option<String>,
    pub viewers_count: Option<i64>,
    pub created_at: Option<String>,
    pub broadcaster_language: Option<String>,
    #[serde(rename = "previewImageURL")]
    pub preview_image_url: Option<String>,
    pub broadcaster: Option<GraphBroadcaster>,
    pub game: Option<GraphGame>,
    pub freeform_tags: Option<Vec<GraphTag>>,
}

/// Live stream summary nested under a user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStreamSummary {
    pub id: Option<String>,
    pub title: Option<String>,
    pub viewers_count: Option<i64>,
    pub created_at: Option<String>,
    #[serde(rename = "previewImageURL")]
    pub preview_image_url: Option<String>,
    pub game: Option<GraphGame>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphCount {
    pub total_count: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphUser {
    pub id: Option<String>,
    pub login: Option<String>,
    pub display_name: Option<String>,
    #[serde(rename = "profileImageURL")]
    pub profile_image_url: Option<String>,
    pub description: Option<String>,
    pub followers: Option<GraphCount>,
    pub stream: Option<GraphStreamSummary>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphVideo {
    pub id: Option<String>,
    pub title: Option<String>,
    pub view_count: Option<i64>,
    pub length_seconds: Option<i64>,
    pub created_at: Option<String>,
    /// `ARCHIVE`, `HIGHLIGHT`, or `UPLOAD`.
    pub broadcast_type: Option<String>,
    #[serde(rename = "previewThumbnailURL")]
    pub preview_thumbnail_url: Option<String>,
    pub owner: Option<GraphBroadcaster>,
    pub game: Option<GraphGame>,
    pub content_tags: Option<Vec<GraphTag>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphVideoRef {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphClip {
    pub id: Option<String>,
    pub slug: Option<String>,
    pub title: Option<String>,
    pub view_count: Option<i64>,
    pub duration_seconds: Option<f64>,
    pub created_at: Option<String>,
    #[serde(rename = "thumbnailURL")]
    pub thumbnail_url: Option<String>,
    pub video_offset_seconds: Option<i64>,
    pub broadcaster: Option<GraphBroadcaster>,
    pub game: Option<GraphGame>,
    pub video: Option<GraphVideoRef>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_page_info_defaults_to_more_pages() {
        let conn: Connection<GraphTag> =
            serde_json::from_str(r#"{"edges":[{"cursor":"c1","node":{"id":"1"}}]}"#).unwrap();
        assert!(conn.has_next_page());
        assert_eq!(conn.last_cursor().as_deref(), Some("c1"));
    }

    #[test]
    fn explicit_false_is_respected() {
        let conn: Connection<GraphTag> = serde_json::from_str(
            r#"{"edges":[{"cursor":"c1","node":null}],"pageInfo":{"hasNextPage":false}}"#,
        )
        .unwrap();
        assert!(!conn.has_next_page());
        assert!(conn.into_nodes().is_empty());
    }

    #[test]
    fn empty_connection_is_terminal() {
        let conn: Connection<GraphTag> = Connection::empty();
        assert!(!conn.has_next_page());
        assert_eq!(conn.last_cursor(), None);
    }
}
