use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::channel::{ChannelRef, LiveStatus};
use super::tag::Tag;

/// A game/category reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRef {
    pub id: Option<String>,
    pub name: Option<String>,
    pub box_art_url: Option<String>,
}

/// A live broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stream {
    pub id: Option<String>,
    pub channel: ChannelRef,
    pub title: Option<String>,
    pub game: Option<GameRef>,
    pub viewer_count: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub thumbnail_url: Option<String>,
    pub language: Option<String>,
    pub tags: Vec<Tag>,
}

impl Stream {
    /// This broadcast as the live status of its channel.
    pub fn live_status(&self) -> LiveStatus {
        LiveStatus {
            stream_id: self.id.clone(),
            title: self.title.clone(),
            viewer_count: self.viewer_count,
            started_at: self.started_at,
            game: self.game.clone(),
            thumbnail_url: self.thumbnail_url.clone(),
        }
    }
}

/// Kind of recorded video.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum VideoKind {
    Archive,
    Highlight,
    Upload,
    #[default]
    Unknown,
}

impl VideoKind {
    /// Parse a backend type string; unrecognized values map to `Unknown`.
    pub fn from_backend(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

/// A recorded broadcast, highlight or upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub id: Option<String>,
    pub channel: ChannelRef,
    pub title: Option<String>,
    pub game: Option<GameRef>,
    pub view_count: u64,
    pub duration_secs: Option<u64>,
    pub created_at: Option<DateTime<Utc>>,
    pub thumbnail_url: Option<String>,
    pub kind: VideoKind,
    pub tags: Vec<Tag>,
}

/// A short clip cut from a broadcast.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub id: Option<String>,
    pub slug: Option<String>,
    pub channel: ChannelRef,
    pub title: Option<String>,
    pub game: Option<GameRef>,
    pub view_count: u64,
    pub duration_secs: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
    pub thumbnail_url: Option<String>,
    pub video_id: Option<String>,
    pub video_offset_secs: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_kind_parses_any_case() {
        assert_eq!(VideoKind::from_backend(Some("ARCHIVE")), VideoKind::Archive);
        assert_eq!(VideoKind::from_backend(Some("highlight")), VideoKind::Highlight);
        assert_eq!(VideoKind::from_backend(Some("premiere")), VideoKind::Unknown);
        assert_eq!(VideoKind::from_backend(None), VideoKind::Unknown);
    }
}
