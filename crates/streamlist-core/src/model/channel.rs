use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::media::GameRef;
use super::tag::Tag;

/// Identity and profile of a broadcaster, embedded in every channel-owned item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRef {
    pub id: Option<String>,
    pub login: Option<String>,
    pub display_name: Option<String>,
    pub profile_image_url: Option<String>,
}

impl ChannelRef {
    /// Channel id if known, else the lowercased login.
    pub fn merge_key(&self) -> Option<String> {
        self.id
            .clone()
            .or_else(|| self.login.as_ref().map(|l| l.to_lowercase()))
    }

    /// Fill empty profile fields from `other`. Populated fields are kept.
    pub fn fill_from(&mut self, other: &ChannelRef) {
        fill(&mut self.login, other.login.as_ref());
        fill(&mut self.display_name, other.display_name.as_ref());
        fill(&mut self.profile_image_url, other.profile_image_url.as_ref());
    }
}

fn fill(slot: &mut Option<String>, value: Option<&String>) {
    if slot.as_deref().is_none_or(str::is_empty) {
        if let Some(v) = value {
            *slot = Some(v.clone());
        }
    }
}

/// Current broadcast of a live channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveStatus {
    pub stream_id: Option<String>,
    pub title: Option<String>,
    pub viewer_count: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub game: Option<GameRef>,
    pub thumbnail_url: Option<String>,
}

/// A channel listing entry (search result or follow).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub channel: ChannelRef,
    pub description: Option<String>,
    pub followers: Option<u64>,
    /// `None` when offline or when status is unknown.
    pub live: Option<LiveStatus>,
    pub followed_at: Option<DateTime<Utc>>,
    pub tags: Vec<Tag>,
}
