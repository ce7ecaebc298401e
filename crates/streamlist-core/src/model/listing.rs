use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::media::VideoKind;
use super::tag::TagCatalog;

/// Every listing a session can page through.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum ListingKind {
    TopStreams,
    GameStreams,
    FollowedStreams,
    FollowedChannels,
    ChannelVideos,
    GameVideos,
    ChannelClips,
    GameClips,
    SearchChannels,
    SearchStreams,
    CategoryTags,
    StreamTags,
    SearchTags,
}

impl ListingKind {
    /// Listings that merge the local follow set on their first page.
    pub fn is_followed(self) -> bool {
        matches!(self, Self::FollowedStreams | Self::FollowedChannels)
    }

    pub fn is_tags(self) -> bool {
        matches!(self, Self::CategoryTags | Self::StreamTags | Self::SearchTags)
    }

    /// The global catalog a tag listing reads, given its filter.
    pub fn tag_catalog(self, filter: &ListingFilter) -> Option<TagCatalog> {
        match self {
            Self::CategoryTags => Some(TagCatalog::Category),
            Self::StreamTags => Some(TagCatalog::Stream),
            Self::SearchTags => Some(filter.tag_catalog.unwrap_or(TagCatalog::Stream)),
            _ => None,
        }
    }
}

/// Ordering for video listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum VideoSort {
    Time,
    Views,
}

/// Time window for clip listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum ClipPeriod {
    Day,
    Week,
    Month,
    All,
}

/// Narrowing parameters for a listing. Which fields matter depends on the
/// [`ListingKind`]; providers declare what they can honour via `supports`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingFilter {
    pub game_id: Option<String>,
    pub game_name: Option<String>,
    pub channel_id: Option<String>,
    pub channel_login: Option<String>,
    pub query: Option<String>,
    pub languages: Vec<String>,
    /// Free-form tag names.
    pub tags: Vec<String>,
    pub video_kind: Option<VideoKind>,
    pub video_sort: Option<VideoSort>,
    pub clip_period: Option<ClipPeriod>,
    /// Catalog searched by `SearchTags`; stream tags when unset.
    pub tag_catalog: Option<TagCatalog>,
    /// Account whose follows are listed. Falls back to the configured account.
    pub user_id: Option<String>,
}

impl ListingFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_game_id(mut self, id: impl Into<String>) -> Self {
        self.game_id = Some(id.into());
        self
    }

    pub fn with_game_name(mut self, name: impl Into<String>) -> Self {
        self.game_name = Some(name.into());
        self
    }

    pub fn with_channel_id(mut self, id: impl Into<String>) -> Self {
        self.channel_id = Some(id.into());
        self
    }

    pub fn with_channel_login(mut self, login: impl Into<String>) -> Self {
        self.channel_login = Some(login.into());
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_video_kind(mut self, kind: VideoKind) -> Self {
        self.video_kind = Some(kind);
        self
    }

    pub fn with_video_sort(mut self, sort: VideoSort) -> Self {
        self.video_sort = Some(sort);
        self
    }

    pub fn with_clip_period(mut self, period: ClipPeriod) -> Self {
        self.clip_period = Some(period);
        self
    }

    pub fn with_tag_catalog(mut self, catalog: TagCatalog) -> Self {
        self.tag_catalog = Some(catalog);
        self
    }

    pub fn with_user_id(mut self, id: impl Into<String>) -> Self {
        self.user_id = Some(id.into());
        self
    }

    /// The search query, if present and non-blank.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    pub fn has_game(&self) -> bool {
        self.game_id.is_some() || self.game_name.is_some()
    }

    pub fn has_channel(&self) -> bool {
        self.channel_id.is_some() || self.channel_login.is_some()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn listing_kind_parses_snake_case() {
        assert_eq!(
            "followed_streams".parse::<ListingKind>().unwrap(),
            ListingKind::FollowedStreams
        );
        assert_eq!(ListingKind::GameClips.to_string(), "game_clips");
    }

    #[test]
    fn blank_query_is_no_query() {
        let filter = ListingFilter::new().with_query("   ");
        assert_eq!(filter.query(), None);
        assert_eq!(ListingFilter::new().with_query(" fps ").query(), Some("fps"));
    }

    #[test]
    fn search_tags_defaults_to_stream_catalog() {
        let filter = ListingFilter::new();
        assert_eq!(
            ListingKind::SearchTags.tag_catalog(&filter),
            Some(TagCatalog::Stream)
        );
        let category = filter.with_tag_catalog(TagCatalog::Category);
        assert_eq!(
            ListingKind::SearchTags.tag_catalog(&category),
            Some(TagCatalog::Category)
        );
        assert_eq!(ListingKind::TopStreams.tag_catalog(&category), None);
    }
}
