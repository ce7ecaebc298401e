use serde::{Deserialize, Serialize};

use super::channel::{Channel, ChannelRef};
use super::media::{Clip, Stream, Video};
use super::tag::Tag;

/// One normalized listing entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Item {
    Stream(Stream),
    Video(Video),
    Clip(Clip),
    Channel(Channel),
    Tag(Tag),
}

impl Item {
    /// The item's own identity, if the backend provided one.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Stream(s) => s.id.as_deref(),
            Self::Video(v) => v.id.as_deref(),
            Self::Clip(c) => c.id.as_deref().or(c.slug.as_deref()),
            Self::Channel(c) => c.channel.id.as_deref(),
            Self::Tag(t) => t.id.as_deref(),
        }
    }

    /// Owning channel's id (or lowercased login), used to dedupe follows.
    pub fn merge_key(&self) -> Option<String> {
        self.channel().and_then(ChannelRef::merge_key)
    }

    /// Sort weight for merged listings. `None` sorts after every `Some`.
    pub fn popularity(&self) -> Option<u64> {
        match self {
            Self::Stream(s) => Some(s.viewer_count),
            Self::Video(v) => Some(v.view_count),
            Self::Clip(c) => Some(c.view_count),
            Self::Channel(c) => c.live.as_ref().map(|l| l.viewer_count),
            Self::Tag(_) => None,
        }
    }

    pub fn channel(&self) -> Option<&ChannelRef> {
        match self {
            Self::Stream(s) => Some(&s.channel),
            Self::Video(v) => Some(&v.channel),
            Self::Clip(c) => Some(&c.channel),
            Self::Channel(c) => Some(&c.channel),
            Self::Tag(_) => None,
        }
    }

    pub fn channel_mut(&mut self) -> Option<&mut ChannelRef> {
        match self {
            Self::Stream(s) => Some(&mut s.channel),
            Self::Video(v) => Some(&mut v.channel),
            Self::Clip(c) => Some(&mut c.channel),
            Self::Channel(c) => Some(&mut c.channel),
            Self::Tag(_) => None,
        }
    }
}

/// One page handed to the caller.
///
/// `next_key` is the index of the page a further `load_page` would return;
/// `None` together with `is_terminal` means the listing is finished.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Item>,
    pub next_key: Option<u32>,
    pub is_terminal: bool,
}

impl Page {
    /// Empty page that ends the listing.
    pub fn terminal() -> Self {
        Self {
            items: Vec::new(),
            next_key: None,
            is_terminal: true,
        }
    }

    /// Empty page that leaves the listing where it was (cancelled loads).
    pub fn abandoned() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LiveStatus;

    #[test]
    fn offline_channel_has_no_popularity() {
        let offline = Item::Channel(Channel::default());
        let live = Item::Channel(Channel {
            live: Some(LiveStatus {
                viewer_count: 3,
                ..LiveStatus::default()
            }),
            ..Channel::default()
        });
        assert_eq!(offline.popularity(), None);
        assert_eq!(live.popularity(), Some(3));
        assert!(Some(0) > None::<u64>);
    }

    #[test]
    fn clip_key_falls_back_to_slug() {
        let clip = Item::Clip(Clip {
            slug: Some("FunnyClipSlug".into()),
            ..Clip::default()
        });
        assert_eq!(clip.key(), Some("FunnyClipSlug"));
    }
}
