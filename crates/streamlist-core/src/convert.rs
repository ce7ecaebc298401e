// ── API-to-domain type conversions ──
//
// Bridges raw `streamlist_api` response types from all three backends into
// the canonical `streamlist_core::model` types. Missing counts and flags go
// through `streamlist_api::defaults` so each gap has one policy.

use chrono::{DateTime, Utc};

use streamlist_api::defaults;
use streamlist_api::graph::types::{
    GraphBroadcaster, GraphClip, GraphGame, GraphStream, GraphStreamSummary, GraphTag, GraphUser,
    GraphVideo,
};
use streamlist_api::legacy::models::{
    LegacyChannel, LegacyClip, LegacyGame, LegacyStream, LegacyTag, LegacyUser, LegacyVideo,
};
use streamlist_api::rest::types::{
    ChannelSearchResponse, ClipResponse, FollowedChannelResponse, GameResponse, StreamResponse,
    UserResponse, VideoResponse,
};

use crate::model::{
    Channel, ChannelRef, Clip, GameRef, LiveStatus, Stream, Tag, Video, VideoKind,
};

const THUMB_WIDTH: &str = "440";
const THUMB_HEIGHT: &str = "248";

// ── Helpers ────────────────────────────────────────────────────────

/// Parse an RFC 3339 timestamp, dropping unparseable values.
pub(crate) fn parse_datetime(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse a REST duration such as `"1h2m33s"` into seconds.
pub(crate) fn parse_duration(raw: &str) -> Option<u64> {
    let mut total = 0u64;
    let mut digits = String::new();
    for ch in raw.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        let value: u64 = digits.parse().ok()?;
        digits.clear();
        let unit = match ch {
            'h' => 3600,
            'm' => 60,
            's' => 1,
            _ => return None,
        };
        total = total.checked_add(value.checked_mul(unit)?)?;
    }
    digits.is_empty().then_some(total)
}

/// Fill the size placeholders REST thumbnail templates carry.
fn sized_thumbnail(raw: Option<String>) -> Option<String> {
    raw.filter(|u| !u.is_empty()).map(|u| {
        u.replace("%{width}", THUMB_WIDTH)
            .replace("%{height}", THUMB_HEIGHT)
            .replace("{width}", THUMB_WIDTH)
            .replace("{height}", THUMB_HEIGHT)
    })
}

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.filter(|s| !s.trim().is_empty())
}

fn offset(raw: Option<i64>) -> Option<u64> {
    raw.and_then(|n| u64::try_from(n).ok())
}

fn game_ref(id: Option<String>, name: Option<String>) -> Option<GameRef> {
    let id = non_blank(id);
    let name = non_blank(name);
    (id.is_some() || name.is_some()).then_some(GameRef {
        id,
        name,
        box_art_url: None,
    })
}

fn named_tags(names: Option<Vec<String>>) -> Vec<Tag> {
    names
        .unwrap_or_default()
        .into_iter()
        .map(|name| Tag {
            id: None,
            name: Some(name),
        })
        .collect()
}

// ━━ REST ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

impl From<StreamResponse> for Stream {
    fn from(s: StreamResponse) -> Self {
        Stream {
            id: Some(s.id),
            channel: ChannelRef {
                id: Some(s.user_id),
                login: s.user_login,
                display_name: s.user_name,
                profile_image_url: None,
            },
            title: s.title,
            game: game_ref(s.game_id, s.game_name),
            viewer_count: defaults::count(s.viewer_count),
            started_at: parse_datetime(s.started_at.as_deref()),
            thumbnail_url: sized_thumbnail(s.thumbnail_url),
            language: s.language,
            tags: named_tags(s.tags),
        }
    }
}

impl From<VideoResponse> for Video {
    fn from(v: VideoResponse) -> Self {
        Video {
            id: Some(v.id),
            channel: ChannelRef {
                id: Some(v.user_id),
                login: v.user_login,
                display_name: v.user_name,
                profile_image_url: None,
            },
            title: v.title,
            game: None,
            view_count: defaults::count(v.view_count),
            duration_secs: v.duration.as_deref().and_then(parse_duration),
            created_at: parse_datetime(v.created_at.as_deref()),
            thumbnail_url: sized_thumbnail(v.thumbnail_url),
            kind: VideoKind::from_backend(v.video_type.as_deref()),
            tags: Vec::new(),
        }
    }
}

impl From<ClipResponse> for Clip {
    fn from(c: ClipResponse) -> Self {
        Clip {
            id: Some(c.id.clone()),
            slug: Some(c.id),
            channel: ChannelRef {
                id: Some(c.broadcaster_id),
                login: None,
                display_name: c.broadcaster_name,
                profile_image_url: None,
            },
            title: c.title,
            game: game_ref(c.game_id, None),
            view_count: defaults::count(c.view_count),
            duration_secs: c.duration,
            created_at: parse_datetime(c.created_at.as_deref()),
            thumbnail_url: non_blank(c.thumbnail_url),
            video_id: non_blank(c.video_id),
            video_offset_secs: offset(c.vod_offset),
        }
    }
}

impl From<UserResponse> for ChannelRef {
    fn from(u: UserResponse) -> Self {
        ChannelRef {
            id: Some(u.id),
            login: Some(u.login),
            display_name: u.display_name,
            profile_image_url: non_blank(u.profile_image_url),
        }
    }
}

impl From<GameResponse> for GameRef {
    fn from(g: GameResponse) -> Self {
        GameRef {
            id: Some(g.id),
            name: Some(g.name),
            box_art_url: sized_thumbnail(g.box_art_url),
        }
    }
}

impl From<ChannelSearchResponse> for Channel {
    fn from(c: ChannelSearchResponse) -> Self {
        let live = c.is_live.then(|| LiveStatus {
            stream_id: None,
            title: c.title.clone(),
            viewer_count: defaults::MISSING_COUNT,
            started_at: parse_datetime(c.started_at.as_deref()),
            game: game_ref(c.game_id.clone(), c.game_name.clone()),
            thumbnail_url: None,
        });
        Channel {
            channel: ChannelRef {
                id: Some(c.id),
                login: Some(c.broadcaster_login),
                display_name: c.display_name,
                profile_image_url: non_blank(c.thumbnail_url),
            },
            description: None,
            followers: None,
            live,
            followed_at: None,
            tags: named_tags(c.tags),
        }
    }
}

impl From<FollowedChannelResponse> for Channel {
    fn from(f: FollowedChannelResponse) -> Self {
        Channel {
            channel: ChannelRef {
                id: Some(f.broadcaster_id),
                login: f.broadcaster_login,
                display_name: f.broadcaster_name,
                profile_image_url: None,
            },
            followed_at: parse_datetime(f.followed_at.as_deref()),
            ..Channel::default()
        }
    }
}

// ━━ Graph ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

impl From<GraphBroadcaster> for ChannelRef {
    fn from(b: GraphBroadcaster) -> Self {
        ChannelRef {
            id: b.id,
            login: b.login,
            display_name: b.display_name,
            profile_image_url: non_blank(b.profile_image_url),
        }
    }
}

impl From<GraphGame> for GameRef {
    fn from(g: GraphGame) -> Self {
        GameRef {
            id: g.id,
            name: g.display_name,
            box_art_url: g.box_art_url,
        }
    }
}

impl From<GraphTag> for Tag {
    fn from(t: GraphTag) -> Self {
        Tag {
            id: t.id,
            name: t.name,
        }
    }
}

impl From<GraphStream> for Stream {
    fn from(s: GraphStream) -> Self {
        Stream {
            id: s.id,
            channel: s.broadcaster.map(ChannelRef::from).unwrap_or_default(),
            title: s.title,
            game: s.game.map(GameRef::from),
            viewer_count: defaults::count(s.viewers_count),
            started_at: parse_datetime(s.created_at.as_deref()),
            thumbnail_url: s.preview_image_url,
            language: s.broadcaster_language,
            tags: s
                .freeform_tags
                .unwrap_or_default()
                .into_iter()
                .map(Tag::from)
                .collect(),
        }
    }
}

impl From<GraphStreamSummary> for LiveStatus {
    fn from(s: GraphStreamSummary) -> Self {
        LiveStatus {
            stream_id: s.id,
            title: s.title,
            viewer_count: defaults::count(s.viewers_count),
            started_at: parse_datetime(s.created_at.as_deref()),
            game: s.game.map(GameRef::from),
            thumbnail_url: s.preview_image_url,
        }
    }
}

fn graph_user_ref(u: &GraphUser) -> ChannelRef {
    ChannelRef {
        id: u.id.clone(),
        login: u.login.clone(),
        display_name: u.display_name.clone(),
        profile_image_url: non_blank(u.profile_image_url.clone()),
    }
}

impl From<&GraphUser> for ChannelRef {
    fn from(u: &GraphUser) -> Self {
        graph_user_ref(u)
    }
}

impl From<GraphUser> for Channel {
    fn from(u: GraphUser) -> Self {
        let channel = graph_user_ref(&u);
        Channel {
            channel,
            description: u.description,
            followers: u.followers.map(|f| defaults::count(f.total_count)),
            live: u.stream.map(LiveStatus::from),
            followed_at: None,
            tags: Vec::new(),
        }
    }
}

/// A followed user's live stream. `None` when the user is offline.
pub(crate) fn graph_user_stream(u: GraphUser) -> Option<Stream> {
    let channel = graph_user_ref(&u);
    let live = u.stream?;
    Some(Stream {
        id: live.id,
        channel,
        title: live.title,
        game: live.game.map(GameRef::from),
        viewer_count: defaults::count(live.viewers_count),
        started_at: parse_datetime(live.created_at.as_deref()),
        thumbnail_url: live.preview_image_url,
        language: None,
        tags: Vec::new(),
    })
}

impl From<GraphVideo> for Video {
    fn from(v: GraphVideo) -> Self {
        Video {
            id: v.id,
            channel: v.owner.map(ChannelRef::from).unwrap_or_default(),
            title: v.title,
            game: v.game.map(GameRef::from),
            view_count: defaults::count(v.view_count),
            duration_secs: offset(v.length_seconds),
            created_at: parse_datetime(v.created_at.as_deref()),
            thumbnail_url: non_blank(v.preview_thumbnail_url),
            kind: VideoKind::from_backend(v.broadcast_type.as_deref()),
            tags: v
                .content_tags
                .unwrap_or_default()
                .into_iter()
                .map(Tag::from)
                .collect(),
        }
    }
}

impl From<GraphClip> for Clip {
    fn from(c: GraphClip) -> Self {
        Clip {
            id: c.id,
            slug: c.slug,
            channel: c.broadcaster.map(ChannelRef::from).unwrap_or_default(),
            title: c.title,
            game: c.game.map(GameRef::from),
            view_count: defaults::count(c.view_count),
            duration_secs: c.duration_seconds,
            created_at: parse_datetime(c.created_at.as_deref()),
            thumbnail_url: non_blank(c.thumbnail_url),
            video_id: c.video.and_then(|v| v.id),
            video_offset_secs: offset(c.video_offset_seconds),
        }
    }
}

// ━━ Legacy ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

impl From<LegacyUser> for ChannelRef {
    fn from(u: LegacyUser) -> Self {
        ChannelRef {
            id: u.id,
            login: u.login,
            display_name: u.display_name,
            profile_image_url: non_blank(u.profile_image_url),
        }
    }
}

impl From<LegacyGame> for GameRef {
    fn from(g: LegacyGame) -> Self {
        GameRef {
            name: g.label().map(str::to_owned),
            id: g.id,
            box_art_url: g.box_art_url,
        }
    }
}

impl From<LegacyTag> for Tag {
    fn from(t: LegacyTag) -> Self {
        Tag {
            name: t.label().map(str::to_owned),
            id: t.id,
        }
    }
}

impl From<LegacyStream> for Stream {
    fn from(s: LegacyStream) -> Self {
        Stream {
            id: s.id,
            channel: s.broadcaster.map(ChannelRef::from).unwrap_or_default(),
            title: s.title,
            game: s.game.map(GameRef::from),
            viewer_count: defaults::count(s.viewers_count),
            started_at: parse_datetime(s.created_at.as_deref()),
            thumbnail_url: non_blank(s.preview_image_url),
            language: s.broadcaster_language,
            tags: s
                .freeform_tags
                .unwrap_or_default()
                .into_iter()
                .map(Tag::from)
                .collect(),
        }
    }
}

impl From<LegacyVideo> for Video {
    fn from(v: LegacyVideo) -> Self {
        Video {
            id: v.id,
            channel: v.owner.map(ChannelRef::from).unwrap_or_default(),
            title: v.title,
            game: v.game.map(GameRef::from),
            view_count: defaults::count(v.view_count),
            duration_secs: offset(v.length_seconds),
            created_at: parse_datetime(v.published_at.as_deref()),
            thumbnail_url: non_blank(v.preview_thumbnail_url),
            kind: VideoKind::from_backend(v.broadcast_type.as_deref()),
            tags: Vec::new(),
        }
    }
}

impl From<LegacyClip> for Clip {
    fn from(c: LegacyClip) -> Self {
        Clip {
            id: c.id,
            slug: c.slug,
            channel: c.broadcaster.map(ChannelRef::from).unwrap_or_default(),
            title: c.title,
            game: c.game.map(GameRef::from),
            view_count: defaults::count(c.view_count),
            duration_secs: c.duration_seconds,
            created_at: parse_datetime(c.created_at.as_deref()),
            thumbnail_url: non_blank(c.thumbnail_url),
            video_id: c.video.and_then(|v| v.id),
            video_offset_secs: offset(c.video_offset_seconds),
        }
    }
}

impl From<LegacyChannel> for Channel {
    fn from(c: LegacyChannel) -> Self {
        let live = c.stream.map(|s| LiveStatus {
            stream_id: s.id,
            title: s.title,
            viewer_count: defaults::count(s.viewers_count),
            started_at: parse_datetime(s.created_at.as_deref()),
            game: s.game.map(GameRef::from),
            thumbnail_url: non_blank(s.preview_image_url),
        });
        Channel {
            channel: ChannelRef {
                id: c.id,
                login: c.login,
                display_name: c.display_name,
                profile_image_url: non_blank(c.profile_image_url),
            },
            description: c.description,
            followers: c.followers.map(|f| defaults::count(f.total_count)),
            live,
            followed_at: None,
            tags: Vec::new(),
        }
    }
}
