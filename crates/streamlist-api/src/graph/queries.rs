// Query documents sent by `GraphClient`.

pub(super) const BROADCASTER_FIELDS: &str =
    "fragment Broadcaster on User { id login displayName profileImageURL(width: 300) }";

pub(super) const STREAM_FIELDS: &str = "fragment StreamFields on Stream { \
    id title viewersCount createdAt type broadcasterLanguage \
    previewImageURL(width: 440, height: 248) \
    broadcaster { ...Broadcaster } \
    game { id displayName boxArtURL(width: 285, height: 380) } \
    freeformTags { id name } }";

pub(super) const VIDEO_FIELDS: &str = "fragment VideoFields on Video { \
    id title viewCount lengthSeconds createdAt broadcastType \
    previewThumbnailURL(width: 320, height: 180) \
    owner { ...Broadcaster } \
    game { id displayName boxArtURL(width: 285, height: 380) } \
    contentTags { id name: localizedName } }";

pub(super) const CLIP_FIELDS: &str = "fragment ClipFields on Clip { \
    id slug title viewCount durationSeconds createdAt thumbnailURL videoOffsetSeconds \
    broadcaster { ...Broadcaster } \
    game { id displayName boxArtURL(width: 285, height: 380) } \
    video { id } }";

pub(super) const USER_FIELDS: &str = "fragment UserFields on User { \
    id login displayName profileImageURL(width: 300) description \
    followers { totalCount } \
    stream { id title viewersCount createdAt previewImageURL(width: 440, height: 248) \
        game { id displayName boxArtURL(width: 285, height: 380) } } }";

pub(super) const TOP_STREAMS: &str = "query TopStreams($first: Int, $after: Cursor, $tags: [String!], $languages: [Language!]) { \
    streams(first: $first, after: $after, options: { freeformTags: $tags, broadcasterLanguages: $languages }) { \
        edges { cursor node { ...StreamFields } } pageInfo { hasNextPage } } }";

pub(super) const GAME_STREAMS: &str = "query GameStreams($id: ID, $name: String, $first: Int, $after: Cursor, $tags: [String!], $languages: [Language!]) { \
    game(id: $id, name: $name) { \
        streams(first: $first, after: $after, options: { freeformTags: $tags, broadcasterLanguages: $languages }) { \
            edges { cursor node { ...StreamFields } } pageInfo { hasNextPage } } } }";

pub(super) const FOLLOWED_STREAMS: &str = "query FollowedStreams($first: Int, $after: Cursor) { \
    currentUser { followedLiveUsers(first: $first, after: $after) { \
        edges { cursor node { ...UserFields } } pageInfo { hasNextPage } } } }";

pub(super) const FOLLOWED_CHANNELS: &str = "query FollowedChannels($first: Int, $after: Cursor) { \
    currentUser { follows(first: $first, after: $after, order: DESC) { \
        edges { cursor followedAt node { ...UserFields } } pageInfo { hasNextPage } } } }";

pub(super) const USER_VIDEOS: &str = "query UserVideos($id: ID, $login: String, $first: Int, $after: Cursor, $sort: VideoSort, $types: [BroadcastType!]) { \
    user(id: $id, login: $login) { \
        videos(first: $first, after: $after, sort: $sort, types: $types) { \
            edges { cursor node { ...VideoFields } } pageInfo { hasNextPage } } } }";

pub(super) const GAME_VIDEOS: &str = "query GameVideos($id: ID, $name: String, $first: Int, $after: Cursor, $sort: VideoSort, $types: [BroadcastType!], $languages: [String!]) { \
    game(id: $id, name: $name) { \
        videos(first: $first, after: $after, sort: $sort, types: $types, languages: $languages) { \
            edges { cursor node { ...VideoFields } } pageInfo { hasNextPage } } } }";

pub(super) const USER_CLIPS: &str = "query UserClips($id: ID, $login: String, $first: Int, $after: Cursor, $period: ClipsPeriod) { \
    user(id: $id, login: $login) { \
        clips(first: $first, after: $after, criteria: { period: $period }) { \
            edges { cursor node { ...ClipFields } } pageInfo { hasNextPage } } } }";

pub(super) const GAME_CLIPS: &str = "query GameClips($id: ID, $name: String, $first: Int, $after: Cursor, $period: ClipsPeriod, $languages: [Language!]) { \
    game(id: $id, name: $name) { \
        clips(first: $first, after: $after, criteria: { period: $period, languages: $languages }) { \
            edges { cursor node { ...ClipFields } } pageInfo { hasNextPage } } } }";

pub(super) const SEARCH_CHANNELS: &str = "query SearchChannels($query: String!, $first: Int, $after: Cursor) { \
    searchUsers(userQuery: $query, first: $first, after: $after) { \
        edges { cursor node { ...UserFields } } pageInfo { hasNextPage } } }";

pub(super) const SEARCH_STREAMS: &str = "query SearchStreams($query: String!, $first: Int, $after: Cursor) { \
    searchStreams(userQuery: $query, first: $first, after: $after) { \
        edges { cursor node { ...StreamFields } } pageInfo { hasNextPage } } }";

pub(super) const USERS: &str = "query Users($ids: [ID!]) { users(ids: $ids) { ...UserFields } }";

pub(super) const TAGS: &str = "query Tags($tagType: TagType!, $query: String, $limit: Int) { \
    tags(tagType: $tagType, userQuery: $query, limit: $limit) { id name: localizedName } }";

/// Append the fragments a document references.
pub(super) fn document(query: &str, fragments: &[&str]) -> String {
    let mut doc = String::from(query);
    for fragment in fragments {
        doc.push(' ');
        doc.push_str(fragment);
    }
    doc
}
