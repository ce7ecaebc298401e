// Integration tests for `LegacyClient` using wiremock.

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use streamlist_api::graph::TagKind;
use streamlist_api::{Error, LegacyClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, LegacyClient) {
    let server = MockServer::start().await;
    let endpoint = format!("{}/gql", server.uri());
    let client = LegacyClient::with_client(reqwest::Client::new(), &endpoint).unwrap();
    (server, client)
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_game_streams_lowercases_name() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/gql"))
        .and(body_partial_json(json!({
            "operationName": "DirectoryPage_Game",
            "variables": { "name": "just chatting", "limit": 30 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "game": { "streams": { "edges": [
                { "cursor": "30", "node": {
                    "id": 123,
                    "viewersCount": "4500",
                    "broadcaster": { "id": "u1", "login": "alpha" },
                    "game": { "name": "Just Chatting" }
                } }
            ] } } }
        })))
        .mount(&server)
        .await;

    let page = client
        .game_streams("Just Chatting", 30, None, &[], &[])
        .await
        .unwrap();

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id.as_deref(), Some("123"));
    assert_eq!(page.items[0].viewers_count, Some(4500));
    assert_eq!(page.cursor.as_deref(), Some("30"));
    assert_eq!(page.has_next_page, None);
}

#[tokio::test]
async fn test_search_channels_items_shape() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/gql"))
        .and(body_partial_json(json!({
            "operationName": "SearchResultsPage_SearchResults",
            "variables": { "query": "speed" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "searchFor": { "channels": {
                "items": [
                    { "id": "1", "login": "speedy", "followers": { "totalCount": "12" },
                      "stream": { "id": "s1", "viewersCount": 80 } }
                ],
                "cursor": "next-1",
                "pageInfo": { "hasNextPage": true }
            } } }
        })))
        .mount(&server)
        .await;

    let page = client.search_channels("speed", 20, None).await.unwrap();

    assert_eq!(page.items[0].login.as_deref(), Some("speedy"));
    assert_eq!(
        page.items[0].followers.as_ref().and_then(|f| f.total_count),
        Some(12)
    );
    assert_eq!(page.cursor.as_deref(), Some("next-1"));
    assert_eq!(page.has_next_page, Some(true));
}

#[tokio::test]
async fn test_search_tags_bare_array() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/gql"))
        .and(body_partial_json(json!({ "operationName": "SearchFreeformTags" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "searchFreeformTags": [
                { "id": "a", "name": "english", "localizedName": "English" },
                null
            ] }
        })))
        .mount(&server)
        .await;

    let tags = client
        .search_tags(TagKind::Stream, Some("eng"), 25)
        .await
        .unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].label(), Some("English"));
}

// ── Error-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_errors_array_is_legacy_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/gql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [ { "message": "PersistedQueryNotFound" } ]
        })))
        .mount(&server)
        .await;

    let err = client.top_streams(20, None, &[], &[]).await.unwrap_err();
    match err {
        Error::Legacy { message } => assert_eq!(message, "PersistedQueryNotFound"),
        other => panic!("expected Legacy error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_is_legacy_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/gql"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client
        .channel_clips("alpha", 20, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Legacy { .. }));
}
