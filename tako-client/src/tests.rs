use crate::{CastAttachments, FeedSource, ReplySink, TakoApiClient, TakoClient};
use serde_json::json;
use takotako_core::{CoreError, FeedStatus, ReplyStatus, TakoApiError, TakoConfig};
use wiremock::matchers::{
    body_json, header, method, path, query_param, query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_config(base_url: &str) -> TakoConfig {
    TakoConfig {
        api_key: "test_api_key".to_string(),
        base_url: base_url.to_string(),
    }
}

fn feed_body() -> serde_json::Value {
    json!({
        "status": "success",
        "data": {
            "items": [
                {
                    "hash": "0xaaa",
                    "text": "just ran 1km, marathon next",
                    "created_at": 1739666249,
                    "author": { "fid": 13475, "display_name": "runner" }
                },
                {
                    "hash": "0xbbb",
                    "text": "slept four hours",
                    "created_at": 1739666000,
                    "author": { "fid": 10636, "display_name": "owl" }
                }
            ]
        }
    })
}

#[tokio::test]
async fn test_following_feed_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed/follow"))
        .and(header("x-api-key", "test_api_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(feed_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = TakoClient::new(create_test_config(&server.uri())).unwrap();
    let feed = client.fetch_following_feed().await.unwrap();

    assert!(feed.is_success());
    assert_eq!(feed.items.len(), 2);
    assert_eq!(feed.items[0].id, "0xaaa");
    assert_eq!(feed.items[0].author_display_name, "runner");
    assert_eq!(feed.items[1].created_at, 1739666000);
}

#[tokio::test]
async fn test_following_feed_keeps_good_casts_next_to_bad_ones() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed/follow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": {
                "items": [
                    {
                        "hash": "0xgood",
                        "text": "gm",
                        "created_at": 1739666249,
                        "author": { "fid": 1, "display_name": "early bird" }
                    },
                    {
                        "hash": "0ximg",
                        "text": null,
                        "created_at": 1739666200,
                        "author": { "fid": 2, "display_name": null }
                    },
                    {
                        "hash": "0xbroken",
                        "text": "who wrote this"
                    }
                ]
            }
        })))
        .mount(&server)
        .await;

    let client = TakoClient::new(create_test_config(&server.uri())).unwrap();
    let feed = client.fetch_following_feed().await.unwrap();

    assert!(feed.is_success());
    assert_eq!(feed.items.len(), 2);
    assert_eq!(feed.items[0].id, "0xgood");
    assert_eq!(feed.items[0].text, "gm");
    assert_eq!(feed.items[1].id, "0ximg");
    assert_eq!(feed.items[1].text, "");
    assert_eq!(feed.items[1].author_display_name, "");
}

#[tokio::test]
async fn test_following_feed_non_success_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed/follow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "failure", "message": "quota" })),
        )
        .mount(&server)
        .await;

    let client = TakoClient::new(create_test_config(&server.uri())).unwrap();
    let feed = client.fetch_following_feed().await.unwrap();

    assert!(!feed.is_success());
    assert!(feed.items.is_empty());
    assert_eq!(
        feed.status,
        FeedStatus::Failure {
            payload: "quota".to_string()
        }
    );
}

#[tokio::test]
async fn test_unauthorized_maps_to_invalid_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed/follow"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = TakoClient::new(create_test_config(&server.uri())).unwrap();
    let result = client.fetch_following_feed().await;

    assert!(matches!(
        result,
        Err(CoreError::TakoApi(TakoApiError::InvalidApiKey))
    ));
}

#[tokio::test]
async fn test_rate_limit_reads_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cast/reply"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "42"))
        .mount(&server)
        .await;

    let client = TakoClient::new(create_test_config(&server.uri())).unwrap();
    let result = client.post_reply("0xaaa", "nice").await;

    match result {
        Err(CoreError::TakoApi(TakoApiError::RateLimitExceeded { retry_after })) => {
            assert_eq!(retry_after, 42)
        }
        other => panic!("Expected rate limit error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_mapping() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed/follow"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = TakoClient::new(create_test_config(&server.uri())).unwrap();
    let result = client.fetch_following_feed().await;

    assert!(matches!(
        result,
        Err(CoreError::TakoApi(TakoApiError::ServerError { status_code: 503 }))
    ));
}

#[tokio::test]
async fn test_garbage_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed/follow"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = TakoClient::new(create_test_config(&server.uri())).unwrap();
    let result = client.fetch_following_feed().await;

    assert!(matches!(
        result,
        Err(CoreError::TakoApi(TakoApiError::InvalidResponse { .. }))
    ));
}

#[tokio::test]
async fn test_post_reply_sends_cast_hash_and_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cast/reply"))
        .and(header("x-api-key", "test_api_key"))
        .and(body_json(json!({
            "cast_hash": "0xaaa",
            "text": "marathon of one lap",
            "mentions": null,
            "mentions_positions": null,
            "urls": null
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = TakoClient::new(create_test_config(&server.uri())).unwrap();
    let status = client
        .post_reply("0xaaa", "marathon of one lap")
        .await
        .unwrap();

    assert_eq!(status, ReplyStatus::Success);
}

#[tokio::test]
async fn test_reply_to_cast_with_attachments() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cast/reply"))
        .and(body_json(json!({
            "cast_hash": "0xaaa",
            "text": "look @owl",
            "mentions": [10636],
            "mentions_positions": [5],
            "urls": null
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
        .expect(1)
        .mount(&server)
        .await;

    let api = TakoApiClient::new(&create_test_config(&server.uri())).unwrap();
    let attachments = CastAttachments {
        mentions: Some(vec![10636]),
        mentions_positions: Some(vec![5]),
        urls: None,
    };
    let envelope = api
        .reply_to_cast("0xaaa", "look @owl", &attachments)
        .await
        .unwrap();

    assert!(envelope.is_success());
}

#[tokio::test]
async fn test_post_reply_rejected_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cast/reply"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "error" })))
        .mount(&server)
        .await;

    let client = TakoClient::new(create_test_config(&server.uri())).unwrap();
    let status = client.post_reply("0xaaa", "nice").await.unwrap();

    assert_eq!(status, ReplyStatus::Failure);
}

#[tokio::test]
async fn test_feed_by_fids_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed/cast"))
        .and(query_param("target_type", "fid"))
        .and(query_param("target_ids", "13475,10636"))
        .and(query_param("cursor", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(feed_body()))
        .expect(1)
        .mount(&server)
        .await;

    let api = TakoApiClient::new(&create_test_config(&server.uri())).unwrap();
    let envelope = api.get_feed_by_fids(&[13475, 10636], Some(20)).await.unwrap();

    assert!(envelope.is_success());
    assert_eq!(envelope.data.unwrap().items.len(), 2);
}

#[tokio::test]
async fn test_zero_cursor_is_left_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed/cast"))
        .and(query_param("target_type", "fid"))
        .and(query_param_is_missing("cursor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(feed_body()))
        .expect(1)
        .mount(&server)
        .await;

    let api = TakoApiClient::new(&create_test_config(&server.uri())).unwrap();
    let envelope = api.get_feed_by_fids(&[13475], Some(0)).await.unwrap();

    assert!(envelope.is_success());
}

#[tokio::test]
async fn test_feed_by_communities_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed/cast"))
        .and(query_param("target_type", "community"))
        .and(query_param("target_ids", "tako,farcaster"))
        .respond_with(ResponseTemplate::new(200).set_body_json(feed_body()))
        .expect(1)
        .mount(&server)
        .await;

    let api = TakoApiClient::new(&create_test_config(&server.uri())).unwrap();
    let envelope = api
        .get_feed_by_communities(&["tako", "farcaster"], None)
        .await
        .unwrap();

    assert!(envelope.is_success());
}

#[tokio::test]
async fn test_create_cast_requires_text_or_title() {
    let api = TakoApiClient::new(&create_test_config("http://127.0.0.1:9")).unwrap();
    let result = api
        .create_cast(None, Some(""), None, &CastAttachments::default())
        .await;

    assert!(matches!(result, Err(CoreError::InvalidInput { .. })));
}

#[tokio::test]
async fn test_create_cast_posts_full_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cast"))
        .and(body_json(json!({
            "text": "Test cast from API",
            "title": "",
            "community_id": "",
            "mentions": [],
            "mentions_positions": [],
            "urls": []
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
        .expect(1)
        .mount(&server)
        .await;

    let api = TakoApiClient::new(&create_test_config(&server.uri())).unwrap();
    let envelope = api
        .create_cast(
            Some("Test cast from API"),
            None,
            None,
            &CastAttachments::default(),
        )
        .await
        .unwrap();

    assert!(envelope.is_success());
}

#[tokio::test]
async fn test_create_cast_forwards_attachments() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cast"))
        .and(body_json(json!({
            "text": "",
            "title": "weekly roast",
            "community_id": "tako",
            "mentions": [],
            "mentions_positions": [],
            "urls": ["https://example.com/image.jpg"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
        .expect(1)
        .mount(&server)
        .await;

    let api = TakoApiClient::new(&create_test_config(&server.uri())).unwrap();
    let attachments = CastAttachments {
        urls: Some(vec!["https://example.com/image.jpg".to_string()]),
        ..Default::default()
    };
    let envelope = api
        .create_cast(None, Some("weekly roast"), Some("tako"), &attachments)
        .await
        .unwrap();

    assert!(envelope.is_success());
}

#[tokio::test]
async fn test_image_upload_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/image_upload_url"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": { "url": "https://upload.tako.so/abc" }
        })))
        .mount(&server)
        .await;

    let api = TakoApiClient::new(&create_test_config(&server.uri())).unwrap();
    let url = api.get_image_upload_url().await.unwrap();

    assert_eq!(url, "https://upload.tako.so/abc");
}
