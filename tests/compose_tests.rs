//! Compose bridge client tests against a mock SDK endpoint.

use serde_json::json;
use voicecaster::compose::{ComposeSdk, FarcasterClient};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn ready_reflects_bridge_availability() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ready"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = FarcasterClient::new(&server.uri()).unwrap();
    assert!(client.ready().await);
}

#[tokio::test]
async fn unreachable_bridge_is_not_ready() {
    // Port from a dropped listener; nothing is listening there.
    let client = FarcasterClient::new("http://127.0.0.1:1").unwrap();
    assert!(!client.ready().await);
}

#[tokio::test]
async fn context_yields_viewer_profile() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/context"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {
                "display_name": "Ada Lovelace",
                "username": "ada",
                "avatar_url": "https://x/a.png"
            }
        })))
        .mount(&server)
        .await;

    let client = FarcasterClient::new(&server.uri()).unwrap();
    let profile = client.context().await.unwrap();
    assert_eq!(profile.display_name.as_deref(), Some("Ada Lovelace"));
    assert_eq!(profile.username.as_deref(), Some("ada"));
}

#[tokio::test]
async fn context_tolerates_missing_profile_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/context"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": { "username": "ada" }
        })))
        .mount(&server)
        .await;

    let client = FarcasterClient::new(&server.uri()).unwrap();
    let profile = client.context().await.unwrap();
    assert!(profile.display_name.is_none());
    assert_eq!(profile.attribution().as_deref(), Some("@ada"));
}

#[tokio::test]
async fn compose_cast_posts_text_and_embeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/compose-cast"))
        .and(body_json(json!({
            "text": "Voice message",
            "embeds": ["https://voicecaster.xyz/api/audio/preview/1?audio=x"]
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = FarcasterClient::new(&server.uri()).unwrap();
    client
        .compose_cast(
            "Voice message",
            &["https://voicecaster.xyz/api/audio/preview/1?audio=x".to_string()],
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn compose_cast_rejection_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/compose-cast"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = FarcasterClient::new(&server.uri()).unwrap();
    let result = client.compose_cast("hi", &[]).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn share_file_uploads_the_blob() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/share-file"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = FarcasterClient::new(&server.uri()).unwrap();
    client
        .share_file("voice-video-1.avi", "Voice message", &[1, 2, 3])
        .await
        .unwrap();
}
