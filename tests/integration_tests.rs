//! Integration tests for comic_poster library
//!
//! These tests verify the public API and the full fetch-and-post cycle
//! over mocked xkcd and VK servers.

use httpmock::prelude::*;
use tempfile::tempdir;

use comic_poster::{
    commands::post,
    config::{VK_API_URL, VK_API_VERSION, XKCD_URL},
    Error, VkClient, XkcdClient,
};

// ============================================================================
// Config Tests
// ============================================================================

#[test]
fn test_api_constants() {
    assert_eq!(XKCD_URL, "https://xkcd.com");
    assert_eq!(VK_API_URL, "https://api.vk.com");
    assert_eq!(VK_API_VERSION, "5.124");
}

// ============================================================================
// Error Tests
// ============================================================================

#[test]
fn test_error_variants_display() {
    let errors = vec![
        Error::Transport("HTTP 500".into()),
        Error::Vk("User authorization failed".into()),
        Error::MalformedResponse("нет поля response".into()),
        Error::InvalidArgument("VK_GROUP_ID не задан".into()),
    ];

    for err in errors {
        assert!(!err.to_string().is_empty());
    }
}

#[test]
fn test_error_from_io() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "нет файла");
    let err: Error = io_err.into();
    assert!(matches!(err, Error::Io(_)));
}

// ============================================================================
// Client Construction Tests
// ============================================================================

#[test]
fn test_clients_with_custom_base_url() {
    assert!(XkcdClient::with_base_url("http://127.0.0.1:1").is_ok());
    assert!(VkClient::with_base_url("token", "http://127.0.0.1:1").is_ok());
    assert!(VkClient::new("").is_err());
}

// ============================================================================
// End-to-end Scenarios
// ============================================================================

fn mock_xkcd_comic(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET).path("/info.0.json");
        then.status(200).json_body(serde_json::json!({ "num": 1 }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/1/info.0.json");
        then.status(200).json_body(serde_json::json!({
            "img": server.url("/comics/1.png"),
            "alt": "caption1"
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/comics/1.png");
        then.status(200).body("ABC");
    });
}

#[tokio::test]
async fn full_cycle_publishes_comic_and_removes_artifact() {
    let xkcd_server = MockServer::start_async().await;
    let vk_server = MockServer::start_async().await;

    mock_xkcd_comic(&xkcd_server);

    let upload_server_mock = vk_server.mock(|when, then| {
        when.method(GET)
            .path("/method/photos.getWallUploadServer")
            .query_param("group_id", "123")
            .query_param("access_token", "test-token")
            .query_param("v", VK_API_VERSION);
        then.status(200).json_body(serde_json::json!({
            "response": { "upload_url": vk_server.url("/upload") }
        }));
    });
    let upload_mock = vk_server.mock(|when, then| {
        when.method(POST).path("/upload").is_true(|req| {
            let body = String::from_utf8_lossy(req.body().as_ref());
            body.contains("name=\"photo\"") && body.contains("ABC")
        });
        then.status(200).json_body(serde_json::json!({
            "server": 42, "photo": "payload", "hash": "abc123"
        }));
    });
    let save_mock = vk_server.mock(|when, then| {
        when.method(POST).path("/method/photos.saveWallPhoto");
        then.status(200).json_body(serde_json::json!({
            "response": [ { "id": 777, "owner_id": -123 } ]
        }));
    });
    let post_mock = vk_server.mock(|when, then| {
        when.method(POST)
            .path("/method/wall.post")
            .query_param("owner_id", "-123")
            .query_param("attachments", "photo-123_777")
            .query_param("message", "caption1")
            .query_param("from_group", "1");
        then.status(200)
            .json_body(serde_json::json!({ "response": { "post_id": 1 } }));
    });

    let xkcd = XkcdClient::with_base_url(xkcd_server.base_url()).expect("xkcd client");
    let vk = VkClient::with_base_url("test-token", vk_server.base_url()).expect("vk client");
    let dir = tempdir().expect("tempdir");

    post::run_with_clients(&xkcd, &vk, 123, dir.path())
        .await
        .expect("run");

    upload_server_mock.assert_calls(1);
    upload_mock.assert_calls(1);
    save_mock.assert_calls(1);
    post_mock.assert_calls(1);

    // Картинка удалена после публикации.
    assert_eq!(std::fs::read_dir(dir.path()).expect("read dir").count(), 0);
}

#[tokio::test]
async fn fetch_failure_skips_vk_entirely() {
    let xkcd_server = MockServer::start_async().await;
    let vk_server = MockServer::start_async().await;

    xkcd_server.mock(|when, then| {
        when.method(GET).path("/info.0.json");
        then.status(500);
    });
    let upload_server_mock = vk_server.mock(|when, then| {
        when.method(GET).path("/method/photos.getWallUploadServer");
        then.status(200).json_body(serde_json::json!({
            "response": { "upload_url": vk_server.url("/upload") }
        }));
    });

    let xkcd = XkcdClient::with_base_url(xkcd_server.base_url()).expect("xkcd client");
    let vk = VkClient::with_base_url("test-token", vk_server.base_url()).expect("vk client");
    let dir = tempdir().expect("tempdir");

    post::run_with_clients(&xkcd, &vk, 123, dir.path())
        .await
        .expect("run");

    upload_server_mock.assert_calls(0);
    // Картинка не скачивалась, удалять нечего.
    assert_eq!(std::fs::read_dir(dir.path()).expect("read dir").count(), 0);
}

#[tokio::test]
async fn vk_error_is_reported_and_artifact_still_removed() {
    let xkcd_server = MockServer::start_async().await;
    let vk_server = MockServer::start_async().await;

    mock_xkcd_comic(&xkcd_server);

    let upload_server_mock = vk_server.mock(|when, then| {
        when.method(GET).path("/method/photos.getWallUploadServer");
        then.status(200).json_body(serde_json::json!({
            "error": { "error_code": 5, "error_msg": "User authorization failed" }
        }));
    });
    let upload_mock = vk_server.mock(|when, then| {
        when.method(POST).path("/upload");
        then.status(200).json_body(serde_json::json!({
            "server": 42, "photo": "payload", "hash": "abc123"
        }));
    });

    let xkcd = XkcdClient::with_base_url(xkcd_server.base_url()).expect("xkcd client");
    let vk = VkClient::with_base_url("test-token", vk_server.base_url()).expect("vk client");
    let dir = tempdir().expect("tempdir");

    post::run_with_clients(&xkcd, &vk, 123, dir.path())
        .await
        .expect("run");

    upload_server_mock.assert_calls(1);
    upload_mock.assert_calls(0);
    assert_eq!(std::fs::read_dir(dir.path()).expect("read dir").count(), 0);
}
