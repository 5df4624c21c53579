use reqwest::multipart::{Form, Part};

use crate::integration::init_tracing;
use crate::utils::TestRelay;

#[tokio::test]
async fn test_upload_then_list_then_download() {
    init_tracing();

    let relay = TestRelay::start().await.expect("Failed to start relay");
    let client = reqwest::Client::new();
    let payload = vec![7u8; 4096];

    let form = Form::new().part(
        "video",
        Part::bytes(payload.clone())
            .file_name("clip.mp4")
            .mime_str("video/mp4")
            .expect("mime"),
    );
    let body: serde_json::Value = client
        .post(relay.http_url("/upload"))
        .multipart(form)
        .send()
        .await
        .expect("POST upload")
        .error_for_status()
        .expect("2xx")
        .json()
        .await
        .expect("json body");

    assert_eq!(body["success"], true);
    assert_eq!(body["size"], 4096);
    let filename = body["filename"].as_str().expect("filename").to_owned();
    assert!(filename.starts_with("video_") && filename.ends_with(".mp4"));
    assert_eq!(body["path"], format!("/uploads/{filename}"));
    assert!(relay.upload_dir.path().join(&filename).exists());

    let list: serde_json::Value = client
        .get(relay.http_url("/videos"))
        .send()
        .await
        .expect("GET videos")
        .json()
        .await
        .expect("json body");
    assert_eq!(list["success"], true);
    assert_eq!(list["videos"][0]["filename"], filename.as_str());
    assert_eq!(list["videos"][0]["size"], 4096);

    let downloaded = client
        .get(relay.http_url(&format!("/uploads/{filename}")))
        .send()
        .await
        .expect("GET upload")
        .bytes()
        .await
        .expect("bytes");
    assert_eq!(downloaded.as_ref(), payload.as_slice());
}

#[tokio::test]
async fn test_upload_without_video_field_is_rejected() {
    init_tracing();

    let relay = TestRelay::start().await.expect("Failed to start relay");

    let form = Form::new().text("note", "no file here");
    let response = reqwest::Client::new()
        .post(relay.http_url("/upload"))
        .multipart(form)
        .send()
        .await
        .expect("POST upload");

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.expect("json body");
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "No file uploaded");
}

#[tokio::test]
async fn test_listing_skips_non_recordings() {
    init_tracing();

    let relay = TestRelay::start().await.expect("Failed to start relay");
    std::fs::write(relay.upload_dir.path().join("readme.txt"), b"x").expect("write");
    std::fs::write(relay.upload_dir.path().join("a.mov"), b"abc").expect("write");

    let list: serde_json::Value = reqwest::get(relay.http_url("/videos"))
        .await
        .expect("GET videos")
        .json()
        .await
        .expect("json body");

    let videos = list["videos"].as_array().expect("array");
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0]["filename"], "a.mov");
}
