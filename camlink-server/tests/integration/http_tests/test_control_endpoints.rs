use crate::integration::{camera_and_viewer, init_tracing};

#[tokio::test]
async fn test_control_start_and_stop_broadcast_to_cameras() {
    init_tracing();

    let (relay, mut camera, mut viewer) = camera_and_viewer().await.expect("setup");
    let client = reqwest::Client::new();

    let body: serde_json::Value = client
        .post(relay.http_url("/control/start"))
        .send()
        .await
        .expect("POST start")
        .json()
        .await
        .expect("json body");
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Start command sent");
    assert_eq!(
        camera.recv_text().await.expect("start"),
        r#"{"command":"start"}"#
    );

    let body: serde_json::Value = client
        .post(relay.http_url("/control/stop"))
        .send()
        .await
        .expect("POST stop")
        .json()
        .await
        .expect("json body");
    assert_eq!(body["message"], "Stop command sent");
    assert_eq!(
        camera.recv_text().await.expect("stop"),
        r#"{"command":"stop"}"#
    );

    assert!(viewer.is_silent().await);
}

#[tokio::test]
async fn test_status_reports_counts() {
    init_tracing();

    let (relay, _camera, _viewer) = camera_and_viewer().await.expect("setup");

    let status = relay.status().await.expect("status");
    assert_eq!(status["cameras"], 1);
    assert_eq!(status["viewers"], 1);
    assert!(status["timestamp"].as_i64().expect("timestamp") > 0);
}
