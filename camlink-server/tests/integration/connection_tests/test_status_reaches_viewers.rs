use crate::integration::{camera_and_viewer, init_tracing};

#[tokio::test]
async fn test_waiting_status_reaches_viewer_as_camera_status() {
    init_tracing();

    let (_relay, mut camera, mut viewer) = camera_and_viewer().await.expect("setup");

    camera
        .send_text(r#"{"type":"status","status":"waiting","timestamp":1700000000.5}"#)
        .await
        .expect("send status");

    let msg = viewer.recv_json().await.expect("viewer receives status");
    assert_eq!(msg["type"], "camera_status");
    assert_eq!(msg["status"], "waiting");
    assert!(msg["cameraId"].is_u64());

    assert!(camera.is_silent().await, "camera must not see its own status");
}

#[tokio::test]
async fn test_viewer_status_is_not_forwarded() {
    init_tracing();

    let (_relay, mut camera, mut viewer) = camera_and_viewer().await.expect("setup");

    viewer
        .send_text(r#"{"status":"watching"}"#)
        .await
        .expect("send status");

    assert!(camera.is_silent().await);
}
