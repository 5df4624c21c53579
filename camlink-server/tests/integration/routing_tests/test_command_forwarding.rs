use crate::integration::{camera_and_viewer, init_tracing};

#[tokio::test]
async fn test_viewer_start_command_reaches_camera() {
    init_tracing();

    let (_relay, mut camera, mut viewer) = camera_and_viewer().await.expect("setup");

    viewer
        .send_text(r#"{"command":"start"}"#)
        .await
        .expect("send command");

    assert_eq!(
        camera.recv_text().await.expect("camera receives command"),
        r#"{"command":"start"}"#
    );
    assert!(viewer.is_silent().await);
}

#[tokio::test]
async fn test_camera_command_is_dropped() {
    init_tracing();

    let (_relay, mut camera, mut viewer) = camera_and_viewer().await.expect("setup");

    camera
        .send_text(r#"{"command":"stop"}"#)
        .await
        .expect("send command");

    assert!(viewer.is_silent().await);
}

#[tokio::test]
async fn test_garbage_keeps_connection_open() {
    init_tracing();

    let (_relay, mut camera, mut viewer) = camera_and_viewer().await.expect("setup");

    viewer.send_text("not json").await.expect("send noise");
    viewer.send_text(r#"{"hello":1}"#).await.expect("send unknown");
    viewer
        .send_text(r#"{"command":"stop"}"#)
        .await
        .expect("send command after noise");

    assert_eq!(
        camera.recv_text().await.expect("command still routed"),
        r#"{"command":"stop"}"#
    );
}
