use crate::integration::{camera_and_viewer, init_tracing};

#[tokio::test]
async fn test_disconnect_removes_endpoint() {
    init_tracing();

    let (relay, camera, mut viewer) = camera_and_viewer().await.expect("setup");

    drop(camera);
    relay
        .wait_for_counts(0, 1)
        .await
        .expect("camera removed after disconnect");

    // The remaining viewer connection is unaffected.
    let status = relay.status().await.expect("status");
    assert_eq!(status["viewers"], 1);
    assert!(viewer.is_silent().await);
}
