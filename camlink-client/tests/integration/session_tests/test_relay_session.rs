use std::time::Duration;

use camlink_client::{
    CaptureConfig, CaptureSession, SessionConfig, SessionPhase, SyntheticCamera,
    TransportStrategy,
};
use tokio_util::sync::CancellationToken;

use crate::integration::init_tracing;
use crate::utils::{TestRelay, TestViewer};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_viewer_drives_record_and_upload() {
    init_tracing();

    let relay = TestRelay::start().await.expect("Failed to start relay");
    let mut viewer = TestViewer::connect(&relay.viewer_url())
        .await
        .expect("viewer connect");
    relay.wait_for_counts(0, 1).await.expect("viewer registered");

    let recordings = tempfile::tempdir().expect("tempdir");
    let mut config = SessionConfig::for_relay(&relay.camera_url(), TransportStrategy::Relay)
        .expect("session config");
    config.capture = CaptureConfig {
        fps: 30,
        width: 640,
        height: 360,
    };
    config.stream.target_fps = 10;
    config.recordings_dir = recordings.path().to_path_buf();

    let camera = SyntheticCamera::new(config.capture);
    let session = CaptureSession::new(config, Box::new(camera));
    let status = session.status();
    let shutdown = CancellationToken::new();
    let task = tokio::spawn(session.run(shutdown.clone()));

    viewer
        .wait_for_camera_status("waiting")
        .await
        .expect("camera announces itself");

    let frame = viewer.wait_for_frame().await.expect("live frame");
    let decoded = image::load_from_memory(&frame).expect("frame is a JPEG");
    assert_eq!((decoded.width(), decoded.height()), (640, 360));

    viewer.send_command("start").await.expect("send start");
    viewer
        .wait_for_camera_status("recording")
        .await
        .expect("recording status");

    tokio::time::sleep(Duration::from_millis(300)).await;

    viewer.send_command("stop").await.expect("send stop");
    viewer
        .wait_for_camera_status("uploading")
        .await
        .expect("uploading status");
    viewer
        .wait_for_camera_status("waiting")
        .await
        .expect("back to waiting");

    let stored = relay.stored_files();
    assert_eq!(stored.len(), 1);
    assert!(stored[0].ends_with(".mjpeg"));

    let leftovers = std::fs::read_dir(recordings.path()).expect("read dir").count();
    assert_eq!(leftovers, 0, "uploaded recording removed locally");

    {
        let current = status.borrow();
        assert_eq!(current.phase, SessionPhase::Waiting);
        assert_eq!(current.last_upload.as_deref(), Some(stored[0].as_str()));
    }

    shutdown.cancel();
    task.await.expect("join").expect("session ends cleanly");
    assert_eq!(status.borrow().phase, SessionPhase::Idle);
}
