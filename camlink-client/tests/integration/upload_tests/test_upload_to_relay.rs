use std::sync::{Arc, Mutex};

use camlink_client::upload::ProgressCallback;
use camlink_client::{UploadConfig, UploadCoordinator, UploadProgress};
use tokio_util::sync::CancellationToken;

use crate::integration::init_tracing;
use crate::utils::TestRelay;

#[tokio::test]
async fn test_upload_stores_on_relay_and_deletes_local_file() {
    init_tracing();

    let relay = TestRelay::start().await.expect("Failed to start relay");
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("clip.mov");
    std::fs::write(&path, vec![3u8; 100_000]).expect("write recording");

    let seen: Arc<Mutex<Vec<UploadProgress>>> = Arc::default();
    let sink = seen.clone();
    let on_progress: ProgressCallback = Arc::new(move |p| sink.lock().unwrap().push(p));

    let coordinator = UploadCoordinator::new(UploadConfig::new(relay.upload_url()));
    let report = coordinator
        .upload(&path, &CancellationToken::new(), Some(on_progress))
        .await
        .expect("upload succeeds");

    assert_eq!(report.attempts, 1);
    assert_eq!(report.bytes, 100_000);
    assert!(!path.exists(), "local file removed after success");

    let stored = report.stored_as.expect("server filename");
    assert!(stored.starts_with("video_") && stored.ends_with(".mov"));
    assert_eq!(relay.stored_files(), vec![stored]);

    let seen = seen.lock().unwrap();
    let last = seen.last().expect("progress reported");
    assert_eq!(last.bytes_sent, 100_000);
    assert_eq!(last.total, 100_000);
}
