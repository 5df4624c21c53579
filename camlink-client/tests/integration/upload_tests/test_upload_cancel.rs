use std::time::Duration;

use camlink_client::{UploadConfig, UploadCoordinator, UploadError};

use crate::integration::init_tracing;
use crate::utils::UploadStub;

#[tokio::test]
async fn test_cancel_during_backoff_stops_retrying() {
    init_tracing();

    let stub = UploadStub::start(usize::MAX).await.expect("stub");
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("clip.mov");
    std::fs::write(&path, b"video bytes").expect("write");

    let coordinator = UploadCoordinator::new(UploadConfig {
        url: stub.url(),
        backoff_base: Duration::from_secs(5),
        ..UploadConfig::default()
    });
    let handle = coordinator.start(path.clone(), None);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while stub.calls() == 0 {
        assert!(tokio::time::Instant::now() < deadline, "first attempt never arrived");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    handle.cancel();
    let result = tokio::time::timeout(Duration::from_secs(2), handle.wait())
        .await
        .expect("cancel is prompt");

    assert!(matches!(result, Err(UploadError::Cancelled)));
    assert_eq!(stub.calls(), 1);
    assert!(path.exists(), "cancelled upload keeps the recording");
}
