use std::time::Duration;

use camlink_client::{UploadConfig, UploadCoordinator, UploadError};
use tokio_util::sync::CancellationToken;

use crate::integration::init_tracing;
use crate::utils::UploadStub;

fn fast_retry(url: String, max_retries: u32) -> UploadConfig {
    UploadConfig {
        url,
        max_retries,
        backoff_base: Duration::from_millis(10),
        ..UploadConfig::default()
    }
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    init_tracing();

    let stub = UploadStub::start(2).await.expect("stub");
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("clip.mp4");
    std::fs::write(&path, b"video bytes").expect("write");

    let coordinator = UploadCoordinator::new(fast_retry(stub.url(), 3));
    let report = coordinator
        .upload(&path, &CancellationToken::new(), None)
        .await
        .expect("third attempt succeeds");

    assert_eq!(report.attempts, 3);
    assert_eq!(stub.calls(), 3);
    assert_eq!(report.stored_as.as_deref(), Some("stub_3.mov"));
    assert!(!path.exists());
}

#[tokio::test]
async fn test_exhausted_retries_keep_the_file() {
    init_tracing();

    let stub = UploadStub::start(usize::MAX).await.expect("stub");
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("clip.mp4");
    std::fs::write(&path, b"video bytes").expect("write");

    let coordinator = UploadCoordinator::new(fast_retry(stub.url(), 2));
    let err = coordinator
        .upload(&path, &CancellationToken::new(), None)
        .await
        .expect_err("never succeeds");

    match err {
        UploadError::RetriesExhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(last.contains("500"));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(stub.calls(), 3);
    assert!(path.exists());
}

#[tokio::test]
async fn test_accepted_upload_with_plain_body_still_succeeds() {
    init_tracing();

    let stub = UploadStub::start(0).await.expect("stub");
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("clip.mp4");
    std::fs::write(&path, b"video bytes").expect("write");

    let coordinator = UploadCoordinator::new(fast_retry(stub.plain_url(), 3));
    let report = coordinator
        .upload(&path, &CancellationToken::new(), None)
        .await
        .expect("a 200 counts as stored");

    assert_eq!(report.attempts, 1);
    assert_eq!(stub.calls(), 1);
    assert_eq!(report.stored_as, None);
    assert!(!path.exists());
}
