//! Integration tests for camlink_server.
//!
//! - `connection_tests` - role selection, presence, disconnects
//! - `routing_tests` - signaling, command and frame forwarding
//! - `http_tests` - control, upload and listing endpoints

pub mod routing_tests;

use tracing::Level;

use crate::utils::{TestRelay, TestSocket};

/// Initialize tracing for tests (call once per test).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// One relay with one camera and one viewer, both registered.
pub async fn camera_and_viewer() -> anyhow::Result<(TestRelay, TestSocket, TestSocket)> {
    let relay = TestRelay::start().await?;
    let camera = TestSocket::connect(&relay.ws_url("/camera")).await?;
    let viewer = TestSocket::connect(&relay.ws_url("/viewer")).await?;
    relay.wait_for_counts(1, 1).await?;
    Ok((relay, camera, viewer))
}
