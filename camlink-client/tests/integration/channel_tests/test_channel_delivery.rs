use bytes::Bytes;
use camlink_client::{ChannelConfig, ChannelEvent, ChannelState, SignalingChannel};
use camlink_core::ControlCommand;

use crate::integration::{init_tracing, next_event};
use crate::utils::{TestRelay, TestViewer};

#[tokio::test]
async fn test_connect_announces_waiting_and_receives_commands() {
    init_tracing();

    let relay = TestRelay::start().await.expect("Failed to start relay");
    let mut viewer = TestViewer::connect(&relay.viewer_url())
        .await
        .expect("viewer connect");
    relay.wait_for_counts(0, 1).await.expect("viewer registered");

    let (channel, mut events) = SignalingChannel::new(ChannelConfig::new(relay.camera_url()));
    channel.connect();

    assert_eq!(
        next_event(&mut events).await.expect("connected"),
        ChannelEvent::Connected
    );
    assert_eq!(channel.state(), ChannelState::Connected);

    let status = viewer
        .wait_for_camera_status("waiting")
        .await
        .expect("waiting status");
    assert!(status["cameraId"].is_u64());

    viewer.send_command("start").await.expect("send start");
    assert_eq!(
        next_event(&mut events).await.expect("command"),
        ChannelEvent::Command(ControlCommand::Start)
    );

    let frame = Bytes::from(vec![0x5Au8; 5000]);
    assert!(channel.send_binary(frame.clone()));
    assert_eq!(viewer.wait_for_frame().await.expect("frame"), frame);

    channel.disconnect();
    channel.disconnect();
    assert_eq!(channel.state(), ChannelState::Disconnected);
    assert!(!channel.send_binary(frame));
}
