use std::time::Duration;

use camlink_client::{ChannelConfig, ChannelEvent, ChannelState, SignalingChannel};

use crate::integration::{EVENT_TIMEOUT, init_tracing, next_event};
use crate::utils::RestartingRelay;

fn restart_config(url: String, attempts: u32) -> ChannelConfig {
    ChannelConfig {
        url,
        reconnect_delay: Duration::from_millis(20),
        max_reconnect_attempts: attempts,
        connect_timeout: Duration::from_secs(2),
        ..ChannelConfig::default()
    }
}

async fn expect_retry_close(events: &mut tokio::sync::mpsc::UnboundedReceiver<ChannelEvent>) {
    match next_event(events).await.expect("disconnect") {
        ChannelEvent::Disconnected { reason } => {
            assert!(reason.contains("retry"), "unexpected reason: {reason}")
        }
        other => panic!("expected disconnect, got {other:?}"),
    }
}

#[tokio::test]
async fn test_reconnects_after_service_restart_and_try_again() {
    init_tracing();

    let relay = RestartingRelay::start(vec![1012, 1013])
        .await
        .expect("relay");
    // One attempt per outage; a successful open refills the budget.
    let (channel, mut events) = SignalingChannel::new(restart_config(relay.camera_url(), 1));
    let mut state = channel.subscribe_state();
    channel.connect();

    for _ in 0..2 {
        assert_eq!(next_event(&mut events).await.expect("connect"), ChannelEvent::Connected);
        expect_retry_close(&mut events).await;
    }
    assert_eq!(next_event(&mut events).await.expect("connect"), ChannelEvent::Connected);

    tokio::time::timeout(EVENT_TIMEOUT, state.wait_for(|s| *s == ChannelState::Connected))
        .await
        .expect("state timeout")
        .expect("state sender dropped");
    assert_eq!(relay.connections(), 3);

    // The third connection stays up.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(events.try_recv().is_err());
    assert!(channel.is_connected());

    channel.disconnect();
}

#[tokio::test]
async fn test_try_again_without_budget_gives_up() {
    init_tracing();

    let relay = RestartingRelay::start(vec![1013]).await.expect("relay");
    let (channel, mut events) = SignalingChannel::new(restart_config(relay.camera_url(), 0));
    channel.connect();

    assert_eq!(next_event(&mut events).await.expect("connect"), ChannelEvent::Connected);
    expect_retry_close(&mut events).await;
    assert_eq!(next_event(&mut events).await.expect("give up"), ChannelEvent::GaveUp);
    assert_eq!(channel.state(), ChannelState::GaveUp);
    assert_eq!(relay.connections(), 1);
}
