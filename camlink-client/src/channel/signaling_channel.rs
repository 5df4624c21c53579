use crate::channel::{
    ChannelConfig, ChannelEvent, ChannelState, ReconnectDecision, ReconnectPolicy,
};
use bytes::Bytes;
use camlink_core::{CommandMessage, SignalingMessage, StatusMessage};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::net::TcpStream;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

type RelayStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// State shared between the channel handle and its driver task.
struct Link {
    outbound: watch::Sender<Option<mpsc::Sender<Message>>>,
    state: watch::Sender<ChannelState>,
    events: mpsc::UnboundedSender<ChannelEvent>,
}

impl Link {
    /// Driver-side updates are discarded once that driver was cancelled,
    /// so a stale driver can't clobber its replacement.
    fn publish_state(&self, cancel: &CancellationToken, state: ChannelState) {
        if !cancel.is_cancelled() {
            self.state.send_replace(state);
        }
    }

    fn publish_outbound(&self, cancel: &CancellationToken, tx: Option<mpsc::Sender<Message>>) {
        if !cancel.is_cancelled() {
            self.outbound.send_replace(tx);
        }
    }

    fn emit(&self, cancel: &CancellationToken, event: ChannelEvent) {
        if !cancel.is_cancelled() {
            let _ = self.events.send(event);
        }
    }
}

struct Driver {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Reconnecting WebSocket link to the relay.
///
/// Sends never block: when the link is down they are dropped with a log
/// line. Inbound signaling and commands arrive on the event receiver
/// returned by [`SignalingChannel::new`].
pub struct SignalingChannel {
    config: ChannelConfig,
    link: Arc<Link>,
    driver: Mutex<Option<Driver>>,
}

impl SignalingChannel {
    pub fn new(config: ChannelConfig) -> (Self, mpsc::UnboundedReceiver<ChannelEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let (outbound, _) = watch::channel(None);
        let (state, _) = watch::channel(ChannelState::Disconnected);

        let channel = Self {
            config,
            link: Arc::new(Link {
                outbound,
                state,
                events,
            }),
            driver: Mutex::new(None),
        };

        (channel, events_rx)
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Starts the connect/reconnect loop. No-op while one is already running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect(&self) {
        let mut driver = self.driver.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(d) = driver.as_ref()
            && !d.task.is_finished()
        {
            debug!("Signaling channel already running");
            return;
        }

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(
            self.config.clone(),
            self.link.clone(),
            cancel.clone(),
        ));
        *driver = Some(Driver { cancel, task });
    }

    /// Closes the link and stops reconnecting. Safe to call repeatedly.
    pub fn disconnect(&self) {
        let driver = self
            .driver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(driver) = driver {
            driver.cancel.cancel();
            info!("Signaling channel to {} disconnected", self.config.url);
        }

        self.link.outbound.send_replace(None);
        self.link.state.send_replace(ChannelState::Disconnected);
    }

    /// Manual reconnect: drops the current link and starts over with a
    /// fresh attempt budget.
    pub fn reconnect(&self) {
        self.disconnect();
        self.connect();
    }

    pub fn state(&self) -> ChannelState {
        *self.link.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ChannelState> {
        self.link.state.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.link.outbound.borrow().is_some()
    }

    pub fn send_json<T: Serialize>(&self, message: &T) -> bool {
        match serde_json::to_string(message) {
            Ok(json) => self.enqueue(Message::text(json)),
            Err(e) => {
                error!("Failed to serialize outbound message: {}", e);
                false
            }
        }
    }

    pub fn send_binary(&self, data: Bytes) -> bool {
        self.enqueue(Message::binary(data))
    }

    fn enqueue(&self, msg: Message) -> bool {
        let outbound = self.link.outbound.borrow();
        let Some(tx) = outbound.as_ref() else {
            debug!("Not connected, dropping outbound message");
            return false;
        };

        match tx.try_send(msg) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Outbound queue full, dropping message");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Connection closing, dropping outbound message");
                false
            }
        }
    }
}

impl Drop for SignalingChannel {
    fn drop(&mut self) {
        if let Some(driver) = self
            .driver
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            driver.cancel.cancel();
        }
    }
}

async fn run(config: ChannelConfig, link: Arc<Link>, cancel: CancellationToken) {
    let mut policy = ReconnectPolicy::new(config.reconnect_delay, config.max_reconnect_attempts);

    loop {
        link.publish_state(&cancel, ChannelState::Connecting);
        info!("Connecting to {}", config.url);

        let connected = tokio::select! {
            _ = cancel.cancelled() => return,
            r = tokio::time::timeout(config.connect_timeout, connect_async(config.url.as_str())) => r,
        };

        let reason = match connected {
            Ok(Ok((stream, _))) => {
                policy.reset();
                run_connection(stream, &config, &link, &cancel).await
            }
            Ok(Err(e)) => format!("connect failed: {e}"),
            Err(_) => format!("connect timed out after {:?}", config.connect_timeout),
        };

        if cancel.is_cancelled() {
            return;
        }

        link.publish_outbound(&cancel, None);
        link.publish_state(&cancel, ChannelState::Disconnected);
        warn!("Signaling channel down: {}", reason);
        link.emit(&cancel, ChannelEvent::Disconnected { reason });

        match policy.on_failure() {
            ReconnectDecision::RetryAfter(delay) => {
                info!(
                    "Reconnecting in {:?} (attempt {}/{})",
                    delay,
                    policy.attempts(),
                    config.max_reconnect_attempts
                );
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            ReconnectDecision::GiveUp => {
                error!(
                    "Giving up on {} after {} reconnect attempts",
                    config.url,
                    policy.attempts()
                );
                link.publish_state(&cancel, ChannelState::GaveUp);
                link.emit(&cancel, ChannelEvent::GaveUp);
                return;
            }
        }
    }
}

/// Pumps one open connection. Returns why it ended.
async fn run_connection(
    stream: RelayStream,
    config: &ChannelConfig,
    link: &Link,
    cancel: &CancellationToken,
) -> String {
    let (mut sink, mut source) = stream.split();
    let (tx, mut rx) = mpsc::channel(config.outbound_capacity.max(1));

    let waiting = match serde_json::to_string(&StatusMessage::waiting()) {
        Ok(json) => json,
        Err(e) => return format!("status encoding failed: {e}"),
    };
    if let Err(e) = sink.send(Message::text(waiting)).await {
        return format!("send failed: {e}");
    }

    link.publish_outbound(cancel, Some(tx));
    link.publish_state(cancel, ChannelState::Connected);
    link.emit(cancel, ChannelEvent::Connected);
    info!("Connected to {}", config.url);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                return "closed by client".to_owned();
            }
            Some(msg) = rx.recv() => {
                if let Err(e) = sink.send(msg).await {
                    return format!("send failed: {e}");
                }
            }
            incoming = source.next() => match incoming {
                Some(Ok(Message::Text(text))) => match decode_inbound(text.as_str()) {
                    Some(event) => link.emit(cancel, event),
                    None => warn!("Dropping invalid message: {}", text.as_str()),
                },
                Some(Ok(Message::Binary(data))) => {
                    debug!("Ignoring {} byte binary message", data.len());
                }
                Some(Ok(Message::Close(frame))) => return close_reason(frame),
                Some(Ok(_)) => {}
                Some(Err(e)) => return format!("receive failed: {e}"),
                None => return "connection closed".to_owned(),
            }
        }
    }
}

fn close_reason(frame: Option<CloseFrame>) -> String {
    match frame {
        Some(frame) if matches!(frame.code, CloseCode::Restart | CloseCode::Again) => {
            format!("server asked to retry ({})", u16::from(frame.code))
        }
        Some(frame) => format!("closed by server ({}): {}", u16::from(frame.code), frame.reason),
        None => "closed by server".to_owned(),
    }
}

/// Signaling first, then `{command}`; anything else is invalid.
pub(crate) fn decode_inbound(text: &str) -> Option<ChannelEvent> {
    if let Ok(signal) = serde_json::from_str::<SignalingMessage>(text) {
        return Some(ChannelEvent::Signaling(signal));
    }
    if let Ok(command) = serde_json::from_str::<CommandMessage>(text) {
        return Some(ChannelEvent::Command(command.command()));
    }
    None
}
