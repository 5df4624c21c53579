use crate::capture::{CaptureDevice, CapturedFrame, FrameSink};
use crate::channel::{ChannelEvent, ChannelState, SignalingChannel};
use crate::error::{ClientError, UploadError};
use crate::peer::{PeerEvent, PeerSignaling, VideoCapturer};
use crate::pipeline::FrameStreamingPipeline;
use crate::session::{ClientStatus, SessionConfig, SessionPhase, TransportStrategy};
use crate::upload::{ProgressCallback, UploadCoordinator, UploadProgress, UploadReport};
use camlink_core::{ControlCommand, SignalingMessage, StatusMessage};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Hands encoded samples to whichever capturer the current peer handed out.
struct SampleForwarder {
    current: watch::Sender<Option<VideoCapturer>>,
    frame_duration: Duration,
}

impl SampleForwarder {
    /// Swaps in the next capturer and reports what the retired one delivered.
    fn replace(&self, next: Option<VideoCapturer>) {
        if let Some(retired) = self.current.send_replace(next) {
            info!(
                "Video track {} retired: {} samples written, {} dropped",
                retired.generation(),
                retired.samples_written(),
                retired.samples_dropped()
            );
        }
    }
}

impl FrameSink for SampleForwarder {
    fn on_frame(&self, frame: &CapturedFrame) {
        let Some(sample) = &frame.sample else {
            return;
        };
        if let Some(capturer) = self.current.borrow().as_ref() {
            capturer.push_sample(sample.clone(), self.frame_duration);
        }
    }
}

enum Strategy {
    WebRtc {
        peer: PeerSignaling,
        events: mpsc::UnboundedReceiver<PeerEvent>,
        forwarder: Arc<SampleForwarder>,
    },
    Relay {
        pipeline: FrameStreamingPipeline,
    },
}

type UploadResult = (PathBuf, Result<UploadReport, UploadError>);

/// Camera-side coordinator: owns the capture device, the relay channel,
/// the live-video strategy and pending uploads, and reacts to remote
/// commands.
///
/// The session is the only writer of [`ClientStatus`].
pub struct CaptureSession {
    config: SessionConfig,
    device: Box<dyn CaptureDevice>,
    channel: Arc<SignalingChannel>,
    channel_events: mpsc::UnboundedReceiver<ChannelEvent>,
    strategy: Strategy,
    uploader: UploadCoordinator,
    uploads: JoinSet<UploadResult>,
    upload_cancel: CancellationToken,
    progress_tx: mpsc::UnboundedSender<UploadProgress>,
    progress_rx: mpsc::UnboundedReceiver<UploadProgress>,
    status: watch::Sender<ClientStatus>,
    started: bool,
}

impl CaptureSession {
    /// Must be called from within a Tokio runtime.
    pub fn new(mut config: SessionConfig, device: Box<dyn CaptureDevice>) -> Self {
        config.stream.capture_fps = config.capture.fps;

        let (channel, channel_events) = SignalingChannel::new(config.channel.clone());
        let channel = Arc::new(channel);

        let strategy = match config.transport {
            TransportStrategy::WebRtc => {
                let (peer, events) = PeerSignaling::new(config.peer.clone());
                let (current, _) = watch::channel(None);
                Strategy::WebRtc {
                    peer,
                    events,
                    forwarder: Arc::new(SampleForwarder {
                        current,
                        frame_duration: Duration::from_secs_f64(
                            1.0 / f64::from(config.capture.fps.max(1)),
                        ),
                    }),
                }
            }
            TransportStrategy::Relay => Strategy::Relay {
                pipeline: FrameStreamingPipeline::new(config.stream, channel.clone()),
            },
        };

        let (progress_tx, progress_rx) = mpsc::unbounded_channel();
        let (status, _) = watch::channel(ClientStatus::default());

        Self {
            uploader: UploadCoordinator::new(config.upload.clone()),
            config,
            device,
            channel,
            channel_events,
            strategy,
            uploads: JoinSet::new(),
            upload_cancel: CancellationToken::new(),
            progress_tx,
            progress_rx,
            status,
            started: false,
        }
    }

    pub fn status(&self) -> watch::Receiver<ClientStatus> {
        self.status.subscribe()
    }

    pub fn current_status(&self) -> ClientStatus {
        self.status.borrow().clone()
    }

    pub fn channel(&self) -> Arc<SignalingChannel> {
        self.channel.clone()
    }

    /// The relay-strategy pipeline, for live reconfiguration.
    pub fn pipeline(&self) -> Option<&FrameStreamingPipeline> {
        match &self.strategy {
            Strategy::Relay { pipeline } => Some(pipeline),
            Strategy::WebRtc { .. } => None,
        }
    }

    fn update_status(&self, update: impl FnOnce(&mut ClientStatus)) {
        self.status.send_modify(update);
    }

    fn fail(&self, detail: String) {
        error!("{}", detail);
        self.update_status(|s| {
            s.phase = SessionPhase::Error;
            s.detail = detail;
        });
    }

    /// Configures the device, starts capture and connects to the relay.
    pub async fn start(&mut self) -> Result<(), ClientError> {
        if self.started {
            return Ok(());
        }

        self.update_status(|s| {
            s.phase = SessionPhase::Connecting;
            s.detail = "starting capture".to_owned();
        });

        if let Err(e) = self.device.configure(&self.config.capture).await {
            self.fail(format!("capture setup failed: {e}"));
            return Err(e.into());
        }

        let sink: Arc<dyn FrameSink> = match &self.strategy {
            Strategy::WebRtc { forwarder, .. } => forwarder.clone(),
            Strategy::Relay { pipeline } => Arc::new(pipeline.clone()),
        };
        if let Err(e) = self.device.start_session(sink).await {
            self.fail(format!("capture start failed: {e}"));
            return Err(e.into());
        }

        self.upload_cancel = CancellationToken::new();
        self.channel.connect();
        self.started = true;

        self.update_status(|s| s.detail = format!("connecting to {}", self.channel.url()));
        info!(
            "Capture session started ({:?} transport, relay {})",
            self.config.transport,
            self.channel.url()
        );
        Ok(())
    }

    /// Starts the session and handles events until `shutdown` fires.
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<(), ClientError> {
        self.start().await?;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                Some(event) = self.channel_events.recv() => self.on_channel_event(event).await,
                Some(event) = next_peer_event(&mut self.strategy) => self.on_peer_event(event),
                Some(joined) = self.uploads.join_next(), if !self.uploads.is_empty() => {
                    self.on_upload_finished(joined);
                }
                Some(progress) = self.progress_rx.recv() => self.on_upload_progress(progress),
            }
        }

        self.stop().await;
        Ok(())
    }

    /// Stops capture, closes the peer and the channel, and cancels pending
    /// uploads. A recording in progress is finished and kept on disk.
    pub async fn stop(&mut self) {
        if !self.started {
            return;
        }
        self.started = false;

        if self.device.is_recording() {
            match self.device.stop_recording().await {
                Ok(Some(path)) => info!("Recording kept at {}", path.display()),
                Ok(None) => {}
                Err(e) => warn!("Finishing recording on shutdown failed: {}", e),
            }
        }
        self.device.stop_session().await;

        if let Strategy::WebRtc {
            peer, forwarder, ..
        } = &mut self.strategy
        {
            forwarder.replace(None);
            peer.close().await;
        }

        self.channel.disconnect();

        self.upload_cancel.cancel();
        while let Some(joined) = self.uploads.join_next().await {
            self.on_upload_finished(joined);
        }

        self.update_status(|s| {
            s.phase = SessionPhase::Idle;
            s.detail = "stopped".to_owned();
            s.channel = ChannelState::Disconnected;
            s.peer = None;
            s.recording = None;
            s.upload_percent = None;
        });
        info!("Capture session stopped");
    }

    async fn on_channel_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Connected => {
                let recording = self.device.is_recording();
                self.update_status(|s| {
                    s.channel = ChannelState::Connected;
                    s.phase = if recording {
                        SessionPhase::Recording
                    } else {
                        SessionPhase::Waiting
                    };
                    s.detail = "connected".to_owned();
                });
                if recording {
                    self.send_status(SessionPhase::Recording);
                }
                self.restart_transport().await;
            }
            ChannelEvent::Disconnected { reason } => {
                let recording = self.device.is_recording();
                self.update_status(|s| {
                    s.channel = ChannelState::Disconnected;
                    if !recording && s.phase != SessionPhase::Uploading {
                        s.phase = SessionPhase::Connecting;
                    }
                    s.detail = reason;
                });
            }
            ChannelEvent::GaveUp => {
                self.update_status(|s| s.channel = ChannelState::GaveUp);
                self.fail(format!("relay {} unreachable", self.channel.url()));
            }
            ChannelEvent::Signaling(message) => self.on_signaling(message).await,
            ChannelEvent::Command(command) => self.handle_command(command).await,
        }
    }

    async fn on_signaling(&mut self, message: SignalingMessage) {
        let Strategy::WebRtc { peer, .. } = &mut self.strategy else {
            debug!("Ignoring {} in relay mode", message.kind());
            return;
        };

        let result = match message {
            SignalingMessage::Answer { sdp } => peer.handle_answer(sdp).await,
            SignalingMessage::IceCandidate { candidate } => peer.add_ice_candidate(candidate).await,
            SignalingMessage::Offer { .. } => {
                warn!("Unexpected offer from viewer; this side always offers");
                Ok(())
            }
        };

        if let Err(e) = result {
            error!("Negotiation error: {}", e);
        }
    }

    fn on_peer_event(&mut self, event: PeerEvent) {
        match event {
            PeerEvent::OfferReady { sdp } => {
                self.channel.send_json(&SignalingMessage::Offer { sdp });
            }
            PeerEvent::IceCandidateReady(candidate) => {
                self.channel
                    .send_json(&SignalingMessage::IceCandidate { candidate });
            }
            PeerEvent::ConnectionStateChanged(state) => {
                info!("Peer connection {}", state);
                self.update_status(|s| {
                    s.peer = Some(state);
                    if state.is_terminal() {
                        s.detail = format!("peer connection {}; awaiting reconnect", state);
                    }
                });
                if state.is_terminal() {
                    warn!("Peer connection {}; a viewer must request reconnect", state);
                }
            }
        }
    }

    /// Applies one remote control command. Unknown commands are logged.
    pub async fn handle_command(&mut self, command: ControlCommand) {
        info!("Command: {}", command);
        match command {
            ControlCommand::Start => self.start_recording().await,
            ControlCommand::Stop => self.stop_recording().await,
            ControlCommand::Reconnect => self.restart_transport().await,
            ControlCommand::Unknown(raw) => warn!("Unknown command '{}' ignored", raw),
        }
    }

    /// Fresh peer + offer in WebRTC mode, counter reset in relay mode.
    async fn restart_transport(&mut self) {
        match &mut self.strategy {
            Strategy::WebRtc {
                peer, forwarder, ..
            } => match peer.setup().await {
                Ok(capturer) => {
                    forwarder.replace(Some(capturer));
                    if let Err(e) = peer.create_offer().await {
                        error!("Offer creation failed: {}", e);
                    }
                }
                Err(e) => error!("Peer setup failed: {}", e),
            },
            Strategy::Relay { pipeline } => pipeline.reset(),
        }
    }

    async fn start_recording(&mut self) {
        if self.device.is_recording() {
            info!("Already recording");
            return;
        }

        if let Err(e) = tokio::fs::create_dir_all(&self.config.recordings_dir).await {
            self.fail(format!(
                "cannot create {}: {e}",
                self.config.recordings_dir.display()
            ));
            return;
        }

        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let path = self.config.recordings_dir.join(format!(
            "recording_{millis}.{}",
            self.device.recording_extension()
        ));

        match self.device.start_recording(&path).await {
            Ok(()) => {
                self.update_status(|s| {
                    s.phase = SessionPhase::Recording;
                    s.detail = format!("recording to {}", path.display());
                    s.recording = Some(path);
                });
                self.send_status(SessionPhase::Recording);
            }
            Err(e) => self.fail(format!("recording failed to start: {e}")),
        }
    }

    async fn stop_recording(&mut self) {
        let path = match self.device.stop_recording().await {
            Ok(Some(path)) => path,
            Ok(None) => {
                info!("Not recording");
                return;
            }
            Err(e) => {
                self.fail(format!("recording failed: {e}"));
                return;
            }
        };

        self.update_status(|s| {
            s.phase = SessionPhase::Uploading;
            s.detail = format!("uploading {}", path.display());
            s.recording = None;
            s.upload_percent = Some(0);
        });
        self.send_status(SessionPhase::Uploading);

        let uploader = self.uploader.clone();
        let cancel = self.upload_cancel.child_token();
        let progress_tx = self.progress_tx.clone();
        let on_progress: ProgressCallback = Arc::new(move |p| {
            let _ = progress_tx.send(p);
        });

        self.uploads.spawn(async move {
            let result = uploader.upload(&path, &cancel, Some(on_progress)).await;
            (path, result)
        });
    }

    fn on_upload_progress(&self, progress: UploadProgress) {
        let percent = (progress.fraction() * 100.0).round().clamp(0.0, 100.0) as u8;
        self.status.send_if_modified(|s| {
            if s.phase != SessionPhase::Uploading || s.upload_percent == Some(percent) {
                return false;
            }
            s.upload_percent = Some(percent);
            true
        });
    }

    fn on_upload_finished(&mut self, joined: Result<UploadResult, JoinError>) {
        let outcome = match joined {
            Ok((_, Ok(report))) => Ok(report),
            Ok((path, Err(e))) => Err(format!("upload failed ({e}); kept {}", path.display())),
            Err(e) => Err(format!("upload task failed: {e}")),
        };

        let recording = self.device.is_recording();
        let more_pending = !self.uploads.is_empty();

        match outcome {
            Ok(report) => {
                info!(
                    "Upload done after {} attempt(s): {:?}",
                    report.attempts, report.stored_as
                );
                self.update_status(|s| {
                    s.last_upload = report.stored_as.clone();
                    s.upload_percent = None;
                    if !recording && !more_pending {
                        s.phase = SessionPhase::Waiting;
                        s.detail = "upload complete".to_owned();
                    }
                });
            }
            Err(detail) => {
                self.fail(detail);
                self.update_status(|s| s.upload_percent = None);
            }
        }

        if self.started && !recording && !more_pending {
            self.send_status(SessionPhase::Waiting);
        }
    }

    fn send_status(&self, phase: SessionPhase) {
        self.channel.send_json(&StatusMessage::new(phase.as_str()));
    }
}

async fn next_peer_event(strategy: &mut Strategy) -> Option<PeerEvent> {
    match strategy {
        Strategy::WebRtc { events, .. } => events.recv().await,
        Strategy::Relay { .. } => std::future::pending().await,
    }
}
