use crate::error::PeerError;
use crate::peer::{NegotiationPhase, PeerConfig, PeerEvent, VideoCapturer};
use camlink_core::sdp::apply_max_bitrate;
use camlink_core::{IceCandidate, PeerConnectionState};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_H264, MediaEngine};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// Local candidates gathered before the offer went out wait here, so a
/// viewer never sees `ice` ahead of the `offer` it belongs to.
enum CandidateGate {
    Holding(Vec<IceCandidate>),
    Open,
}

struct OfferGate {
    events: mpsc::UnboundedSender<PeerEvent>,
    state: Mutex<CandidateGate>,
}

impl OfferGate {
    fn new(events: mpsc::UnboundedSender<PeerEvent>) -> Self {
        Self {
            events,
            state: Mutex::new(CandidateGate::Holding(Vec::new())),
        }
    }

    fn candidate(&self, candidate: IceCandidate) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match &mut *state {
            CandidateGate::Holding(pending) => pending.push(candidate),
            CandidateGate::Open => {
                let _ = self.events.send(PeerEvent::IceCandidateReady(candidate));
            }
        }
    }

    /// Emits the offer, then everything gathered so far, then opens the gate.
    fn release(&self, sdp: String) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = self.events.send(PeerEvent::OfferReady { sdp });

        if let CandidateGate::Holding(pending) =
            std::mem::replace(&mut *state, CandidateGate::Open)
        {
            if !pending.is_empty() {
                debug!("Releasing {} early ICE candidates", pending.len());
            }
            for candidate in pending {
                let _ = self.events.send(PeerEvent::IceCandidateReady(candidate));
            }
        }
    }
}

struct ActivePeer {
    generation: u64,
    connection: Arc<RTCPeerConnection>,
    gate: Arc<OfferGate>,
}

/// Drives one outgoing video peer connection through offer/answer/ICE.
///
/// Every `setup` bumps a generation counter; callbacks registered by an
/// older connection check it and go quiet once superseded.
pub struct PeerSignaling {
    config: PeerConfig,
    events: mpsc::UnboundedSender<PeerEvent>,
    generation: Arc<AtomicU64>,
    active: Option<ActivePeer>,
    phase: NegotiationPhase,
}

impl PeerSignaling {
    pub fn new(config: PeerConfig) -> (Self, mpsc::UnboundedReceiver<PeerEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let signaling = Self {
            config,
            events,
            generation: Arc::new(AtomicU64::new(0)),
            active: None,
            phase: NegotiationPhase::Uninitialized,
        };
        (signaling, events_rx)
    }

    pub fn phase(&self) -> NegotiationPhase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Local description as applied to the connection (without the bitrate cap).
    pub async fn local_description(&self) -> Option<String> {
        let active = self.active.as_ref()?;
        active.connection.local_description().await.map(|d| d.sdp)
    }

    /// Closes any existing connection, then builds a fresh one with a
    /// send-only H.264 track.
    pub async fn setup(&mut self) -> Result<VideoCapturer, PeerError> {
        self.close().await;

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let mut media = MediaEngine::default();
        media.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media)?;

        let api = APIBuilder::new()
            .with_media_engine(media)
            .with_interceptor_registry(registry)
            .build();

        let ice_servers = if self.config.ice_servers.is_empty() {
            Vec::new()
        } else {
            vec![RTCIceServer {
                urls: self.config.ice_servers.clone(),
                ..Default::default()
            }]
        };
        let rtc_config = RTCConfiguration {
            ice_servers,
            ..Default::default()
        };

        let connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        let track = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_H264.to_owned(),
                clock_rate: 90000,
                ..Default::default()
            },
            self.config.track_id.clone(),
            self.config.stream_id.clone(),
        ));

        connection
            .add_transceiver_from_track(
                Arc::clone(&track) as Arc<dyn TrackLocal + Send + Sync>,
                Some(RTCRtpTransceiverInit {
                    direction: RTCRtpTransceiverDirection::Sendonly,
                    send_encodings: Vec::new(),
                }),
            )
            .await?;

        let gate = Arc::new(OfferGate::new(self.events.clone()));
        self.register_callbacks(&connection, generation, &gate);

        self.active = Some(ActivePeer {
            generation,
            connection,
            gate,
        });
        self.phase = NegotiationPhase::Idle;
        info!("Peer connection ready (generation {})", generation);

        Ok(VideoCapturer::spawn(
            track,
            generation,
            self.config.sample_queue,
        ))
    }

    fn register_callbacks(
        &self,
        connection: &Arc<RTCPeerConnection>,
        generation: u64,
        gate: &Arc<OfferGate>,
    ) {
        let ice_gate = gate.clone();
        let ice_generation = self.generation.clone();
        connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let gate = ice_gate.clone();
            let current = ice_generation.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                if current.load(Ordering::SeqCst) != generation {
                    return;
                }
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                gate.candidate(IceCandidate {
                    candidate: init.candidate,
                    sdp_m_line_index: init.sdp_mline_index.unwrap_or(0),
                    sdp_mid: init.sdp_mid,
                });
            })
        }));

        let state_tx = self.events.clone();
        let state_generation = self.generation.clone();
        connection.on_ice_connection_state_change(Box::new(move |s: RTCIceConnectionState| {
            let tx = state_tx.clone();
            let current = state_generation.clone();

            Box::pin(async move {
                if current.load(Ordering::SeqCst) != generation {
                    debug!("Ignoring ICE state {} from generation {}", s, generation);
                    return;
                }
                info!("ICE connection state: {}", s);
                if let Some(state) = map_ice_state(s) {
                    let _ = tx.send(PeerEvent::ConnectionStateChanged(state));
                }
            })
        }));
    }

    /// Creates the send-only offer and emits it with the bitrate cap applied.
    ///
    /// Candidates gathered while the local description is applied are
    /// emitted after the offer.
    pub async fn create_offer(&mut self) -> Result<String, PeerError> {
        let active = self.active.as_ref().ok_or(PeerError::NotInitialized)?;

        let offer = active.connection.create_offer(None).await?;
        let capped = apply_max_bitrate(&offer.sdp, self.config.max_bitrate_kbps);

        // webrtc-rs rejects a local offer that differs from the one it produced.
        active.connection.set_local_description(offer).await?;

        self.phase = NegotiationPhase::OfferSent;
        info!(
            "Offer created (generation {}, cap {} kbps)",
            active.generation, self.config.max_bitrate_kbps
        );
        active.gate.release(capped.clone());

        Ok(capped)
    }

    pub async fn handle_answer(&mut self, sdp: String) -> Result<(), PeerError> {
        let Some(active) = self.active.as_ref() else {
            warn!("Answer received without a peer connection");
            return Ok(());
        };

        let answer = RTCSessionDescription::answer(sdp)?;
        active.connection.set_remote_description(answer).await?;

        self.phase = NegotiationPhase::Negotiated;
        info!("Remote answer applied (generation {})", active.generation);
        Ok(())
    }

    pub async fn add_ice_candidate(&mut self, candidate: IceCandidate) -> Result<(), PeerError> {
        let Some(active) = self.active.as_ref() else {
            warn!("ICE candidate received without a peer connection");
            return Ok(());
        };

        active
            .connection
            .add_ice_candidate(RTCIceCandidateInit {
                candidate: candidate.candidate,
                sdp_mid: candidate.sdp_mid,
                sdp_mline_index: Some(candidate.sdp_m_line_index),
                username_fragment: None,
            })
            .await?;
        debug!("Remote ICE candidate added");
        Ok(())
    }

    /// Idempotent.
    pub async fn close(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };

        // Late callbacks from this connection must not surface.
        self.generation.fetch_add(1, Ordering::SeqCst);

        if let Err(e) = active.connection.close().await {
            warn!("Closing peer connection {} failed: {}", active.generation, e);
        }
        self.phase = NegotiationPhase::Closed;
        info!("Peer connection {} closed", active.generation);
    }
}

fn map_ice_state(state: RTCIceConnectionState) -> Option<PeerConnectionState> {
    Some(match state {
        RTCIceConnectionState::New => PeerConnectionState::New,
        RTCIceConnectionState::Checking => PeerConnectionState::Checking,
        RTCIceConnectionState::Connected => PeerConnectionState::Connected,
        RTCIceConnectionState::Completed => PeerConnectionState::Completed,
        RTCIceConnectionState::Failed => PeerConnectionState::Failed,
        RTCIceConnectionState::Disconnected => PeerConnectionState::Disconnected,
        RTCIceConnectionState::Closed => PeerConnectionState::Closed,
        RTCIceConnectionState::Unspecified => return None,
    })
}
