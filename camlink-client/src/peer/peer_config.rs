use camlink_core::utils::{DEFAULT_MAX_BITRATE_KBPS, DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2};

#[derive(Debug, Clone)]
pub struct PeerConfig {
    pub ice_servers: Vec<String>,
    /// Cap written into the offer as `b=AS` / `b=TIAS`.
    pub max_bitrate_kbps: u32,
    pub track_id: String,
    pub stream_id: String,
    /// Encoded samples buffered between capture and the track writer.
    pub sample_queue: usize,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![DEFAULT_STUN_ADDR.to_owned(), DEFAULT_STUN_ADDR_2.to_owned()],
            max_bitrate_kbps: DEFAULT_MAX_BITRATE_KBPS,
            track_id: "video0".to_owned(),
            stream_id: "stream0".to_owned(),
            sample_queue: 8,
        }
    }
}
