mod peer_config;
mod peer_event;
mod peer_signaling;
mod video_capturer;

pub use peer_config::*;
pub use peer_event::*;
pub use peer_signaling::*;
pub use video_capturer::*;
