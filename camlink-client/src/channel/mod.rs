mod channel_config;
mod channel_event;
mod reconnect_policy;
mod signaling_channel;

pub use channel_config::*;
pub use channel_event::*;
pub use reconnect_policy::*;
pub use signaling_channel::*;
