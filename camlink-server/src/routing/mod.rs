mod inbound;
mod message_router;

pub use inbound::*;
pub use message_router::*;
