mod connection_registry;
mod endpoint;

pub use connection_registry::*;
pub use endpoint::*;
