mod app;
mod config;
mod error;
mod http;
mod registry;
mod routing;
mod signaling;
mod storage;

pub use app::*;
pub use config::*;
pub use error::*;
pub use registry::*;
pub use routing::*;
pub use signaling::*;
pub use storage::*;
