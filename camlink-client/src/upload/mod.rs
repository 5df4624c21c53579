mod upload_config;
mod upload_coordinator;

pub use upload_config::*;
pub use upload_coordinator::*;
