mod capture_session;
mod client_status;
mod session_config;

pub use capture_session::*;
pub use client_status::*;
pub use session_config::*;
