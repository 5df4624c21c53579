pub mod model;
pub mod sdp;
pub mod utils;

pub use model::*;
