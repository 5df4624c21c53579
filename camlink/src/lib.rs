pub use camlink_core::model::{EndpointId, Role};

pub mod model {
    pub use camlink_core::model::*;
}

pub mod sdp {
    pub use camlink_core::sdp::*;
}

pub mod utils {
    pub use camlink_core::utils::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use camlink_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use camlink_client::*;
}
