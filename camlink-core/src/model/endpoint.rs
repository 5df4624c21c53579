use serde::{Deserialize, Serialize};
use std::fmt;

/// Relay-assigned connection id. Numeric on the wire (`cameraId`).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct EndpointId(pub u64);

impl From<u64> for EndpointId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
