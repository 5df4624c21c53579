use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of the relay a connection belongs to.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Camera,
    Viewer,
}

impl Role {
    /// Picks the role from a request path by substring, `/camera` or `/viewer`.
    pub fn from_path(path: &str) -> Option<Self> {
        if path.contains("camera") {
            Some(Role::Camera)
        } else if path.contains("viewer") {
            Some(Role::Viewer)
        } else {
            None
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Role::Camera => Role::Viewer,
            Role::Viewer => Role::Camera,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Camera => "camera",
            Role::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
