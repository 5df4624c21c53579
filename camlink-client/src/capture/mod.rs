mod capture_device;
mod captured_frame;
mod synthetic_camera;

pub use capture_device::*;
pub use captured_frame::*;
pub use synthetic_camera::*;
