mod test_socket;

pub use test_relay::*;
pub use test_socket::*;
