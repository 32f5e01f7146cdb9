mod reconnect_policy;
mod relay_socket;
mod signaling_output;
mod transport_error;
mod ws_signaling;

pub use reconnect_policy::*;
pub use relay_socket::*;
pub use signaling_output::*;
pub use transport_error::*;
pub use ws_signaling::*;
