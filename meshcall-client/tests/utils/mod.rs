
pub use loopback_relay::*;
pub use mock_chat::*;
pub use mock_connection::*;
pub use mock_signaling::*;
pub use signal_helpers::*;
