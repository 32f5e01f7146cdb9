mod connectors;
mod session;
mod session_config;
mod session_error;

pub use connectors::*;
pub use session::*;
pub use session_config::*;
pub use session_error::*;
