mod chat_error;
mod chat_handle;
mod chat_output;
mod chat_session;
mod synchronizer;
mod ws_chat;

pub use chat_error::*;
pub use chat_handle::*;
pub use chat_output::*;
pub use chat_session::*;
pub use synchronizer::*;
pub use ws_chat::*;
