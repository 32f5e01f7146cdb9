pub mod chat;
pub mod media;
pub mod mesh;
pub mod session;
pub mod signaling;
pub mod transport;

pub use chat::*;
pub use media::*;
pub use mesh::*;
pub use session::*;
pub use signaling::*;
pub use transport::*;
