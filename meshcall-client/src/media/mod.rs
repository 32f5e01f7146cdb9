mod constraints;
mod devices;
mod local_session;
mod media_error;
mod remote;
mod screen_share;
mod stream;
mod track;

pub use constraints::*;
pub use devices::*;
pub use local_session::*;
pub use media_error::*;
pub use remote::*;
pub use screen_share::*;
pub use stream::*;
pub use track::*;
