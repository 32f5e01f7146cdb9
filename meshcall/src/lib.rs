pub use meshcall_core::model::{Membership, PeerId, RoomId};

pub mod model {
    pub use meshcall_core::model::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use meshcall_client::*;
}
