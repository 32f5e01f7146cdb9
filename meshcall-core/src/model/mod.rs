mod chat;
mod peer;
mod room;
mod signaling;

pub use chat::{ChatClientMessage, ChatMessage, ChatServerMessage};
pub use peer::{Participant, PeerId};
pub use room::{Membership, RoomId};
pub use signaling::{
    ClientSignal, IceCandidate, IceServerConfig, SdpType, ServerSignal, SessionDescription,
};
