use crate::signaling::TransportError;
use async_trait::async_trait;
use meshcall_core::RoomId;

/// Исходящая сторона relay чата.
#[async_trait]
pub trait ChatOutput: Send + Sync {
    async fn join_room(&self, room_id: RoomId, username: String) -> Result<(), TransportError>;

    async fn send_message(
        &self,
        room_id: RoomId,
        username: String,
        text: String,
    ) -> Result<(), TransportError>;

    async fn leave_room(&self) -> Result<(), TransportError>;

    async fn disconnect(&self);
}
