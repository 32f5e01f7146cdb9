use crate::signaling::TransportError;
use async_trait::async_trait;
use meshcall_core::{IceCandidate, PeerId, RoomId, SessionDescription};

/// Исходящая сторона сигнального relay, через которую Mesh говорит с пирами.
///
/// Пока транспорт отключен, все отправки возвращают
/// [`TransportError::NotConnected`].
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn join_room(&self, room_id: RoomId, username: String) -> Result<(), TransportError>;

    /// Отправить SDP Offer конкретному участнику.
    async fn send_offer(
        &self,
        peer_id: PeerId,
        offer: SessionDescription,
    ) -> Result<(), TransportError>;

    /// Отправить SDP Answer конкретному участнику.
    async fn send_answer(
        &self,
        peer_id: PeerId,
        answer: SessionDescription,
    ) -> Result<(), TransportError>;

    /// Отправить ICE кандидата конкретному участнику.
    async fn send_ice(&self, peer_id: PeerId, candidate: IceCandidate)
    -> Result<(), TransportError>;

    async fn leave_room(&self) -> Result<(), TransportError>;

    /// Закрыть транспорт. Повторный вызов ничего не делает.
    async fn disconnect(&self);
}
