use crate::mesh::{MeshCommand, MeshHandle};
use crate::signaling::{
    ReconnectPolicy, RelayEvent, RelaySink, RelaySocket, SignalingOutput, TransportError,
};
use async_trait::async_trait;
use meshcall_core::{
    ClientSignal, IceCandidate, PeerId, RoomId, ServerSignal, SessionDescription,
};

/// Сигнальный relay поверх WebSocket.
///
/// Входящие сообщения превращаются в [`MeshCommand`] и уходят в Mesh,
/// исходящие сериализуются в `{"event": ..., "data": ...}`.
pub struct WsSignaling {
    socket: RelaySocket,
}

impl WsSignaling {
    pub fn connect(url: impl Into<String>, policy: ReconnectPolicy, mesh: MeshHandle) -> Self {
        Self {
            socket: RelaySocket::connect(url, policy, mesh),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.socket.is_connected()
    }

    fn send(&self, signal: ClientSignal) -> Result<(), TransportError> {
        self.socket.send(&signal)
    }
}

#[async_trait]
impl SignalingOutput for WsSignaling {
    async fn join_room(&self, room_id: RoomId, username: String) -> Result<(), TransportError> {
        self.send(ClientSignal::JoinRoom { room_id, username })
    }

    async fn send_offer(
        &self,
        peer_id: PeerId,
        offer: SessionDescription,
    ) -> Result<(), TransportError> {
        self.send(ClientSignal::Offer { offer, to: peer_id })
    }

    async fn send_answer(
        &self,
        peer_id: PeerId,
        answer: SessionDescription,
    ) -> Result<(), TransportError> {
        self.send(ClientSignal::Answer { answer, to: peer_id })
    }

    async fn send_ice(
        &self,
        peer_id: PeerId,
        candidate: IceCandidate,
    ) -> Result<(), TransportError> {
        self.send(ClientSignal::IceCandidate {
            candidate,
            to: peer_id,
        })
    }

    async fn leave_room(&self) -> Result<(), TransportError> {
        self.send(ClientSignal::LeaveRoom {})
    }

    async fn disconnect(&self) {
        self.socket.close();
    }
}

#[async_trait]
impl RelaySink<ServerSignal> for MeshHandle {
    async fn deliver(&self, event: RelayEvent<ServerSignal>) -> bool {
        let cmd = match event {
            RelayEvent::Connected => MeshCommand::SignalingStatus { connected: true },
            RelayEvent::Disconnected => MeshCommand::SignalingStatus { connected: false },
            RelayEvent::Message(signal) => MeshCommand::from(signal),
        };
        self.send(cmd).await
    }
}
