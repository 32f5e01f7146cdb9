use crate::chat::{ChatHandle, ChatOutput};
use crate::signaling::{ReconnectPolicy, RelaySocket, TransportError};
use async_trait::async_trait;
use meshcall_core::{ChatClientMessage, RoomId};

/// Relay чата поверх WebSocket.
pub struct WsChat {
    socket: RelaySocket,
}

impl WsChat {
    pub fn connect(url: impl Into<String>, policy: ReconnectPolicy, chat: ChatHandle) -> Self {
        Self {
            socket: RelaySocket::connect(url, policy, chat),
        }
    }
}

#[async_trait]
impl ChatOutput for WsChat {
    async fn join_room(&self, room_id: RoomId, username: String) -> Result<(), TransportError> {
        self.socket
            .send(&ChatClientMessage::JoinRoom { room_id, username })
    }

    async fn send_message(
        &self,
        room_id: RoomId,
        username: String,
        text: String,
    ) -> Result<(), TransportError> {
        self.socket.send(&ChatClientMessage::SendMessage {
            room_id,
            username,
            text,
        })
    }

    async fn leave_room(&self) -> Result<(), TransportError> {
        self.socket.send(&ChatClientMessage::LeaveRoom {})
    }

    async fn disconnect(&self) {
        self.socket.close();
    }
}
