use meshcall_core::{IceCandidate, PeerId, ServerSignal, SessionDescription};
use tokio::sync::oneshot;

/// Команды, поступающие в Mesh от сигнального relay и от владельца сессии.
#[derive(Debug)]
pub enum MeshCommand {
    /// Relay сообщил наш собственный id.
    Welcome { self_id: PeerId },

    /// Сигнальный транспорт подключился или отвалился.
    SignalingStatus { connected: bool },

    /// В комнату вошел новый участник: мы инициируем offer.
    ParticipantJoined { peer_id: PeerId, username: String },

    /// Удаленный участник прислал SDP Offer.
    OfferReceived {
        from: PeerId,
        username: String,
        offer: SessionDescription,
    },

    /// Удаленный участник ответил на наш offer.
    AnswerReceived {
        from: PeerId,
        answer: SessionDescription,
    },

    /// ICE Candidate от удаленного участника.
    IceCandidateReceived {
        from: PeerId,
        candidate: IceCandidate,
    },

    /// Участник покинул комнату.
    ParticipantLeft { peer_id: PeerId },

    /// Выйти из комнаты. `done` срабатывает, когда все ресурсы освобождены.
    Leave { done: oneshot::Sender<()> },
}

impl From<ServerSignal> for MeshCommand {
    fn from(signal: ServerSignal) -> Self {
        match signal {
            ServerSignal::Welcome { user_id } => MeshCommand::Welcome { self_id: user_id },
            ServerSignal::UserConnected { user_id, username } => MeshCommand::ParticipantJoined {
                peer_id: user_id,
                username,
            },
            ServerSignal::Offer {
                offer,
                from,
                username,
            } => MeshCommand::OfferReceived {
                from,
                username,
                offer,
            },
            ServerSignal::Answer { answer, from } => MeshCommand::AnswerReceived { from, answer },
            ServerSignal::IceCandidate { candidate, from } => {
                MeshCommand::IceCandidateReceived { from, candidate }
            }
            ServerSignal::UserDisconnected { user_id } => {
                MeshCommand::ParticipantLeft { peer_id: user_id }
            }
        }
    }
}
