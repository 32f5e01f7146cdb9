use crate::media::RemoteTrack;
use crate::transport::ConnectionState;
use meshcall_core::{IceCandidate, PeerId, SessionDescription};

/// События, которые соединения и фоновые задачи согласования отправляют в цикл Mesh.
///
/// Каждое событие помечено `generation` того PeerLink, который его породил:
/// если к моменту обработки link заменен или закрыт, событие считается устаревшим.
pub enum TransportEvent {
    /// Изменилось состояние нижележащего соединения.
    StateChanged {
        peer_id: PeerId,
        generation: u64,
        state: ConnectionState,
    },

    /// Получен удаленный трек.
    TrackAdded {
        peer_id: PeerId,
        generation: u64,
        track: RemoteTrack,
    },

    /// Сгенерирован локальный ICE-кандидат, его нужно отправить пиру через relay.
    CandidateGenerated {
        peer_id: PeerId,
        generation: u64,
        candidate: IceCandidate,
    },

    /// Удаленный offer применен как remote description.
    RemoteOfferApplied {
        peer_id: PeerId,
        generation: u64,
        result: anyhow::Result<()>,
    },

    /// Локальный offer построен и установлен как local description.
    OfferCreated {
        peer_id: PeerId,
        generation: u64,
        result: anyhow::Result<SessionDescription>,
    },

    /// Локальный answer построен и установлен как local description.
    AnswerCreated {
        peer_id: PeerId,
        generation: u64,
        result: anyhow::Result<SessionDescription>,
    },
}

impl TransportEvent {
    pub fn peer_id(&self) -> &PeerId {
        match self {
            TransportEvent::StateChanged { peer_id, .. }
            | TransportEvent::TrackAdded { peer_id, .. }
            | TransportEvent::CandidateGenerated { peer_id, .. }
            | TransportEvent::RemoteOfferApplied { peer_id, .. }
            | TransportEvent::OfferCreated { peer_id, .. }
            | TransportEvent::AnswerCreated { peer_id, .. } => peer_id,
        }
    }

    pub fn generation(&self) -> u64 {
        match self {
            TransportEvent::StateChanged { generation, .. }
            | TransportEvent::TrackAdded { generation, .. }
            | TransportEvent::CandidateGenerated { generation, .. }
            | TransportEvent::RemoteOfferApplied { generation, .. }
            | TransportEvent::OfferCreated { generation, .. }
            | TransportEvent::AnswerCreated { generation, .. } => *generation,
        }
    }
}
