use crate::media::{LocalTrack, RemoteTrack};
use crate::transport::TransportEvent;
use anyhow::Result;
use async_trait::async_trait;
use meshcall_core::{IceCandidate, PeerId, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl ConnectionState {
    /// Состояния, после которых соединение уже не восстановится само.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ConnectionState::Disconnected | ConnectionState::Failed | ConnectionState::Closed
        )
    }
}

/// Real-time соединение с одним удаленным участником.
///
/// Колбэки `on_track` / `on_ice_candidate` / `on_connection_state_change`
/// не являются частью трейта: реализация отправляет их через [`LinkEvents`],
/// полученный при создании.
#[async_trait]
pub trait RealtimeConnection: Send + Sync {
    /// Прикрепить локальный трек. Трек разделяемый: соединение его не владеет.
    async fn add_track(&self, track: Arc<LocalTrack>) -> Result<()>;

    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Создает по одному соединению на каждый новый PeerLink.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    async fn create(&self, events: LinkEvents) -> Result<Arc<dyn RealtimeConnection>>;
}

/// Обратный канал соединения в цикл Mesh, привязанный к `(peer_id, generation)`.
#[derive(Clone)]
pub struct LinkEvents {
    peer_id: PeerId,
    generation: u64,
    tx: mpsc::UnboundedSender<TransportEvent>,
}

impl LinkEvents {
    pub fn new(peer_id: PeerId, generation: u64, tx: mpsc::UnboundedSender<TransportEvent>) -> Self {
        Self {
            peer_id,
            generation,
            tx,
        }
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state_changed(&self, state: ConnectionState) {
        self.emit(TransportEvent::StateChanged {
            peer_id: self.peer_id.clone(),
            generation: self.generation,
            state,
        });
    }

    pub fn track_added(&self, track: RemoteTrack) {
        self.emit(TransportEvent::TrackAdded {
            peer_id: self.peer_id.clone(),
            generation: self.generation,
            track,
        });
    }

    pub fn candidate_generated(&self, candidate: IceCandidate) {
        self.emit(TransportEvent::CandidateGenerated {
            peer_id: self.peer_id.clone(),
            generation: self.generation,
            candidate,
        });
    }

    fn emit(&self, event: TransportEvent) {
        // Mesh уже остановлен: событие некому обрабатывать.
        if self.tx.send(event).is_err() {
            debug!(
                "Dropping transport event for {} (generation {}): mesh is gone",
                self.peer_id, self.generation
            );
        }
    }
}
