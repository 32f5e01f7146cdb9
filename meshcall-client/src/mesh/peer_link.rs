use crate::media::{RemoteStream, RemoteTrack};
use crate::transport::RealtimeConnection;
use meshcall_core::{IceCandidate, PeerId};
use std::sync::Arc;
use tracing::{debug, warn};

/// Фаза offer/answer обмена с одним удаленным участником.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NegotiationState {
    Idle,
    OfferSent,
    OfferReceived,
    AnswerSent,
    Connected,
    Closed,
}

/// Все, что локальный клиент знает о связи с одним удаленным участником.
///
/// ICE-кандидаты, пришедшие до установки remote description, копятся в
/// `pending_remote_candidates` и применяются в порядке поступления.
/// Кандидаты с чужим ufrag (от отброшенного пиром offer) не применяются.
/// Собственные кандидаты не уходят пиру раньше нашего offer/answer.
pub struct PeerLink {
    peer_id: PeerId,
    generation: u64,
    connection: Arc<dyn RealtimeConnection>,
    state: NegotiationState,
    remote_description_set: bool,
    remote_ufrag: Option<String>,
    pending_remote_candidates: Vec<IceCandidate>,
    local_description_sent: bool,
    pending_local_candidates: Vec<IceCandidate>,
    remote_stream: Option<RemoteStream>,
}

impl PeerLink {
    pub(crate) fn new(
        peer_id: PeerId,
        generation: u64,
        connection: Arc<dyn RealtimeConnection>,
    ) -> Self {
        Self {
            peer_id,
            generation,
            connection,
            state: NegotiationState::Idle,
            remote_description_set: false,
            remote_ufrag: None,
            pending_remote_candidates: Vec::new(),
            local_description_sent: false,
            pending_local_candidates: Vec::new(),
            remote_stream: None,
        }
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == NegotiationState::Closed
    }

    pub fn remote_description_set(&self) -> bool {
        self.remote_description_set
    }

    pub fn pending_candidates(&self) -> usize {
        self.pending_remote_candidates.len()
    }

    pub fn remote_stream(&self) -> Option<&RemoteStream> {
        self.remote_stream.as_ref()
    }

    pub(crate) fn connection(&self) -> Arc<dyn RealtimeConnection> {
        self.connection.clone()
    }

    pub(crate) fn transition(&mut self, next: NegotiationState) {
        debug!(
            "Link {} (generation {}): {:?} -> {:?}",
            self.peer_id, self.generation, self.state, next
        );
        self.state = next;
    }

    /// Запомнить ufrag удаленного описания до его применения.
    pub(crate) fn expect_remote_ufrag(&mut self, ufrag: Option<&str>) {
        self.remote_ufrag = ufrag.map(str::to_owned);
    }

    pub(crate) async fn add_remote_candidate(&mut self, candidate: IceCandidate) {
        if self.remote_description_set {
            if !self.matches_remote_session(&candidate) {
                debug!(
                    "Dropping ICE candidate from {} for a previous session",
                    self.peer_id
                );
                return;
            }
            self.apply_candidate(candidate).await;
            return;
        }
        debug!(
            "Buffering ICE candidate from {} until remote description is set",
            self.peer_id
        );
        self.pending_remote_candidates.push(candidate);
    }

    /// Отметить remote description установленным и применить накопленные кандидаты.
    pub(crate) async fn mark_remote_description_set(&mut self) {
        self.remote_description_set = true;

        let mut pending = std::mem::take(&mut self.pending_remote_candidates);
        let buffered = pending.len();
        pending.retain(|c| self.matches_remote_session(c));
        if pending.len() != buffered {
            debug!(
                "Discarding {} buffered ICE candidates from {} for a previous session",
                buffered - pending.len(),
                self.peer_id
            );
        }
        if !pending.is_empty() {
            debug!(
                "Flushing {} buffered ICE candidates for {}",
                pending.len(),
                self.peer_id
            );
        }
        for candidate in pending {
            self.apply_candidate(candidate).await;
        }
    }

    /// Кандидат, который можно отправлять прямо сейчас. Иначе он
    /// откладывается до [`Self::mark_local_description_sent`].
    pub(crate) fn outgoing_candidate(&mut self, candidate: IceCandidate) -> Option<IceCandidate> {
        if self.local_description_sent {
            return Some(candidate);
        }
        self.pending_local_candidates.push(candidate);
        None
    }

    /// Возвращает отложенные собственные кандидаты в порядке генерации.
    pub(crate) fn mark_local_description_sent(&mut self) -> Vec<IceCandidate> {
        self.local_description_sent = true;
        std::mem::take(&mut self.pending_local_candidates)
    }

    pub(crate) fn record_track(&mut self, track: RemoteTrack) {
        match &mut self.remote_stream {
            Some(stream) => stream.add_track(track),
            None => self.remote_stream = Some(RemoteStream::new(track)),
        }
    }

    /// Закрыть соединение. Link после этого не используется.
    pub(crate) async fn close(mut self) {
        self.transition(NegotiationState::Closed);
        self.pending_remote_candidates.clear();
        self.pending_local_candidates.clear();
        if let Err(e) = self.connection.close().await {
            warn!("Failed to close connection to {}: {:?}", self.peer_id, e);
        }
    }

    fn matches_remote_session(&self, candidate: &IceCandidate) -> bool {
        match (&self.remote_ufrag, &candidate.username_fragment) {
            (Some(expected), Some(actual)) => expected == actual,
            _ => true,
        }
    }

    async fn apply_candidate(&self, candidate: IceCandidate) {
        if let Err(e) = self.connection.add_ice_candidate(candidate).await {
            warn!("Failed to add ICE candidate for {}: {:?}", self.peer_id, e);
        }
    }
}
