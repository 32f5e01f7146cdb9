use crate::media::LocalMediaSession;
use crate::mesh::{MeshCommand, MeshInbox, MeshSnapshot, NegotiationState, PeerLink};
use crate::signaling::SignalingOutput;
use crate::transport::{ConnectionFactory, ConnectionState, LinkEvents, TransportEvent};
use meshcall_core::{IceCandidate, Membership, Participant, PeerId, SessionDescription};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// Оркестратор mesh-соединений одного клиента в одной комнате.
///
/// Вся работа с `links` и `participants` идет внутри `run`: команды relay,
/// события соединений и завершения фоновых задач согласования
/// обрабатываются строго по одному.
pub struct Mesh {
    membership: Membership,
    local_id: Option<PeerId>,
    links: HashMap<PeerId, PeerLink>,
    participants: Vec<Participant>,
    media: Arc<LocalMediaSession>,
    connections: Arc<dyn ConnectionFactory>,
    signaling: Arc<dyn SignalingOutput>,
    command_rx: mpsc::Receiver<MeshCommand>,
    transport_rx: mpsc::UnboundedReceiver<TransportEvent>,
    transport_tx: mpsc::UnboundedSender<TransportEvent>,
    snapshot_tx: watch::Sender<MeshSnapshot>,
    next_generation: u64,
    signaling_connected: bool,
    left: bool,
}

impl Mesh {
    pub fn new(
        membership: Membership,
        inbox: MeshInbox,
        signaling: Arc<dyn SignalingOutput>,
        connections: Arc<dyn ConnectionFactory>,
        media: Arc<LocalMediaSession>,
    ) -> Self {
        let (transport_tx, transport_rx) = mpsc::unbounded_channel();

        Self {
            membership,
            local_id: None,
            links: HashMap::new(),
            participants: Vec::new(),
            media,
            connections,
            signaling,
            command_rx: inbox.commands,
            transport_rx,
            transport_tx,
            snapshot_tx: inbox.snapshot,
            next_generation: 0,
            signaling_connected: false,
            left: false,
        }
    }

    pub async fn run(mut self) {
        info!("Mesh event loop started for room {}", self.membership.room_id);

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(MeshCommand::Leave { done }) => {
                            self.leave().await;
                            let _ = done.send(());
                            break;
                        }
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("Command channel closed. Leaving room.");
                            self.leave().await;
                            break;
                        }
                    }
                }

                // transport_tx живет в self, поэтому канал не закрывается.
                Some(evt) = self.transport_rx.recv() => {
                    self.handle_transport_event(evt).await;
                }
            }
        }

        info!("Mesh event loop finished");
    }

    async fn handle_command(&mut self, cmd: MeshCommand) {
        match cmd {
            MeshCommand::Welcome { self_id } => {
                info!("Relay assigned local id {}", self_id);
                self.local_id = Some(self_id);
                self.publish();
            }

            MeshCommand::SignalingStatus { connected } => {
                self.on_signaling_status(connected).await;
            }

            MeshCommand::ParticipantJoined { peer_id, username } => {
                self.on_participant_joined(peer_id, username).await;
            }

            MeshCommand::OfferReceived {
                from,
                username,
                offer,
            } => {
                self.on_offer_received(from, username, offer).await;
            }

            MeshCommand::AnswerReceived { from, answer } => {
                self.on_answer_received(from, answer).await;
            }

            MeshCommand::IceCandidateReceived { from, candidate } => {
                let Some(link) = self.links.get_mut(&from) else {
                    debug!("Dropping ICE candidate from unknown peer {}", from);
                    return;
                };
                link.add_remote_candidate(candidate).await;
            }

            MeshCommand::ParticipantLeft { peer_id } => {
                info!("User {} left the room", peer_id);
                self.teardown_peer(&peer_id).await;
            }

            MeshCommand::Leave { done } => {
                self.leave().await;
                let _ = done.send(());
            }
        }
    }

    async fn on_signaling_status(&mut self, connected: bool) {
        self.signaling_connected = connected;

        if connected {
            info!("Signaling connected, joining room {}", self.membership.room_id);
            if let Err(e) = self
                .signaling
                .join_room(
                    self.membership.room_id.clone(),
                    self.membership.username.clone(),
                )
                .await
            {
                warn!("Failed to send join-room: {}", e);
            }
        } else {
            warn!("Signaling disconnected, existing peer connections are kept");
        }

        self.publish();
    }

    async fn on_participant_joined(&mut self, peer_id: PeerId, username: String) {
        if self.is_self(&peer_id) {
            debug!("Ignoring user-connected for ourselves");
            return;
        }

        self.upsert_participant(&peer_id, &username);

        if self.links.get(&peer_id).is_some_and(|l| !l.is_closed()) {
            debug!("Link to {} already exists, ignoring duplicate announcement", peer_id);
            self.publish();
            return;
        }

        info!("User {} ({}) joined, sending offer", peer_id, username);

        if let Some(mut link) = self.open_link(&peer_id).await {
            link.transition(NegotiationState::OfferSent);
            spawn_offer(&self.transport_tx, &link);
            self.links.insert(peer_id, link);
        }

        self.publish();
    }

    async fn on_offer_received(
        &mut self,
        from: PeerId,
        username: String,
        offer: SessionDescription,
    ) {
        if self.is_self(&from) {
            debug!("Ignoring offer addressed from ourselves");
            return;
        }

        self.upsert_participant(&from, &username);

        let replace = match self.links.get(&from).map(|l| l.state()) {
            Some(NegotiationState::OfferSent) if !self.remote_offer_wins(&from) => {
                info!("Glare with {}: our offer wins, ignoring theirs", from);
                self.publish();
                return;
            }
            Some(NegotiationState::OfferSent) => {
                info!("Glare with {}: their offer wins, answering instead", from);
                true
            }
            Some(NegotiationState::Idle) | None => false,
            Some(state) => {
                info!("New offer from {} while {:?}, replacing link", from, state);
                true
            }
        };

        if replace {
            self.discard_link(&from).await;
        }

        let link = match self.links.remove(&from) {
            Some(link) => Some(link),
            None => self.open_link(&from).await,
        };

        if let Some(mut link) = link {
            link.transition(NegotiationState::OfferReceived);
            link.expect_remote_ufrag(offer.ice_ufrag());
            spawn_apply_offer(&self.transport_tx, &link, offer);
            self.links.insert(from, link);
        }

        self.publish();
    }

    async fn on_answer_received(&mut self, from: PeerId, answer: SessionDescription) {
        let connection = match self.links.get(&from) {
            Some(link) if link.state() == NegotiationState::OfferSent => link.connection(),
            Some(link) => {
                warn!("Dropping answer from {} in state {:?}", from, link.state());
                return;
            }
            None => {
                warn!("Dropping answer from unknown peer {}", from);
                return;
            }
        };

        let ufrag = answer.ice_ufrag().map(str::to_owned);
        if let Err(e) = connection.set_remote_description(answer).await {
            error!("Failed to apply answer from {}: {:?}", from, e);
            self.teardown_peer(&from).await;
            return;
        }

        let Some(link) = self.links.get_mut(&from) else {
            return;
        };
        link.expect_remote_ufrag(ufrag.as_deref());
        link.mark_remote_description_set().await;
        link.transition(NegotiationState::Connected);
        info!("Negotiation with {} complete", from);

        self.publish();
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        if !self.is_live(event.peer_id(), event.generation()) {
            debug!(
                "Discarding stale transport event for {} (generation {})",
                event.peer_id(),
                event.generation()
            );
            return;
        }

        match event {
            TransportEvent::StateChanged { peer_id, state, .. } => {
                self.on_connection_state(peer_id, state).await;
            }

            TransportEvent::TrackAdded { peer_id, track, .. } => {
                if let Some(link) = self.links.get_mut(&peer_id) {
                    link.record_track(track);
                }
                self.publish();
            }

            TransportEvent::CandidateGenerated {
                peer_id, candidate, ..
            } => {
                self.forward_local_candidate(peer_id, candidate).await;
            }

            TransportEvent::RemoteOfferApplied {
                peer_id, result, ..
            } => {
                let Some(link) = self.links.get_mut(&peer_id) else {
                    return;
                };
                if link.state() != NegotiationState::OfferReceived {
                    debug!("Offer applied for {} in state {:?}, ignoring", peer_id, link.state());
                    return;
                }
                match result {
                    Ok(()) => {
                        link.mark_remote_description_set().await;
                        spawn_answer(&self.transport_tx, link);
                    }
                    Err(e) => {
                        error!("Failed to apply offer from {}: {:?}", peer_id, e);
                        self.teardown_peer(&peer_id).await;
                    }
                }
            }

            TransportEvent::OfferCreated {
                peer_id, result, ..
            } => {
                if !self.in_state(&peer_id, NegotiationState::OfferSent) {
                    debug!("Offer for {} is no longer needed", peer_id);
                    return;
                }
                match result {
                    Ok(offer) => {
                        info!("Sending offer to {}", peer_id);
                        if let Err(e) = self.signaling.send_offer(peer_id.clone(), offer).await {
                            warn!("Failed to send offer to {}: {}", peer_id, e);
                        }
                        self.flush_local_candidates(&peer_id).await;
                    }
                    Err(e) => {
                        error!("Failed to create offer for {}: {:?}", peer_id, e);
                        self.teardown_peer(&peer_id).await;
                    }
                }
            }

            TransportEvent::AnswerCreated {
                peer_id, result, ..
            } => {
                if !self.in_state(&peer_id, NegotiationState::OfferReceived) {
                    debug!("Answer for {} is no longer needed", peer_id);
                    return;
                }
                match result {
                    Ok(answer) => {
                        if let Some(link) = self.links.get_mut(&peer_id) {
                            link.transition(NegotiationState::AnswerSent);
                        }
                        info!("Sending answer to {}", peer_id);
                        if let Err(e) = self.signaling.send_answer(peer_id.clone(), answer).await {
                            warn!("Failed to send answer to {}: {}", peer_id, e);
                        }
                        self.flush_local_candidates(&peer_id).await;
                        self.publish();
                    }
                    Err(e) => {
                        error!("Failed to create answer for {}: {:?}", peer_id, e);
                        self.teardown_peer(&peer_id).await;
                    }
                }
            }
        }
    }

    async fn on_connection_state(&mut self, peer_id: PeerId, state: ConnectionState) {
        if state.is_terminal() {
            warn!("Connection to {} is {:?}, removing peer", peer_id, state);
            self.teardown_peer(&peer_id).await;
            return;
        }

        if state != ConnectionState::Connected {
            return;
        }

        let Some(link) = self.links.get_mut(&peer_id) else {
            return;
        };
        if link.state() == NegotiationState::AnswerSent {
            link.transition(NegotiationState::Connected);
            info!("Negotiation with {} complete", peer_id);
            self.publish();
        }
    }

    async fn forward_local_candidate(&mut self, peer_id: PeerId, candidate: IceCandidate) {
        let Some(link) = self.links.get_mut(&peer_id) else {
            return;
        };
        let Some(candidate) = link.outgoing_candidate(candidate) else {
            debug!("Holding local ICE candidate for {} until description is sent", peer_id);
            return;
        };
        self.send_ice(&peer_id, candidate).await;
    }

    async fn flush_local_candidates(&mut self, peer_id: &PeerId) {
        let held = match self.links.get_mut(peer_id) {
            Some(link) => link.mark_local_description_sent(),
            None => return,
        };
        for candidate in held {
            self.send_ice(peer_id, candidate).await;
        }
    }

    async fn send_ice(&self, peer_id: &PeerId, candidate: IceCandidate) {
        if let Err(e) = self.signaling.send_ice(peer_id.clone(), candidate).await {
            debug!("Failed to send ICE candidate to {}: {}", peer_id, e);
        }
    }

    /// Новый link в состоянии Idle со всеми локальными треками.
    /// При любой ошибке соединение закрывается и link не создается.
    async fn open_link(&mut self, peer_id: &PeerId) -> Option<PeerLink> {
        self.next_generation += 1;
        let generation = self.next_generation;

        let events = LinkEvents::new(peer_id.clone(), generation, self.transport_tx.clone());
        let connection = match self.connections.create(events).await {
            Ok(connection) => connection,
            Err(e) => {
                error!("Failed to create connection for {}: {:?}", peer_id, e);
                return None;
            }
        };

        for track in self.media.tracks() {
            if let Err(e) = connection.add_track(track.clone()).await {
                error!("Failed to attach local track for {}: {:?}", peer_id, e);
                if let Err(e) = connection.close().await {
                    warn!("Failed to close connection to {}: {:?}", peer_id, e);
                }
                return None;
            }
        }

        debug!("Opened link to {} (generation {})", peer_id, generation);
        Some(PeerLink::new(peer_id.clone(), generation, connection))
    }

    async fn discard_link(&mut self, peer_id: &PeerId) {
        if let Some(link) = self.links.remove(peer_id) {
            link.close().await;
        }
    }

    async fn teardown_peer(&mut self, peer_id: &PeerId) {
        self.discard_link(peer_id).await;

        let before = self.participants.len();
        self.participants.retain(|p| &p.id != peer_id);
        if self.participants.len() != before {
            info!("Participant {} removed", peer_id);
        }

        self.publish();
    }

    async fn leave(&mut self) {
        if self.left {
            debug!("Already left room {}", self.membership.room_id);
            return;
        }

        info!("Leaving room {}", self.membership.room_id);

        for (_, link) in self.links.drain() {
            link.close().await;
        }
        self.participants.clear();
        self.media.stop();

        if let Err(e) = self.signaling.leave_room().await {
            debug!("leave-room was not delivered: {}", e);
        }
        self.signaling.disconnect().await;

        self.left = true;
        self.signaling_connected = false;
        self.publish();
    }

    fn upsert_participant(&mut self, peer_id: &PeerId, username: &str) {
        match self.participants.iter_mut().find(|p| &p.id == peer_id) {
            Some(existing) => {
                if existing.username != username {
                    existing.username = username.to_owned();
                }
            }
            None => self.participants.push(Participant::new(peer_id.clone(), username)),
        }
    }

    fn is_self(&self, peer_id: &PeerId) -> bool {
        self.local_id.as_ref() == Some(peer_id)
    }

    /// Glare: побеждает offer участника с большим id.
    fn remote_offer_wins(&self, remote: &PeerId) -> bool {
        match &self.local_id {
            Some(local) => remote > local,
            None => {
                warn!("Glare with {} before local id is known, yielding", remote);
                true
            }
        }
    }

    fn is_live(&self, peer_id: &PeerId, generation: u64) -> bool {
        self.links
            .get(peer_id)
            .is_some_and(|l| l.generation() == generation && !l.is_closed())
    }

    fn in_state(&self, peer_id: &PeerId, state: NegotiationState) -> bool {
        self.links.get(peer_id).is_some_and(|l| l.state() == state)
    }

    fn publish(&self) {
        let snapshot = MeshSnapshot {
            local_id: self.local_id.clone(),
            participants: self.participants.clone(),
            remote_streams: self
                .links
                .iter()
                .filter_map(|(id, l)| l.remote_stream().map(|s| (id.clone(), s.clone())))
                .collect(),
            links: self
                .links
                .iter()
                .map(|(id, l)| (id.clone(), l.state()))
                .collect(),
            signaling_connected: self.signaling_connected,
            left: self.left,
        };
        self.snapshot_tx.send_replace(snapshot);
    }
}

fn spawn_offer(tx: &mpsc::UnboundedSender<TransportEvent>, link: &PeerLink) {
    let connection = link.connection();
    let peer_id = link.peer_id().clone();
    let generation = link.generation();
    let tx = tx.clone();

    tokio::spawn(async move {
        let result: anyhow::Result<SessionDescription> = async {
            let offer = connection.create_offer().await?;
            connection.set_local_description(offer.clone()).await?;
            Ok(offer)
        }
        .await;

        let _ = tx.send(TransportEvent::OfferCreated {
            peer_id,
            generation,
            result,
        });
    });
}

fn spawn_apply_offer(
    tx: &mpsc::UnboundedSender<TransportEvent>,
    link: &PeerLink,
    offer: SessionDescription,
) {
    let connection = link.connection();
    let peer_id = link.peer_id().clone();
    let generation = link.generation();
    let tx = tx.clone();

    tokio::spawn(async move {
        let result = connection.set_remote_description(offer).await;
        let _ = tx.send(TransportEvent::RemoteOfferApplied {
            peer_id,
            generation,
            result,
        });
    });
}

fn spawn_answer(tx: &mpsc::UnboundedSender<TransportEvent>, link: &PeerLink) {
    let connection = link.connection();
    let peer_id = link.peer_id().clone();
    let generation = link.generation();
    let tx = tx.clone();

    tokio::spawn(async move {
        let result: anyhow::Result<SessionDescription> = async {
            let answer = connection.create_answer().await?;
            connection.set_local_description(answer.clone()).await?;
            Ok(answer)
        }
        .await;

        let _ = tx.send(TransportEvent::AnswerCreated {
            peer_id,
            generation,
            result,
        });
    });
}
