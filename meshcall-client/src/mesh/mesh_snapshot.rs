use crate::media::RemoteStream;
use crate::mesh::NegotiationState;
use meshcall_core::{Participant, PeerId};
use std::collections::BTreeMap;

/// Состояние Mesh, видимое снаружи. Публикуется после каждого изменения.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshSnapshot {
    pub local_id: Option<PeerId>,
    /// Участники в порядке появления.
    pub participants: Vec<Participant>,
    pub remote_streams: BTreeMap<PeerId, RemoteStream>,
    pub links: BTreeMap<PeerId, NegotiationState>,
    pub signaling_connected: bool,
    pub left: bool,
}

impl MeshSnapshot {
    pub fn participant(&self, peer_id: &PeerId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == peer_id)
    }

    pub fn link_state(&self, peer_id: &PeerId) -> Option<NegotiationState> {
        self.links.get(peer_id).copied()
    }
}
