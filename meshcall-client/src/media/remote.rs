use crate::media::MediaKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    pub id: String,
    pub stream_id: String,
    pub kind: MediaKind,
}

/// Медиапоток удаленного участника, собранный из пришедших треков.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStream {
    pub stream_id: String,
    pub tracks: Vec<RemoteTrack>,
}

impl RemoteStream {
    pub fn new(track: RemoteTrack) -> Self {
        Self {
            stream_id: track.stream_id.clone(),
            tracks: vec![track],
        }
    }

    /// Трек из того же потока добавляется к нему, трек из другого потока
    /// заменяет поток целиком.
    pub fn add_track(&mut self, track: RemoteTrack) {
        if track.stream_id != self.stream_id {
            *self = Self::new(track);
            return;
        }
        if self.tracks.iter().any(|t| t.id == track.id) {
            return;
        }
        self.tracks.push(track);
    }

    pub fn has_kind(&self, kind: MediaKind) -> bool {
        self.tracks.iter().any(|t| t.kind == kind)
    }
}
