use crate::media::{LocalTrack, MediaKind};
use std::sync::Arc;
use uuid::Uuid;

/// Набор локальных треков одного захвата (камера+микрофон или экран).
#[derive(Debug, Clone)]
pub struct MediaStream {
    id: String,
    tracks: Vec<Arc<LocalTrack>>,
}

impl MediaStream {
    pub fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn from_tracks(id: impl Into<String>, tracks: Vec<Arc<LocalTrack>>) -> Self {
        Self {
            id: id.into(),
            tracks,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tracks(&self) -> &[Arc<LocalTrack>] {
        &self.tracks
    }

    pub fn audio_tracks(&self) -> impl Iterator<Item = &Arc<LocalTrack>> {
        self.tracks_of(MediaKind::Audio)
    }

    pub fn video_tracks(&self) -> impl Iterator<Item = &Arc<LocalTrack>> {
        self.tracks_of(MediaKind::Video)
    }

    fn tracks_of(&self, kind: MediaKind) -> impl Iterator<Item = &Arc<LocalTrack>> {
        self.tracks.iter().filter(move |t| t.kind() == kind)
    }

    pub fn stop(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }

    pub fn is_ended(&self) -> bool {
        self.tracks.iter().all(|t| t.is_ended())
    }
}
