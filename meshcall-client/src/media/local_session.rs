use crate::media::{LocalTrack, MediaConstraints, MediaDevices, MediaError, MediaStream};
use std::sync::Arc;
use tracing::info;

/// Локальные камера и микрофон на время пребывания в комнате.
///
/// Mute/unmute меняет только флаг `enabled` трека: трек остается прикрепленным
/// ко всем соединениям, повторного согласования не происходит.
#[derive(Debug)]
pub struct LocalMediaSession {
    stream: MediaStream,
    audio: Option<Arc<LocalTrack>>,
    video: Option<Arc<LocalTrack>>,
}

impl LocalMediaSession {
    pub async fn acquire(
        devices: &dyn MediaDevices,
        constraints: &MediaConstraints,
    ) -> Result<Self, MediaError> {
        let stream = devices.get_user_media(constraints).await?;
        Ok(Self::from_stream(stream))
    }

    pub fn from_stream(stream: MediaStream) -> Self {
        let audio = stream.audio_tracks().next().cloned();
        let video = stream.video_tracks().next().cloned();
        Self {
            stream,
            audio,
            video,
        }
    }

    pub fn stream(&self) -> &MediaStream {
        &self.stream
    }

    pub fn tracks(&self) -> &[Arc<LocalTrack>] {
        self.stream.tracks()
    }

    /// Возвращает новое значение `enabled` (false, если микрофона нет).
    pub fn toggle_audio(&self) -> bool {
        toggle(self.audio.as_ref())
    }

    /// Возвращает новое значение `enabled` (false, если камеры нет).
    pub fn toggle_video(&self) -> bool {
        toggle(self.video.as_ref())
    }

    pub fn audio_enabled(&self) -> bool {
        self.audio.as_ref().is_some_and(|t| t.is_enabled())
    }

    pub fn video_enabled(&self) -> bool {
        self.video.as_ref().is_some_and(|t| t.is_enabled())
    }

    pub fn stop(&self) {
        if self.stream.is_ended() {
            return;
        }
        self.stream.stop();
        info!("Local media stopped");
    }

    pub fn is_stopped(&self) -> bool {
        self.stream.is_ended()
    }
}

fn toggle(track: Option<&Arc<LocalTrack>>) -> bool {
    let Some(track) = track else {
        return false;
    };
    let enabled = !track.is_enabled();
    track.set_enabled(enabled);
    info!("{:?} track {} enabled={}", track.kind(), track.id(), enabled);
    enabled
}
