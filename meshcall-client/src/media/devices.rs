use crate::media::{
    DisplayConstraints, LocalTrack, MediaConstraints, MediaError, MediaKind, MediaStream,
};
use async_trait::async_trait;
use tracing::info;

/// Подсистема захвата (камера, микрофон, экран).
#[async_trait]
pub trait MediaDevices: Send + Sync {
    async fn get_user_media(&self, constraints: &MediaConstraints)
    -> Result<MediaStream, MediaError>;

    async fn get_display_media(
        &self,
        constraints: &DisplayConstraints,
    ) -> Result<MediaStream, MediaError>;
}

/// Захват без реального железа: треки существуют, но несут тишину и черные кадры.
/// Используется headless-клиентом и в тестах.
#[derive(Debug, Clone)]
pub struct SyntheticDevices {
    pub camera: bool,
    pub microphone: bool,
    pub display: bool,
    /// Имитировать отказ пользователя в доступе.
    pub deny_permission: bool,
}

impl Default for SyntheticDevices {
    fn default() -> Self {
        Self {
            camera: true,
            microphone: true,
            display: true,
            deny_permission: false,
        }
    }
}

#[async_trait]
impl MediaDevices for SyntheticDevices {
    async fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<MediaStream, MediaError> {
        if self.deny_permission {
            return Err(MediaError::PermissionDenied(
                "camera/microphone access denied".into(),
            ));
        }
        if constraints.audio.is_none() && constraints.video.is_none() {
            return Err(MediaError::Other(
                "at least one of audio or video must be requested".into(),
            ));
        }

        let stream_id = MediaStream::new_id();
        let mut tracks = Vec::new();

        if constraints.audio.is_some() {
            if !self.microphone {
                return Err(MediaError::NoDevice("no microphone found".into()));
            }
            tracks.push(LocalTrack::new(
                MediaKind::Audio,
                "synthetic microphone",
                stream_id.clone(),
            ));
        }
        if let Some(video) = &constraints.video {
            if !self.camera {
                return Err(MediaError::NoDevice("no camera found".into()));
            }
            tracks.push(LocalTrack::new(
                MediaKind::Video,
                format!("synthetic camera {}x{}", video.ideal_width, video.ideal_height),
                stream_id.clone(),
            ));
        }

        info!("Synthetic user media acquired ({} tracks)", tracks.len());
        Ok(MediaStream::from_tracks(stream_id, tracks))
    }

    async fn get_display_media(
        &self,
        constraints: &DisplayConstraints,
    ) -> Result<MediaStream, MediaError> {
        if self.deny_permission {
            return Err(MediaError::PermissionDenied(
                "screen capture access denied".into(),
            ));
        }
        if !self.display {
            return Err(MediaError::NoDevice("no screen found to share".into()));
        }

        let stream_id = MediaStream::new_id();
        let mut tracks = vec![LocalTrack::new(
            MediaKind::Video,
            "synthetic screen",
            stream_id.clone(),
        )];
        if constraints.audio.is_some() {
            tracks.push(LocalTrack::new(
                MediaKind::Audio,
                "synthetic system audio",
                stream_id.clone(),
            ));
        }

        Ok(MediaStream::from_tracks(stream_id, tracks))
    }
}
