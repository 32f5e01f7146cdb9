use crate::media::{DisplayConstraints, MediaDevices, MediaError, MediaStream};
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

struct ScreenShareInner {
    devices: Arc<dyn MediaDevices>,
    constraints: DisplayConstraints,
    current: Mutex<Option<MediaStream>>,
    status: watch::Sender<Option<MediaStream>>,
}

/// Демонстрация экрана.
///
/// Поток показывается только локально, поверх остальных плиток: в существующие
/// соединения он не добавляется и пирам не передается.
#[derive(Clone)]
pub struct ScreenShareSession {
    inner: Arc<ScreenShareInner>,
}

impl ScreenShareSession {
    pub fn new(devices: Arc<dyn MediaDevices>, constraints: DisplayConstraints) -> Self {
        let (status, _) = watch::channel(None);
        Self {
            inner: Arc::new(ScreenShareInner {
                devices,
                constraints,
                current: Mutex::new(None),
                status,
            }),
        }
    }

    /// Начать демонстрацию. Если она уже идет, возвращает текущий поток.
    pub async fn start(&self) -> Result<MediaStream, MediaError> {
        let mut current = self.inner.current.lock().await;
        if let Some(stream) = current.as_ref() {
            debug!("Screen sharing already active ({})", stream.id());
            return Ok(stream.clone());
        }

        let stream = self
            .inner
            .devices
            .get_display_media(&self.inner.constraints)
            .await?;

        self.watch_source(&stream);
        *current = Some(stream.clone());
        self.inner.status.send_replace(Some(stream.clone()));

        info!("Screen sharing started ({})", stream.id());
        Ok(stream)
    }

    /// Остановить демонстрацию. Без активного потока ничего не делает.
    pub async fn stop(&self) {
        let mut current = self.inner.current.lock().await;
        if let Some(stream) = current.take() {
            self.release(stream);
        }
    }

    pub fn is_active(&self) -> bool {
        self.inner.status.borrow().is_some()
    }

    pub fn stream(&self) -> Option<MediaStream> {
        self.inner.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<MediaStream>> {
        self.inner.status.subscribe()
    }

    /// Источник может пропасть сам (пользователь прекратил демонстрацию вне
    /// приложения): тогда демонстрация останавливается автоматически.
    fn watch_source(&self, stream: &MediaStream) {
        let Some(video) = stream.video_tracks().next().cloned() else {
            warn!("Screen capture {} has no video track", stream.id());
            return;
        };

        let session = self.clone();
        let stream_id = stream.id().to_owned();
        tokio::spawn(async move {
            video.ended().await;
            session.stop_stream(&stream_id).await;
        });
    }

    async fn stop_stream(&self, stream_id: &str) {
        let mut current = self.inner.current.lock().await;
        if !current.as_ref().is_some_and(|s| s.id() == stream_id) {
            return;
        }
        if let Some(stream) = current.take() {
            info!("Screen capture source {} ended", stream_id);
            self.release(stream);
        }
    }

    fn release(&self, stream: MediaStream) {
        stream.stop();
        self.inner.status.send_replace(None);
        info!("Screen sharing stopped ({})", stream.id());
    }
}
