use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

/// Локальный трек захвата.
///
/// Трек разделяется между всеми PeerLink: они только читают флаг `enabled`,
/// меняет его исключительно `LocalMediaSession`. Выключенный трек продолжает
/// передаваться, но несет тишину или черные кадры.
#[derive(Debug)]
pub struct LocalTrack {
    id: String,
    stream_id: String,
    kind: MediaKind,
    label: String,
    enabled: AtomicBool,
    ended: watch::Sender<bool>,
}

impl LocalTrack {
    pub fn new(kind: MediaKind, label: impl Into<String>, stream_id: impl Into<String>) -> Arc<Self> {
        let (ended, _) = watch::channel(false);
        Arc::new(Self {
            id: Uuid::new_v4().to_string(),
            stream_id: stream_id.into(),
            kind,
            label: label.into(),
            enabled: AtomicBool::new(true),
            ended,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    pub fn is_ended(&self) -> bool {
        *self.ended.borrow()
    }

    /// Остановить трек. Вызывается и нами при освобождении ресурсов, и
    /// бэкендом захвата, когда источник пропал сам. Повторный вызов ничего не делает.
    pub fn stop(&self) {
        let changed = self.ended.send_if_modified(|ended| {
            if *ended {
                return false;
            }
            *ended = true;
            true
        });
        if changed {
            debug!("Track {} ({}) ended", self.id, self.label);
        }
    }

    /// Дождаться окончания трека.
    pub async fn ended(&self) {
        let mut rx = self.ended.subscribe();
        // Отправитель живет вместе с треком, поэтому ошибка здесь невозможна.
        let _ = rx.wait_for(|ended| *ended).await;
    }
}
