use crate::chat::{ChatError, ChatHandle, ChatSynchronizer};
use crate::media::{LocalMediaSession, MediaDevices, MediaError, MediaStream, ScreenShareSession};
use crate::mesh::{Mesh, MeshHandle};
use crate::session::{ChatConnector, SessionConfig, SessionError, SignalingConnector, WsConnector};
use crate::transport::{ConnectionFactory, WebRtcConnectionFactory};
use meshcall_core::Membership;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// Внешние зависимости сессии: захват медиа, соединения и оба relay.
pub struct SessionParts {
    pub devices: Arc<dyn MediaDevices>,
    pub connections: Arc<dyn ConnectionFactory>,
    pub signaling: Arc<dyn SignalingConnector>,
    pub chat: Arc<dyn ChatConnector>,
}

/// Пребывание в одной комнате: медиа, mesh, чат и демонстрация экрана.
pub struct Session {
    membership: Membership,
    media: Arc<LocalMediaSession>,
    mesh: MeshHandle,
    chat: ChatHandle,
    screen_share: ScreenShareSession,
    left: AtomicBool,
}

impl Session {
    /// Войти в комнату через WebSocket-relay и `webrtc`.
    pub async fn connect(
        config: SessionConfig,
        devices: Arc<dyn MediaDevices>,
    ) -> Result<Self, SessionError> {
        let parts = SessionParts {
            devices,
            connections: Arc::new(WebRtcConnectionFactory::new(config.transport.clone())),
            signaling: Arc::new(WsConnector),
            chat: Arc::new(WsConnector),
        };
        Self::join(config, parts).await
    }

    /// Сначала захватывается медиа: если это не удалось, ни mesh, ни чат
    /// не создаются.
    pub async fn join(config: SessionConfig, parts: SessionParts) -> Result<Self, SessionError> {
        config.validate()?;
        let membership = config.membership();
        info!(
            "Joining room {} as {}",
            membership.room_id, membership.username
        );

        let media = LocalMediaSession::acquire(parts.devices.as_ref(), &config.media).await?;
        let media = Arc::new(media);

        let (mesh, mesh_inbox) = MeshHandle::channel();
        let signaling = parts.signaling.connect(&config, mesh.clone());
        let orchestrator = Mesh::new(
            membership.clone(),
            mesh_inbox,
            signaling,
            parts.connections,
            media.clone(),
        );
        tokio::spawn(orchestrator.run());

        let (chat, chat_inbox) = ChatHandle::channel();
        let chat_output = parts.chat.connect(&config, chat.clone());
        tokio::spawn(ChatSynchronizer::new(membership.clone(), chat_inbox, chat_output).run());

        let screen_share = ScreenShareSession::new(parts.devices, config.display.clone());

        Ok(Self {
            membership,
            media,
            mesh,
            chat,
            screen_share,
            left: AtomicBool::new(false),
        })
    }

    pub fn membership(&self) -> &Membership {
        &self.membership
    }

    pub fn mesh(&self) -> &MeshHandle {
        &self.mesh
    }

    pub fn chat(&self) -> &ChatHandle {
        &self.chat
    }

    pub fn media(&self) -> &Arc<LocalMediaSession> {
        &self.media
    }

    pub fn screen_share(&self) -> &ScreenShareSession {
        &self.screen_share
    }

    pub fn toggle_audio(&self) -> bool {
        self.media.toggle_audio()
    }

    pub fn toggle_video(&self) -> bool {
        self.media.toggle_video()
    }

    pub async fn start_screen_share(&self) -> Result<MediaStream, MediaError> {
        self.screen_share.start().await
    }

    pub async fn stop_screen_share(&self) {
        self.screen_share.stop().await;
    }

    pub async fn send_message(&self, text: impl Into<String>) -> Result<(), ChatError> {
        self.chat.send_message(text).await
    }

    /// Выйти из комнаты. Повторный вызов ничего не делает.
    pub async fn leave(&self) {
        if self.left.swap(true, Ordering::SeqCst) {
            return;
        }

        self.screen_share.stop().await;
        self.mesh.leave().await;
        self.chat.leave().await;
        info!("Left room {}", self.membership.room_id);
    }
}
