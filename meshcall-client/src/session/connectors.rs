use crate::chat::{ChatHandle, ChatOutput, WsChat};
use crate::mesh::MeshHandle;
use crate::session::SessionConfig;
use crate::signaling::{SignalingOutput, WsSignaling};
use std::sync::Arc;

/// Поднимает сигнальный транспорт, доставляющий события в Mesh.
pub trait SignalingConnector: Send + Sync {
    fn connect(&self, config: &SessionConfig, mesh: MeshHandle) -> Arc<dyn SignalingOutput>;
}

/// Поднимает транспорт чата, доставляющий события в синхронизатор.
pub trait ChatConnector: Send + Sync {
    fn connect(&self, config: &SessionConfig, chat: ChatHandle) -> Arc<dyn ChatOutput>;
}

/// WebSocket-relay для обоих каналов.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl SignalingConnector for WsConnector {
    fn connect(&self, config: &SessionConfig, mesh: MeshHandle) -> Arc<dyn SignalingOutput> {
        Arc::new(WsSignaling::connect(
            config.signaling_url.clone(),
            config.reconnect.clone(),
            mesh,
        ))
    }
}

impl ChatConnector for WsConnector {
    fn connect(&self, config: &SessionConfig, chat: ChatHandle) -> Arc<dyn ChatOutput> {
        Arc::new(WsChat::connect(
            config.chat_url.clone(),
            config.reconnect.clone(),
            chat,
        ))
    }
}
