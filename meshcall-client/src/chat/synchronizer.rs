use crate::chat::{ChatError, ChatEvent, ChatInbox, ChatOutput, ChatSession};
use meshcall_core::Membership;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Цикл синхронизации чата одной комнаты.
pub struct ChatSynchronizer {
    membership: Membership,
    session: ChatSession,
    output: Arc<dyn ChatOutput>,
    events_rx: mpsc::Receiver<ChatEvent>,
    snapshot_tx: watch::Sender<ChatSession>,
    left: bool,
}

impl ChatSynchronizer {
    pub fn new(membership: Membership, inbox: ChatInbox, output: Arc<dyn ChatOutput>) -> Self {
        Self {
            membership,
            session: ChatSession::default(),
            output,
            events_rx: inbox.events,
            snapshot_tx: inbox.snapshot,
            left: false,
        }
    }

    pub async fn run(mut self) {
        info!("Chat loop started for room {}", self.membership.room_id);

        while let Some(event) = self.events_rx.recv().await {
            if let ChatEvent::Leave { done } = event {
                self.leave().await;
                let _ = done.send(());
                break;
            }
            self.handle_event(event).await;
        }

        // Все ручки сброшены без явного leave.
        self.leave().await;
        info!("Chat loop finished");
    }

    async fn handle_event(&mut self, event: ChatEvent) {
        match event {
            ChatEvent::Connected => {
                info!("Chat connected, joining room {}", self.membership.room_id);
                self.session.connected = true;
                if let Err(e) = self
                    .output
                    .join_room(
                        self.membership.room_id.clone(),
                        self.membership.username.clone(),
                    )
                    .await
                {
                    warn!("Failed to send chat join-room: {}", e);
                }
                self.publish();
            }

            ChatEvent::Disconnected => {
                warn!("Chat disconnected");
                self.session.connected = false;
                self.publish();
            }

            ChatEvent::Server(msg) => {
                if self.session.apply(msg, &self.membership.username) {
                    self.publish();
                }
            }

            ChatEvent::Send { text, reply } => {
                let _ = reply.send(self.send(text).await);
            }

            ChatEvent::Leave { done } => {
                self.leave().await;
                let _ = done.send(());
            }
        }
    }

    async fn send(&self, text: String) -> Result<(), ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if !self.session.connected {
            return Err(ChatError::NotConnected);
        }

        self.output
            .send_message(
                self.membership.room_id.clone(),
                self.membership.username.clone(),
                text.to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn leave(&mut self) {
        if self.left {
            debug!("Already left chat");
            return;
        }

        if self.session.connected {
            if let Err(e) = self.output.leave_room().await {
                debug!("Chat leave-room was not delivered: {}", e);
            }
        }
        self.output.disconnect().await;

        self.session.connected = false;
        self.left = true;
        self.publish();
        info!("Left chat of room {}", self.membership.room_id);
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.session.clone());
    }
}
