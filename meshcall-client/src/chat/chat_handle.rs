use crate::chat::{ChatError, ChatSession};
use crate::signaling::{RelayEvent, RelaySink};
use async_trait::async_trait;
use meshcall_core::ChatServerMessage;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error};

const EVENT_CHANNEL_CAPACITY: usize = 100;

/// События, которые обрабатывает цикл [`ChatSynchronizer`](crate::chat::ChatSynchronizer).
#[derive(Debug)]
pub enum ChatEvent {
    Connected,
    Disconnected,
    Server(ChatServerMessage),
    Send {
        text: String,
        reply: oneshot::Sender<Result<(), ChatError>>,
    },
    Leave {
        done: oneshot::Sender<()>,
    },
}

#[derive(Clone)]
pub struct ChatHandle {
    events: mpsc::Sender<ChatEvent>,
    snapshot: watch::Receiver<ChatSession>,
}

pub struct ChatInbox {
    pub(crate) events: mpsc::Receiver<ChatEvent>,
    pub(crate) snapshot: watch::Sender<ChatSession>,
}

impl ChatHandle {
    pub fn channel() -> (ChatHandle, ChatInbox) {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(ChatSession::default());

        (
            ChatHandle {
                events: events_tx,
                snapshot: snapshot_rx,
            },
            ChatInbox {
                events: events_rx,
                snapshot: snapshot_tx,
            },
        )
    }

    pub async fn deliver(&self, event: ChatEvent) -> bool {
        if let Err(e) = self.events.send(event).await {
            error!("Chat is gone, dropping event: {:?}", e.0);
            return false;
        }
        true
    }

    pub async fn send_message(&self, text: impl Into<String>) -> Result<(), ChatError> {
        let (reply, reply_rx) = oneshot::channel();
        let event = ChatEvent::Send {
            text: text.into(),
            reply,
        };
        if self.events.send(event).await.is_err() {
            return Err(ChatError::NotConnected);
        }
        reply_rx.await.unwrap_or(Err(ChatError::NotConnected))
    }

    /// Выйти из чата. Повторный вызов ничего не делает.
    pub async fn leave(&self) {
        let (done, done_rx) = oneshot::channel();
        if self.events.send(ChatEvent::Leave { done }).await.is_err() {
            debug!("Chat already stopped, nothing to leave");
            return;
        }
        let _ = done_rx.await;
    }

    pub fn snapshot(&self) -> ChatSession {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ChatSession> {
        self.snapshot.clone()
    }

    pub async fn wait_until(
        &self,
        predicate: impl FnMut(&ChatSession) -> bool,
    ) -> Option<ChatSession> {
        let mut rx = self.snapshot.clone();
        let snapshot = rx.wait_for(predicate).await.ok()?;
        Some(snapshot.clone())
    }
}

#[async_trait]
impl RelaySink<ChatServerMessage> for ChatHandle {
    async fn deliver(&self, event: RelayEvent<ChatServerMessage>) -> bool {
        let event = match event {
            RelayEvent::Connected => ChatEvent::Connected,
            RelayEvent::Disconnected => ChatEvent::Disconnected,
            RelayEvent::Message(msg) => ChatEvent::Server(msg),
        };
        ChatHandle::deliver(self, event).await
    }
}
