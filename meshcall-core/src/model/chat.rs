use crate::model::room::RoomId;
use crate::utils::SYSTEM_AUTHOR;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Сообщение чата. Неизменяемо после создания; порядок задает сервер, а не `timestamp`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: String,
    #[serde(rename = "username")]
    pub author: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Локально синтезированное системное сообщение.
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            id: format!("system-{}", Uuid::new_v4()),
            author: SYSTEM_AUTHOR.to_owned(),
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn is_system(&self) -> bool {
        self.id.starts_with("system-") && self.author == SYSTEM_AUTHOR
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ChatClientMessage {
    JoinRoom {
        room_id: RoomId,
        username: String,
    },
    SendMessage {
        room_id: RoomId,
        username: String,
        text: String,
    },
    LeaveRoom {},
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ChatServerMessage {
    MessageHistory(Vec<ChatMessage>),
    Message(ChatMessage),
    UserJoined { username: String },
    UserLeft { username: String },
}
