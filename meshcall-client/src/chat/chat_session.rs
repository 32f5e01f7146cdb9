use meshcall_core::{ChatMessage, ChatServerMessage};
use tracing::debug;

/// История чата в порядке доставки relay и флаг подключения.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatSession {
    pub history: Vec<ChatMessage>,
    pub connected: bool,
}

impl ChatSession {
    /// Применить входящее событие. Возвращает `false`, если оно отброшено.
    ///
    /// Порядок relay авторитетен: история заменяется целиком, одиночные
    /// сообщения дописываются в конец, ничего не сортируется и не дедуплицируется.
    pub fn apply(&mut self, msg: ChatServerMessage, own_username: &str) -> bool {
        if !self.connected {
            debug!("Chat is disconnected, dropping {:?}", msg);
            return false;
        }

        match msg {
            ChatServerMessage::MessageHistory(history) => {
                debug!("Received chat history of {} messages", history.len());
                self.history = history;
            }
            ChatServerMessage::Message(message) => self.history.push(message),
            ChatServerMessage::UserJoined { username } => {
                if username == own_username {
                    return false;
                }
                self.history
                    .push(ChatMessage::system(format!("{} joined the room", username)));
            }
            ChatServerMessage::UserLeft { username } => {
                if username == own_username {
                    return false;
                }
                self.history
                    .push(ChatMessage::system(format!("{} left the room", username)));
            }
        }
        true
    }
}
