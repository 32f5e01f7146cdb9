use serde::{Deserialize, Serialize};
use std::fmt;

/// Идентификатор комнаты. Выдается снаружи (ссылка-приглашение), поэтому это
/// произвольная строка, а не UUID.
#[derive(Debug, Serialize, Deserialize, Clone, Default, Hash, Eq, PartialEq)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for RoomId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Под каким именем и в какой комнате находится локальный участник.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub room_id: RoomId,
    pub username: String,
}

impl Membership {
    pub fn new(room_id: impl Into<RoomId>, username: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            username: username.into(),
        }
    }
}
