use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Идентификатор участника, назначенный сигнальным relay-сервером.
///
/// Порядок сравнения лексикографический: он же используется для детерминированного
/// разрешения glare (побеждает offer участника с большим id).
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct PeerId(pub String);

impl PeerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PeerId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for PeerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Участник комнаты, видимый локальному клиенту.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct Participant {
    pub id: PeerId,
    pub username: String,
}

impl Participant {
    pub fn new(id: PeerId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }
}
