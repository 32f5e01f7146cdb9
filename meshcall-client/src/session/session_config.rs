use crate::media::{DisplayConstraints, MediaConstraints};
use crate::session::SessionError;
use crate::signaling::ReconnectPolicy;
use crate::transport::TransportConfig;
use meshcall_core::{Membership, RoomId};
use serde::Deserialize;

pub const DEFAULT_SIGNALING_URL: &str = "ws://localhost:3001";
pub const DEFAULT_CHAT_URL: &str = "ws://localhost:3002";

/// Все, что нужно для входа в комнату.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub room_id: RoomId,
    pub username: String,
    pub signaling_url: String,
    pub chat_url: String,
    pub transport: TransportConfig,
    pub media: MediaConstraints,
    pub display: DisplayConstraints,
    pub reconnect: ReconnectPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            room_id: RoomId::default(),
            username: String::new(),
            signaling_url: DEFAULT_SIGNALING_URL.to_owned(),
            chat_url: DEFAULT_CHAT_URL.to_owned(),
            transport: TransportConfig::default(),
            media: MediaConstraints::default(),
            display: DisplayConstraints::default(),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl SessionConfig {
    pub fn new(room_id: impl Into<RoomId>, username: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            username: username.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if self.room_id.is_empty() {
            return Err(SessionError::InvalidConfig("room id is empty".into()));
        }
        if self.username.trim().is_empty() {
            return Err(SessionError::InvalidConfig("username is empty".into()));
        }
        Ok(())
    }

    pub fn membership(&self) -> Membership {
        Membership::new(self.room_id.clone(), self.username.trim())
    }
}
