use meshcall_core::IceServerConfig;
use meshcall_core::utils::{DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2};
use serde::Deserialize;

/// Конфигурация для WebRTC
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServerConfig>,
    /// Разрешить host-кандидаты на loopback (нужно для локальных тестов).
    pub include_loopback_candidates: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![
                IceServerConfig::stun(DEFAULT_STUN_ADDR),
                IceServerConfig::stun(DEFAULT_STUN_ADDR_2),
            ],
            include_loopback_candidates: false,
        }
    }
}

impl TransportConfig {
    /// Без STUN/TURN: только host-кандидаты, включая loopback.
    pub fn local_only() -> Self {
        Self {
            ice_servers: Vec::new(),
            include_loopback_candidates: true,
        }
    }
}
