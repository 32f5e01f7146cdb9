/// STUN-серверы по умолчанию, если конфигурация ICE не задана.
pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:stun1.l.google.com:19302";

/// Автор синтетических сообщений чата (вход/выход участников).
pub const SYSTEM_AUTHOR: &str = "System";
