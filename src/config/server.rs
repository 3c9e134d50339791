use serde::{Deserialize, Serialize};

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_ping_timeout_secs() -> u64 {
    60
}

fn default_room_cleanup_interval_secs() -> u64 {
    300
}

fn default_stale_room_max_age_secs() -> i64 {
    3600
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub ping_timeout_secs: u64,
    pub room_cleanup_interval_secs: u64,
    pub stale_room_max_age_secs: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            ping_timeout_secs: default_ping_timeout_secs(),
            room_cleanup_interval_secs: default_room_cleanup_interval_secs(),
            stale_room_max_age_secs: default_stale_room_max_age_secs(),
        }
    }
}
