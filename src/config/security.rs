use serde::{Deserialize, Serialize};

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_max_message_size() -> usize {
    16 * 1024
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
    /// HMAC key for `auth::verify_session_cookie`. Empty by default so a
    /// misconfigured deployment fails fast at `EngineConfig::validate`
    /// rather than silently accepting unsigned sessions.
    pub session_secret: String,
    pub max_message_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            cors_origins: default_cors_origins(),
            session_secret: String::new(),
            max_message_size: default_max_message_size(),
        }
    }
}
