//! Layered configuration: compiled-in defaults, overridden by an optional
//! `config.json`, overridden by environment variables. Mirrors the
//! teacher's `config::load()` precedence without the teacher's multi-crate
//! relay/coordination surface this domain has no use for.

mod logging;
mod orchestrator;
mod security;
mod server;

pub use logging::{LogFormat, LoggingConfig};
pub use orchestrator::OrchestratorConfig;
pub use security::SecurityConfig;
pub use server::ServerConfig;

use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl EngineConfig {
    /// Defaults, then `config_path` (if it exists), then environment
    /// variables, then validation.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = EngineConfig::default();

        if let Some(path) = config_path {
            if path.exists() {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })?;
                config = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                    path: path.display().to_string(),
                    source,
                })?;
            }
        }

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(bind) = std::env::var("DICEWARS_BIND_ADDR") {
            self.server.bind_addr = bind;
        }
        if let Ok(secret) = std::env::var("DICEWARS_SESSION_SECRET") {
            self.security.session_secret = secret;
        }
        if let Ok(level) = std::env::var("DICEWARS_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("DICEWARS_LOG_FORMAT") {
            if let Some(parsed) = LogFormat::parse(&format) {
                self.logging.format = parsed;
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.security.session_secret.is_empty() {
            return Err(ConfigError::Invalid(
                "security.session_secret must not be empty".to_string(),
            ));
        }
        if self.server.bind_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "server.bind_addr {:?} is not a valid socket address",
                self.server.bind_addr
            )));
        }
        Ok(())
    }
}
