use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_wave_pending_delay_ms() -> u64 {
    250
}

fn default_wave_post_delay_ms() -> u64 {
    100
}

/// Pacing for the Move Orchestrator's wave loop. Exposed as config (rather
/// than hard-coded `sleep` calls) because integration tests need a
/// zero-duration variant to run without real wall-clock waits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub wave_pending_delay_ms: u64,
    pub wave_post_delay_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            wave_pending_delay_ms: default_wave_pending_delay_ms(),
            wave_post_delay_ms: default_wave_post_delay_ms(),
        }
    }
}

impl OrchestratorConfig {
    pub fn zero() -> Self {
        Self {
            wave_pending_delay_ms: 0,
            wave_post_delay_ms: 0,
        }
    }

    pub fn wave_pending_delay(&self) -> Duration {
        Duration::from_millis(self.wave_pending_delay_ms)
    }

    pub fn wave_post_delay(&self) -> Duration {
        Duration::from_millis(self.wave_post_delay_ms)
    }
}
