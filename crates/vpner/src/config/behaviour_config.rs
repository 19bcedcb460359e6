use crate::config::{
    DEFAULT_POLL_INTERVAL_SECS, DEFAULT_SETTLE_DELAY_SECS, default_poll_interval_secs,
    default_settle_delay_secs,
};

use serde::{Deserialize, Serialize};

/// Application behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviourConfig {
    /// Seconds between periodic status checks.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Seconds to wait after a connect/disconnect before re-checking status.
    /// `networksetup` returns before the PPPoE handshake settles.
    #[serde(default = "default_settle_delay_secs")]
    pub settle_delay_secs: u64,
}

impl Default for BehaviourConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            settle_delay_secs: DEFAULT_SETTLE_DELAY_SECS,
        }
    }
}
