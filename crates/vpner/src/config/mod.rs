mod behaviour_config;
#[allow(clippy::module_inception)]
mod config;
mod connection_config;

pub(crate) use {
    behaviour_config::BehaviourConfig, config::Config, connection_config::ConnectionConfig,
};

pub(crate) const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
pub(crate) const DEFAULT_SETTLE_DELAY_SECS: u64 = 2;

pub(crate) fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

pub(crate) fn default_settle_delay_secs() -> u64 {
    DEFAULT_SETTLE_DELAY_SECS
}
