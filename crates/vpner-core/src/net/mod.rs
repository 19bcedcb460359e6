mod command;
mod event;
mod monitor;
pub(crate) mod networksetup;
mod state;

pub use {
    command::{CommandRunner, SystemCommandRunner},
    event::VpnEvent,
    monitor::{DEFAULT_POLL_INTERVAL, DEFAULT_SETTLE_DELAY, MonitorOptions, VpnMonitor},
    networksetup::Networksetup,
    state::ConnectionState,
};
