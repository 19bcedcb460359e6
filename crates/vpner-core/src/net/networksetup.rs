//! Adapter around the macOS `networksetup` command-line tool.
//!
//! Wraps the four subcommands this app needs (list services, PPPoE status,
//! connect, disconnect) and the line parsing of their textual output. All
//! methods block on the subprocess; async callers go through
//! [`VpnMonitor`](crate::VpnMonitor), which moves them to the blocking pool.

use crate::{CommandRunner, CoreResult, SystemCommandRunner};

use std::sync::Arc;

use tracing::debug;

/// Filesystem path of the system network-configuration tool.
pub(crate) const NETWORKSETUP: &str = "/usr/sbin/networksetup";

const LIST_ALL_SERVICES: &str = "-listallnetworkservices";
const SHOW_PPPOE_STATUS: &str = "-showpppoestatus";
const CONNECT_PPPOE: &str = "-connectpppoeservice";
const DISCONNECT_PPPOE: &str = "-disconnectpppoeservice";

/// Literal stdout of `-showpppoestatus` for an established connection.
/// Case-sensitive, exact match after trimming.
const CONNECTED: &str = "connected";

/// Lines containing any of these are not selectable VPN services: the
/// "An asterisk (*) denotes..." header and the built-in Wi-Fi/Thunderbolt
/// interfaces.
const EXCLUDED_SUBSTRINGS: &[&str] = &["asterisk", "Wi-Fi", "Thunderbolt"];

/// Typed front-end for `networksetup` subcommands.
#[derive(Clone)]
pub struct Networksetup {
    runner: Arc<dyn CommandRunner>,
}

impl Networksetup {
    /// Create an adapter over the given command runner.
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Create an adapter over the real system tool.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemCommandRunner))
    }

    /// List configured network services, excluding disabled-service markers
    /// and built-in Wi-Fi/Thunderbolt entries. Order follows tool output.
    pub fn list_services(&self) -> CoreResult<Vec<String>> {
        let raw = self.runner.run(NETWORKSETUP, &[LIST_ALL_SERVICES])?;
        let services = parse_service_list(&raw);
        debug!(count = services.len(), "Enumerated network services");
        Ok(services)
    }

    /// Query the PPPoE connection status of `service`.
    ///
    /// Returns true iff the trimmed tool output equals the `"connected"`
    /// literal; any other output (including `"connecting"`) is false.
    pub fn is_connected(&self, service: &str) -> CoreResult<bool> {
        let raw = self.runner.run(NETWORKSETUP, &[SHOW_PPPOE_STATUS, service])?;
        Ok(parse_status(&raw))
    }

    /// Start the PPPoE connection for `service`. Blocks until the tool
    /// exits; the exit code is not inspected.
    pub fn connect(&self, service: &str) -> CoreResult<()> {
        self.runner.run(NETWORKSETUP, &[CONNECT_PPPOE, service])?;
        Ok(())
    }

    /// Stop the PPPoE connection for `service`. Blocks until the tool
    /// exits; the exit code is not inspected.
    pub fn disconnect(&self, service: &str) -> CoreResult<()> {
        self.runner.run(NETWORKSETUP, &[DISCONNECT_PPPOE, service])?;
        Ok(())
    }
}

/// Parse `-listallnetworkservices` output into selectable service names.
///
/// Per line: trim, drop empty lines and excluded entries, strip the `*`
/// marker that denotes a disabled-but-listed service, re-trim.
pub(crate) fn parse_service_list(raw: &str) -> Vec<String> {
    let mut services = Vec::new();

    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if EXCLUDED_SUBSTRINGS.iter().any(|s| trimmed.contains(s)) {
            continue;
        }

        let cleaned = trimmed.replace('*', "");
        let cleaned = cleaned.trim();
        if !cleaned.is_empty() {
            services.push(cleaned.to_string());
        }
    }

    services
}

/// Parse `-showpppoestatus` output into a connected boolean.
pub(crate) fn parse_status(raw: &str) -> bool {
    raw.trim() == CONNECTED
}
