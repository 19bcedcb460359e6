//! Connection monitor: selection, periodic status polling, and
//! connect/disconnect control.
//!
//! The poll loop runs as a tokio task cancelled through a `watch` channel.
//! Subprocess calls block, so they run on the blocking pool; results are
//! applied to shared state and published to subscribers as [`VpnEvent`]s.
//! Status notifications are edge-triggered: one event per transition, never
//! one per poll.

use crate::{ConnectionState, Networksetup, VpnEvent};

use std::{sync::Arc, time::Duration};

use tokio::sync::{Mutex, broadcast, watch};
use tracing::{debug, info, warn};

/// Default interval between periodic status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Default delay between a connect/disconnect tool exit and the follow-up
/// status check. `networksetup` returns before the PPPoE handshake settles,
/// so checking immediately would read a stale state.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(2);

const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Tuning knobs for [`VpnMonitor`].
#[derive(Debug, Clone, Copy)]
pub struct MonitorOptions {
    /// Interval between periodic status checks.
    pub poll_interval: Duration,
    /// Delay before the post-connect/disconnect status re-check.
    pub settle_delay: Duration,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

/// VPN connection monitor over a [`Networksetup`] adapter.
pub struct VpnMonitor {
    net: Networksetup,
    state: Arc<Mutex<ConnectionState>>,
    events: broadcast::Sender<VpnEvent>,
    poll_interval: Duration,
    settle_delay: Duration,
    /// Cancellation handle for the running poll task. Dropping or replacing
    /// the sender stops the task.
    poll_cancel: Mutex<Option<watch::Sender<bool>>>,
}

impl VpnMonitor {
    /// Create a monitor over the given adapter.
    pub fn new(net: Networksetup, options: MonitorOptions) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            net,
            state: Arc::new(Mutex::new(ConnectionState::default())),
            events,
            poll_interval: options.poll_interval,
            settle_delay: options.settle_delay,
            poll_cancel: Mutex::new(None),
        }
    }

    /// Create a monitor over the real system `networksetup` tool.
    pub fn system(options: MonitorOptions) -> Self {
        Self::new(Networksetup::system(), options)
    }

    /// Subscribe to monitor events.
    pub fn subscribe(&self) -> broadcast::Receiver<VpnEvent> {
        self.events.subscribe()
    }

    /// Snapshot the current connection state.
    pub async fn state(&self) -> ConnectionState {
        self.state.lock().await.clone()
    }

    /// Enumerate configured network services.
    ///
    /// Subprocess failure degrades to an empty list; the caller publishes
    /// the result to whoever displays it.
    pub async fn load_services(&self) -> Vec<String> {
        let net = self.net.clone();
        match tokio::task::spawn_blocking(move || net.list_services()).await {
            Ok(Ok(services)) => services,
            Ok(Err(e)) => {
                warn!(error = %e, "Service enumeration failed, treating as no services");
                Vec::new()
            }
            Err(e) => {
                warn!(error = ?e, "Service enumeration task failed");
                Vec::new()
            }
        }
    }

    /// Change the selected service and restart monitoring for it.
    ///
    /// Re-selecting the already-selected service still restarts the poll
    /// sequence, which forces one immediate recheck. Selecting `None` stops
    /// monitoring and resets the connected flag without emitting an event.
    pub async fn select(&self, service: Option<String>) {
        self.stop_monitoring().await;

        {
            let mut state = self.state.lock().await;
            state.selected = service.clone();
            if service.is_none() {
                state.connected = false;
            }
        }

        match service {
            Some(name) => {
                info!(service = %name, "Service selected");
                self.start_monitoring().await;
            }
            None => info!("Selection cleared, monitoring stopped"),
        }
    }

    /// Start the poll loop for the current selection: one immediate status
    /// check, then one per interval. Replaces any running loop. No-op when
    /// nothing is selected.
    pub async fn start_monitoring(&self) {
        self.stop_monitoring().await;

        let Some(service) = self.state.lock().await.selected.clone() else {
            return;
        };

        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        *self.poll_cancel.lock().await = Some(cancel_tx);

        let net = self.net.clone();
        let state = Arc::clone(&self.state);
        let events = self.events.clone();
        let poll_interval = self.poll_interval;

        tokio::spawn(async move {
            debug!(service = %service, interval = ?poll_interval, "Status polling started");
            let mut ticker = tokio::time::interval(poll_interval);

            loop {
                tokio::select! {
                    // Completes on an explicit stop and on sender drop
                    // (monitor shutdown or poll restart).
                    _ = cancel_rx.changed() => {
                        debug!(service = %service, "Status polling stopped");
                        break;
                    }
                    // First tick fires immediately.
                    _ = ticker.tick() => {
                        check_status(&net, &service, &state, &events).await;
                    }
                }
            }
        });
    }

    /// Cancel the running poll loop, if any.
    pub async fn stop_monitoring(&self) {
        if let Some(cancel) = self.poll_cancel.lock().await.take() {
            let _ = cancel.send(true);
        }
    }

    /// Perform one status check for the current selection, outside the
    /// periodic schedule. No-op when nothing is selected.
    pub async fn check_now(&self) {
        let Some(service) = self.state.lock().await.selected.clone() else {
            return;
        };
        check_status(&self.net, &service, &self.state, &self.events).await;
    }

    /// Start a connect attempt for the current selection.
    ///
    /// Sets the `connecting` flag, runs the tool on the blocking pool, and
    /// after the settle delay clears the flag (regardless of outcome) and
    /// re-checks status. Returns immediately; overlapping calls are not
    /// guarded against.
    pub async fn connect(&self) {
        let Some(service) = self.state.lock().await.selected.clone() else {
            return;
        };

        {
            let mut state = self.state.lock().await;
            state.connecting = true;
        }
        let _ = self.events.send(VpnEvent::ConnectingChanged(true));
        info!(service = %service, "Connect requested");

        let net = self.net.clone();
        let state = Arc::clone(&self.state);
        let events = self.events.clone();
        let settle_delay = self.settle_delay;

        tokio::spawn(async move {
            run_tool(&net, &service, ToolAction::Connect).await;
            tokio::time::sleep(settle_delay).await;

            {
                let mut state = state.lock().await;
                state.connecting = false;
            }
            let _ = events.send(VpnEvent::ConnectingChanged(false));

            check_status(&net, &service, &state, &events).await;
        });
    }

    /// Start a disconnect attempt for the current selection.
    ///
    /// Same shape as [`connect`](Self::connect) without the transient flag.
    pub async fn disconnect(&self) {
        let Some(service) = self.state.lock().await.selected.clone() else {
            return;
        };

        info!(service = %service, "Disconnect requested");

        let net = self.net.clone();
        let state = Arc::clone(&self.state);
        let events = self.events.clone();
        let settle_delay = self.settle_delay;

        tokio::spawn(async move {
            run_tool(&net, &service, ToolAction::Disconnect).await;
            tokio::time::sleep(settle_delay).await;
            check_status(&net, &service, &state, &events).await;
        });
    }
}

enum ToolAction {
    Connect,
    Disconnect,
}

/// Run a connect/disconnect subcommand on the blocking pool, waiting for
/// the tool to exit. Failures are logged and otherwise ignored; the
/// follow-up status check decides what actually happened.
async fn run_tool(net: &Networksetup, service: &str, action: ToolAction) {
    let net = net.clone();
    let service_owned = service.to_string();
    let result = tokio::task::spawn_blocking(move || match action {
        ToolAction::Connect => net.connect(&service_owned),
        ToolAction::Disconnect => net.disconnect(&service_owned),
    })
    .await;

    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(service, error = %e, "networksetup invocation failed"),
        Err(e) => warn!(service, error = ?e, "networksetup task failed"),
    }
}

/// Query the tool once and apply the result to shared state.
///
/// Emits exactly one `StatusChanged` when the boolean differs from the
/// stored value, nothing otherwise. Subprocess failure is treated as
/// disconnected (and logged).
async fn check_status(
    net: &Networksetup,
    service: &str,
    state: &Arc<Mutex<ConnectionState>>,
    events: &broadcast::Sender<VpnEvent>,
) {
    let net = net.clone();
    let service_owned = service.to_string();
    let connected =
        match tokio::task::spawn_blocking(move || net.is_connected(&service_owned)).await {
            Ok(Ok(connected)) => connected,
            Ok(Err(e)) => {
                warn!(service, error = %e, "Status check failed, treating as disconnected");
                false
            }
            Err(e) => {
                warn!(service, error = ?e, "Status check task failed");
                false
            }
        };

    let mut state = state.lock().await;
    if state.connected != connected {
        state.connected = connected;
        debug!(service, connected, "Connection state changed");
        let _ = events.send(VpnEvent::StatusChanged(connected));
    }
}
