use crate::{AppError, AppResult, TrayCommand, TrayIconState, config::Config};

use std::panic::Location;

use crate::tray_manager::ServiceMenuIds;
use error_location::ErrorLocation;
use tao::event_loop::EventLoopProxy;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, instrument, warn};
use tray_icon::menu::{MenuEvent, MenuId};
use vpner_core::{VpnEvent, VpnMonitor};

/// Main application state.
///
/// Runs on the async runtime thread. Communicates tray updates back to the
/// main thread via `tray_proxy` because `TrayIcon` is `!Send` and must
/// remain on the UI thread.
pub struct App {
    pub(crate) monitor: VpnMonitor,
    pub(crate) config: Config,
    pub(crate) tray_proxy: EventLoopProxy<TrayCommand>,
    pub(crate) service_ids: ServiceMenuIds,
    pub(crate) connect_item_id: MenuId,
    pub(crate) refresh_item_id: MenuId,
    pub(crate) quit_item_id: MenuId,
    /// Last enumeration result, kept so selection changes can re-render
    /// the submenu without re-running the tool.
    pub(crate) services: Vec<String>,
}

impl App {
    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("Vpner starting");

        // Tray event forwarding via single persistent blocking task.
        //
        // MenuEvent::receiver() returns a crossbeam_channel::Receiver which
        // HAS blocking recv() -- zero polling, instant response, one thread.
        //
        // Shutdown: when tray_event_rx is dropped (main loop breaks),
        // tray_event_tx.blocking_send() fails, breaking the blocking loop.
        let (tray_event_tx, mut tray_event_rx) = mpsc::channel(32);
        let tray_handle = tokio::task::spawn_blocking(move || {
            let receiver = MenuEvent::receiver();
            while let Ok(event) = receiver.recv() {
                if tray_event_tx.blocking_send(event).is_err() {
                    break;
                }
            }
        });

        // Subscribe before the first selection so the initial status check
        // cannot race past us.
        let mut vpn_events = self.monitor.subscribe();

        // Startup: enumerate services, restore the persisted selection
        // (which starts the poller), and render the menu.
        self.services = self.monitor.load_services().await;
        let selected = self.config.connection.selected_service.clone();
        self.send_services(selected.clone())?;
        self.monitor.select(selected).await;

        loop {
            tokio::select! {
                Some(event) = tray_event_rx.recv() => {
                    match self.handle_tray_event(event).await {
                        Ok(true) => {}
                        Ok(false) => break,
                        Err(e) => error!(error = ?e, "Failed to handle tray event"),
                    }
                }

                event = vpn_events.recv() => {
                    match event {
                        Ok(event) => {
                            if let Err(e) = self.handle_vpn_event(event).await {
                                error!(error = ?e, "Failed to handle monitor event");
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            warn!(missed, "Monitor event stream lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        }

        self.monitor.stop_monitoring().await;
        drop(tray_event_rx);

        match tokio::time::timeout(std::time::Duration::from_secs(1), tray_handle).await {
            Ok(Ok(())) => info!("Tray event forwarder stopped cleanly"),
            Ok(Err(e)) => error!(error = ?e, "Tray event forwarder task panicked"),
            Err(_) => info!(
                "Tray event forwarder did not stop within timeout, \
                     will be cleaned up on exit"
            ),
        }

        info!("Vpner shut down successfully");

        Ok(())
    }

    /// Handle tray menu events. Returns false when the app should exit.
    #[instrument(skip(self))]
    async fn handle_tray_event(&mut self, event: MenuEvent) -> AppResult<bool> {
        let event_id = &event.id;

        if *event_id == self.quit_item_id {
            info!("Exit requested from tray menu");
            self.send_tray(TrayCommand::Shutdown)?;
            return Ok(false);
        }

        if *event_id == self.connect_item_id {
            self.toggle_connection().await?;
            return Ok(true);
        }

        if *event_id == self.refresh_item_id {
            self.refresh_services().await?;
            return Ok(true);
        }

        let selection = {
            let ids = self.service_ids.lock().await;
            ids.iter()
                .find(|(id, _)| id == event_id)
                .map(|(_, service)| service.clone())
        };
        if let Some(selection) = selection {
            self.select_service(selection).await?;
        } else {
            debug!(id = ?event_id, "Ignoring unknown menu event");
        }

        Ok(true)
    }

    /// Apply monitor events to the tray.
    async fn handle_vpn_event(&mut self, event: VpnEvent) -> AppResult<()> {
        match event {
            VpnEvent::StatusChanged(connected) => {
                info!(connected, "Connection status changed");
                let state = if connected {
                    TrayIconState::Connected
                } else {
                    TrayIconState::Disconnected
                };
                self.send_tray(TrayCommand::SetState(state))
            }
            VpnEvent::ConnectingChanged(true) => {
                self.send_tray(TrayCommand::SetState(TrayIconState::Connecting))
            }
            VpnEvent::ConnectingChanged(false) => {
                // The post-connect status check may still be running; render
                // the last known state and let StatusChanged correct it.
                let state = if self.monitor.state().await.connected {
                    TrayIconState::Connected
                } else {
                    TrayIconState::Disconnected
                };
                self.send_tray(TrayCommand::SetState(state))
            }
        }
    }

    /// Toggle the connection of the selected service.
    #[instrument(skip(self))]
    async fn toggle_connection(&mut self) -> AppResult<()> {
        let state = self.monitor.state().await;
        if state.connecting {
            debug!("Connect attempt already in flight, ignoring toggle");
            return Ok(());
        }
        if state.connected {
            self.monitor.disconnect().await;
        } else {
            self.monitor.connect().await;
        }
        Ok(())
    }

    /// Change the selection: persist it, restart the poller, re-render.
    async fn select_service(&mut self, selection: Option<String>) -> AppResult<()> {
        self.config.connection.selected_service = selection.clone();
        if let Err(e) = self.config.save() {
            error!(error = ?e, "Failed to persist selection");
        }

        self.send_services(selection.clone())?;
        if selection.is_none() {
            // No poller left to notify; reset the icon ourselves.
            self.send_tray(TrayCommand::SetState(TrayIconState::Disconnected))?;
        }
        self.monitor.select(selection).await;
        Ok(())
    }

    /// Re-run service enumeration and re-render the submenu.
    async fn refresh_services(&mut self) -> AppResult<()> {
        self.services = self.monitor.load_services().await;
        info!(count = self.services.len(), "Services refreshed");
        self.send_services(self.config.connection.selected_service.clone())
    }

    fn send_services(&self, selected: Option<String>) -> AppResult<()> {
        self.send_tray(TrayCommand::SetServices {
            services: self.services.clone(),
            selected,
        })
    }

    #[track_caller]
    fn send_tray(&self, command: TrayCommand) -> AppResult<()> {
        self.tray_proxy
            .send_event(command)
            .map_err(|e| AppError::ChannelSendFailed {
                message: format!("Event loop closed: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}
