//! Vpner: macOS status-bar toggle for PPPoE-style VPN services.

mod app;
mod config;
mod error;
mod tray_command;
mod tray_icon_state;
mod tray_manager;

pub(crate) use {
    app::App,
    error::{AppError, Result as AppResult},
    tray_command::TrayCommand,
    tray_icon_state::TrayIconState,
    tray_manager::{ServiceMenuIds, TrayManager},
};

use crate::config::Config;

use std::sync::Arc;

use tao::{
    event::Event,
    event_loop::{ControlFlow, EventLoopBuilder},
};
use tokio::sync::Mutex;
use tracing::error;
use vpner_core::VpnMonitor;

/// Application entry point.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("vpner=debug")
        .init();

    let event_loop = EventLoopBuilder::<TrayCommand>::with_user_event().build();
    let tray_proxy = event_loop.create_proxy();

    let service_ids: ServiceMenuIds = Arc::new(Mutex::new(Vec::new()));

    // TrayManager lives on the main thread - TrayIcon is !Send on all platforms.
    let mut tray_manager = match TrayManager::new(Arc::clone(&service_ids)) {
        Ok(tm) => tm,
        Err(e) => {
            error!("Failed to create TrayManager: {:?}", e);
            std::process::exit(1);
        }
    };

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::UserEvent(cmd) => match cmd {
                TrayCommand::SetState(state) => {
                    if let Err(e) = tray_manager.update_state(state) {
                        error!(error = ?e, "Failed to update tray icon");
                    }
                }
                TrayCommand::SetServices { services, selected } => {
                    if let Err(e) = tray_manager.rebuild_services(&services, selected.as_deref()) {
                        error!(error = ?e, "Failed to rebuild service menu");
                    }
                }
                TrayCommand::Shutdown => {
                    *control_flow = ControlFlow::ExitWithCode(0);
                }
            },
            Event::NewEvents(tao::event::StartCause::Init) => {
                let config = match Config::load() {
                    Ok(c) => c,
                    Err(e) => {
                        error!("Failed to load config: {:?}", e);
                        std::process::exit(1);
                    }
                };

                #[cfg(target_os = "macos")]
                unsafe {
                    use core_foundation::runloop::{CFRunLoopGetMain, CFRunLoopWakeUp};
                    CFRunLoopWakeUp(CFRunLoopGetMain());
                }

                let tray_proxy = tray_proxy.clone();
                let service_ids = Arc::clone(&service_ids);
                let connect_item_id = tray_manager.connect_item_id().clone();
                let refresh_item_id = tray_manager.refresh_item_id().clone();
                let quit_item_id = tray_manager.quit_item_id().clone();

                // Spawn tokio runtime on separate thread.
                // TrayManager stays on the main thread.
                std::thread::spawn(move || {
                    let rt = match tokio::runtime::Runtime::new() {
                        Ok(rt) => rt,
                        Err(e) => {
                            error!("Failed to create tokio runtime: {:?}", e);
                            std::process::exit(1);
                        }
                    };

                    rt.block_on(async {
                        let monitor = VpnMonitor::system(config.monitor_options());

                        let app = App {
                            monitor,
                            config,
                            tray_proxy,
                            service_ids,
                            connect_item_id,
                            refresh_item_id,
                            quit_item_id,
                            services: Vec::new(),
                        };

                        if let Err(e) = app.run().await {
                            error!(error = ?e, "App error");
                        }
                    });
                });
            }
            _ => {}
        }
    });
}
