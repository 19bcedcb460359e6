//! System tray icon with state-based updates and a dynamic service menu.
//!
//! The menu mirrors the original layout: a "Service" submenu of check items
//! ("None" plus each enumerated service), a Connect/Disconnect toggle, a
//! refresh entry, and Quit. Menu mutation happens here, on the main thread;
//! the async side drives it through [`TrayCommand`](crate::TrayCommand).

use crate::{AppError, AppResult, TrayIconState};

use std::{panic::Location, sync::Arc};

use error_location::ErrorLocation;
use tokio::sync::Mutex;
use tracing::info;
use tray_icon::menu::{CheckMenuItem, Menu, MenuId, MenuItem, PredefinedMenuItem, Submenu};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

/// Mapping from service check-item ids to the selection they represent
/// (`None` for the "None" entry).
///
/// Written by the main thread on every submenu rebuild, read by the app
/// loop when resolving menu events. The app loop locks with `.lock().await`,
/// the main thread with `blocking_lock()` (it runs no async runtime).
pub type ServiceMenuIds = Arc<Mutex<Vec<(MenuId, Option<String>)>>>;

/// System tray icon manager.
pub struct TrayManager {
    tray_icon: TrayIcon,
    services_submenu: Submenu,
    connect_item: MenuItem,
    refresh_item_id: MenuId,
    quit_item_id: MenuId,
    service_ids: ServiceMenuIds,
    has_selection: bool,
    connecting: bool,
}

impl TrayManager {
    /// Create the tray icon with an empty service menu.
    #[track_caller]
    pub fn new(service_ids: ServiceMenuIds) -> AppResult<Self> {
        let menu = Menu::new();

        let services_submenu = Submenu::new("Service: None", true);
        let connect_item = MenuItem::new("Connect", false, None);
        let refresh_item = MenuItem::new("Refresh Services", true, None);
        let quit_item = MenuItem::new("Quit", true, None);

        let refresh_item_id = refresh_item.id().clone();
        let quit_item_id = quit_item.id().clone();

        menu.append(&services_submenu).map_err(tray_error)?;
        menu.append(&PredefinedMenuItem::separator())
            .map_err(tray_error)?;
        menu.append(&connect_item).map_err(tray_error)?;
        menu.append(&PredefinedMenuItem::separator())
            .map_err(tray_error)?;
        menu.append(&refresh_item).map_err(tray_error)?;
        menu.append(&quit_item).map_err(tray_error)?;

        let icon = Self::load_icon(TrayIconState::Disconnected)?;

        let tray_icon = TrayIconBuilder::new()
            .with_tooltip("Vpner - Disconnected")
            .with_menu(Box::new(menu))
            .with_icon(icon)
            .build()
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to create tray icon: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!("System tray icon initialized");

        Ok(Self {
            tray_icon,
            services_submenu,
            connect_item,
            refresh_item_id,
            quit_item_id,
            service_ids,
            has_selection: false,
            connecting: false,
        })
    }

    /// Update the tray icon, tooltip, and connect-item title for a state.
    #[track_caller]
    pub fn update_state(&mut self, state: TrayIconState) -> AppResult<()> {
        self.connecting = state == TrayIconState::Connecting;

        let (tooltip, connect_title) = match state {
            TrayIconState::Disconnected => ("Vpner - Disconnected", "Connect"),
            TrayIconState::Connecting => ("Vpner - Connecting...", "Connecting..."),
            TrayIconState::Connected => ("Vpner - Connected", "Disconnect"),
        };

        let icon = Self::load_icon(state)?;
        self.tray_icon
            .set_icon(Some(icon))
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to update icon: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;
        self.tray_icon.set_tooltip(Some(tooltip)).map_err(|e| {
            AppError::TrayError {
                reason: format!("Failed to update tooltip: {}", e),
                location: ErrorLocation::from(Location::caller()),
            }
        })?;

        self.connect_item.set_text(connect_title);
        self.connect_item
            .set_enabled(self.has_selection && !self.connecting);

        Ok(())
    }

    /// Rebuild the service submenu from a fresh enumeration.
    ///
    /// Renders "None" plus each service as a check item, marks the current
    /// selection, and republishes the id-to-service mapping for the app loop.
    #[track_caller]
    pub fn rebuild_services(
        &mut self,
        services: &[String],
        selected: Option<&str>,
    ) -> AppResult<()> {
        while self.services_submenu.remove_at(0).is_some() {}

        let mut ids = Vec::with_capacity(services.len() + 1);

        let none_item = CheckMenuItem::new("None", true, selected.is_none(), None);
        ids.push((none_item.id().clone(), None));
        self.services_submenu
            .append(&none_item)
            .map_err(tray_error)?;

        for service in services {
            let checked = selected == Some(service.as_str());
            let item = CheckMenuItem::new(service, true, checked, None);
            ids.push((item.id().clone(), Some(service.clone())));
            self.services_submenu.append(&item).map_err(tray_error)?;
        }

        self.services_submenu
            .set_text(format!("Service: {}", selected.unwrap_or("None")));

        self.has_selection = selected.is_some();
        self.connect_item
            .set_enabled(self.has_selection && !self.connecting);

        *self.service_ids.blocking_lock() = ids;

        Ok(())
    }

    /// Load icon from compile-time embedded PNG bytes.
    ///
    /// Icons are embedded via include_bytes! so they work regardless of
    /// install location, no hardcoded filesystem paths.
    #[track_caller]
    pub(crate) fn load_icon(state: TrayIconState) -> AppResult<Icon> {
        let png_bytes: &[u8] = match state {
            TrayIconState::Disconnected => include_bytes!("../resources/icons/disconnected.png"),
            TrayIconState::Connecting => include_bytes!("../resources/icons/connecting.png"),
            TrayIconState::Connected => include_bytes!("../resources/icons/connected.png"),
        };

        let img = image::load_from_memory(png_bytes).map_err(|e| AppError::TrayError {
            reason: format!("Failed to decode embedded icon: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let rgba = img.into_rgba8();
        let (width, height) = (rgba.width(), rgba.height());

        Icon::from_rgba(rgba.into_raw(), width, height).map_err(|e| AppError::TrayError {
            reason: format!("Failed to create icon from RGBA: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Get the connect menu item ID.
    pub fn connect_item_id(&self) -> &MenuId {
        self.connect_item.id()
    }

    /// Get the refresh menu item ID.
    pub fn refresh_item_id(&self) -> &MenuId {
        &self.refresh_item_id
    }

    /// Get the quit menu item ID.
    pub fn quit_item_id(&self) -> &MenuId {
        &self.quit_item_id
    }
}

#[track_caller]
fn tray_error(e: tray_icon::menu::Error) -> AppError {
    AppError::TrayError {
        reason: format!("Failed to build menu: {}", e),
        location: ErrorLocation::from(Location::caller()),
    }
}
