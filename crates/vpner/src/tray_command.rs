use crate::TrayIconState;

/// Commands sent from the async runtime to the main UI thread.
///
/// The main thread owns `TrayManager` (because `TrayIcon` is `!Send`),
/// so all tray mutations and process lifecycle events flow through this enum.
#[derive(Debug, Clone)]
pub enum TrayCommand {
    /// Update the tray icon and connect-item title to a new state.
    SetState(TrayIconState),
    /// Rebuild the service submenu from a fresh enumeration.
    SetServices {
        /// Services to display, in enumeration order.
        services: Vec<String>,
        /// Currently selected service, if any.
        selected: Option<String>,
    },
    /// Shut down the application. The main thread will exit the event loop.
    Shutdown,
}
