/// Tray icon states corresponding to the connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayIconState {
    /// No connection (or no service selected).
    Disconnected,
    /// A connect attempt is in flight.
    Connecting,
    /// The selected service reported connected.
    Connected,
}
