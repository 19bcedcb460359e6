/// Connection state owned by the monitor.
///
/// Mutated only by status-check results, connect/disconnect flows, and
/// selection changes. The UI reads cloned snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionState {
    /// Currently selected service name, if any.
    pub selected: Option<String>,
    /// Whether the selected service reported `"connected"` on the last check.
    pub connected: bool,
    /// Whether a connect attempt is in flight (set until the settle delay
    /// after the tool exits, regardless of outcome).
    pub connecting: bool,
}
