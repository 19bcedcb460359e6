/// Events broadcast by [`VpnMonitor`](crate::VpnMonitor) to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VpnEvent {
    /// The connected boolean changed. Edge-triggered: emitted once per
    /// transition, never repeated while the state holds.
    StatusChanged(bool),
    /// The transient `connecting` flag flipped around a connect attempt.
    ConnectingChanged(bool),
}
