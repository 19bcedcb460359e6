//! Vpner Core Library
//!
//! Connection management for PPPoE-style VPN services via the macOS
//! `networksetup` tool: service enumeration, periodic status polling with
//! edge-triggered change events, and connect/disconnect control.
//!
//! # Example
//!
//! ```no_run
//! use vpner_core::{MonitorOptions, VpnMonitor};
//!
//! #[tokio::main]
//! async fn main() {
//!     let monitor = VpnMonitor::system(MonitorOptions::default());
//!     let mut events = monitor.subscribe();
//!
//!     let services = monitor.load_services().await;
//!     monitor.select(services.first().cloned()).await;
//!
//!     while let Ok(event) = events.recv().await {
//!         println!("{:?}", event);
//!     }
//! }
//! ```

mod error;
mod net;

pub use {
    error::{Result as CoreResult, VpnError},
    net::{
        CommandRunner, ConnectionState, DEFAULT_POLL_INTERVAL, DEFAULT_SETTLE_DELAY,
        MonitorOptions, Networksetup, SystemCommandRunner, VpnEvent, VpnMonitor,
    },
};
