use serde::{Deserialize, Serialize};

/// VPN connection configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Selected network service name (None = no selection). Written on
    /// every selection change, loaded once at startup.
    #[serde(default)]
    pub selected_service: Option<String>,
}
