use error_location::ErrorLocation;
use thiserror::Error;

/// VPN control errors with source location tracking.
#[derive(Error, Debug)]
pub enum VpnError {
    /// The external network-configuration tool could not be spawned.
    #[error("Failed to run {program}: {source} {location}")]
    CommandFailed {
        /// Program that failed to launch.
        program: String,
        /// Underlying spawn/IO error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

/// Result type alias using [`VpnError`].
pub type Result<T> = std::result::Result<T, VpnError>;
