//! Abstraction over external command execution.
//!
//! [`CommandRunner`] allows swapping the real subprocess invocation
//! ([`SystemCommandRunner`]) with a scripted fake in tests. The whole crate
//! talks to one platform-specific CLI tool (`networksetup`) that does not
//! exist off macOS or in CI, so every caller goes through this seam.

use crate::{CoreResult, VpnError};

use std::panic::Location;

use error_location::ErrorLocation;

/// Trait for running an external command and capturing its stdout.
///
/// Implementations block until the child process exits. Callers that must
/// not block an async context wrap the call in `spawn_blocking`.
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` and return its stdout as a [`String`].
    fn run(&self, program: &str, args: &[&str]) -> CoreResult<String>;
}

/// Default implementation that delegates to [`std::process::Command`].
#[derive(Debug, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    #[track_caller]
    fn run(&self, program: &str, args: &[&str]) -> CoreResult<String> {
        let output = std::process::Command::new(program)
            .args(args)
            .output()
            .map_err(|source| VpnError::CommandFailed {
                program: program.to_string(),
                source,
                location: ErrorLocation::from(Location::caller()),
            })?;

        // Exit status is deliberately not inspected: networksetup reports
        // connection state on stdout and its exit codes are unreliable.
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
