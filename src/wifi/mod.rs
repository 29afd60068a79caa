//! Wi-Fi management core.
//!
//! Scanning, connection-state tracking, saved-profile lookup and the
//! connect/disconnect orchestrator, all running against an injected
//! [`NetworkBackend`] so the platform-specific command plumbing stays at
//! the edge.

mod backend;
mod connection;
pub mod platform;
mod profile;
mod scanning;
mod types;

// Re-export public API
pub use backend::{NetworkBackend, platform_backend};
pub use connection::{CancelToken, ConnectOptions, CredentialPrompt};
pub use profile::{ProfileSpec, Security};
pub use types::{ConnectOutcome, NetworkRecord, UNKNOWN_AUTH, UNKNOWN_SSID};

/// Facade over the injected backend. Construct one per process (the
/// underlying OS interface is a mutually exclusive resource) and route all
/// scan/connect/disconnect traffic through it.
pub struct WifiManager {
    backend: Box<dyn NetworkBackend>,
}

impl WifiManager {
    pub fn new(backend: Box<dyn NetworkBackend>) -> Self {
        Self { backend }
    }

    /// Manager wired to the backend for the OS this binary was built for.
    pub fn for_platform() -> Self {
        Self::new(platform_backend())
    }

    pub(crate) fn backend(&self) -> &dyn NetworkBackend {
        self.backend.as_ref()
    }
}
