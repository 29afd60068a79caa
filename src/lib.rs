//! Scan, inspect and join Wi-Fi networks by driving the operating system's
//! own network tooling (`netsh` on Windows, `networksetup`/`airport` on
//! macOS, `nmcli` on Linux).
//!
//! The crate is a library with a thin CLI on top: the [`wifi::WifiManager`]
//! facade owns an injected [`wifi::NetworkBackend`] and exposes scanning,
//! connection-state queries and a blocking connect/disconnect orchestrator.

pub mod config;
pub mod error;
pub mod wifi;

pub use error::{WifiError, WifiResult};
