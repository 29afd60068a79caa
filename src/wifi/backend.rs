use std::process::{Command, Output};

use crate::error::{WifiError, WifiResult};
use crate::wifi::profile::ProfileSpec;
use crate::wifi::types::NetworkRecord;

/// Platform capability consumed by the scanner and the connection
/// orchestrator. One implementation exists per operating system; the
/// factory picks it once at startup and it is injected everywhere else.
pub trait NetworkBackend {
    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    /// Enumerate visible networks. Records come back unannotated
    /// (`connected` is always false here) and un-ordered; the scanner owns
    /// annotation, de-duplication and ordering.
    fn list_networks(&self) -> WifiResult<Vec<NetworkRecord>>;

    /// SSID of the current association. `None` means "not associated",
    /// which is not an error.
    fn current_ssid(&self) -> WifiResult<Option<String>>;

    /// Names of the profiles the OS has saved.
    fn saved_profiles(&self) -> WifiResult<Vec<String>>;

    /// Hand a freshly constructed profile to the OS for storage.
    fn register_profile(&self, profile: &ProfileSpec) -> WifiResult<()>;

    /// Ask the OS to associate with a stored profile.
    fn connect_network(&self, ssid: &str) -> WifiResult<()>;

    /// Drop the association with `ssid`. Callers check the connection state
    /// first; this always issues the platform command.
    fn disconnect_network(&self, ssid: &str) -> WifiResult<()>;
}

/// Select the backend for the OS this binary was built for. Every backend
/// compiles everywhere (they only spawn processes); only this choice is
/// platform-gated.
pub fn platform_backend() -> Box<dyn NetworkBackend> {
    #[cfg(target_os = "windows")]
    {
        Box::new(super::platform::WindowsBackend::new())
    }
    #[cfg(target_os = "macos")]
    {
        Box::new(super::platform::MacBackend::new())
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        Box::new(super::platform::LinuxBackend::new())
    }
}

/// Run a platform command and capture its output. A spawn failure (missing
/// binary, permission denied) is `PlatformUnavailable`; exit status is left
/// for the caller to judge.
pub(crate) fn run(program: &str, args: &[&str]) -> WifiResult<Output> {
    tracing::debug!(command = program, ?args, "invoking platform tool");
    Command::new(program)
        .args(args)
        .output()
        .map_err(|source| WifiError::PlatformUnavailable {
            command: program.to_string(),
            source,
        })
}

/// Like [`run`] but treats a non-zero exit as an error.
pub(crate) fn run_checked(program: &str, args: &[&str]) -> WifiResult<Output> {
    let output = run(program, args)?;
    if !output.status.success() {
        return Err(command_failed(program, &output));
    }
    Ok(output)
}

pub(crate) fn command_failed(program: &str, output: &Output) -> WifiError {
    WifiError::CommandFailed {
        command: program.to_string(),
        status: output.status.to_string(),
        detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

/// Decode tool output that is expected to be UTF-8. Invalid bytes are a
/// decode error, distinct from a parse failure.
pub(crate) fn decode_utf8(command: &str, bytes: &[u8]) -> WifiResult<String> {
    String::from_utf8(bytes.to_vec()).map_err(|_| WifiError::Decode {
        command: command.to_string(),
        encoding: "UTF-8",
    })
}
