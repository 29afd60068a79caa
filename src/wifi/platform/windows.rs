//! Backend that drives `netsh wlan` and parses its console output.
//!
//! netsh writes the legacy OEM code page (cp850 on western installs), not
//! UTF-8, and localises its field labels; the parsers below match on label
//! prefixes that survive at least the English and German spellings.

use std::io::Write;

use oem_cp::code_table::DECODING_TABLE_CP850;
use oem_cp::decode_string_complete_table;

use crate::error::{WifiError, WifiResult};
use crate::wifi::backend::{self, NetworkBackend};
use crate::wifi::profile::ProfileSpec;
use crate::wifi::types::{NetworkRecord, UNKNOWN_AUTH};

const NETSH: &str = "netsh";

pub struct WindowsBackend;

impl WindowsBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WindowsBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkBackend for WindowsBackend {
    fn name(&self) -> &'static str {
        "netsh"
    }

    fn list_networks(&self) -> WifiResult<Vec<NetworkRecord>> {
        let output = backend::run_checked(NETSH, &["wlan", "show", "networks", "mode=Bssid"])?;
        Ok(parse_networks(&decode_console(&output.stdout)))
    }

    fn current_ssid(&self) -> WifiResult<Option<String>> {
        let output = backend::run_checked(NETSH, &["wlan", "show", "interfaces"])?;
        Ok(parse_current_ssid(&decode_console(&output.stdout)))
    }

    fn saved_profiles(&self) -> WifiResult<Vec<String>> {
        let output = backend::run_checked(NETSH, &["wlan", "show", "profiles"])?;
        Ok(parse_profile_names(&decode_console(&output.stdout)))
    }

    fn register_profile(&self, profile: &ProfileSpec) -> WifiResult<()> {
        // netsh only takes profile XML from a file.
        let mut file = tempfile::Builder::new()
            .prefix("wlan-profile-")
            .suffix(".xml")
            .tempfile()
            .map_err(|source| WifiError::ProfileStage { source })?;
        file.write_all(profile.to_windows_xml().as_bytes())
            .map_err(|source| WifiError::ProfileStage { source })?;

        let filename = format!("filename={}", file.path().display());
        backend::run_checked(NETSH, &["wlan", "add", "profile", &filename, "user=current"])?;
        Ok(())
    }

    fn connect_network(&self, ssid: &str) -> WifiResult<()> {
        let name = format!("name={ssid}");
        backend::run_checked(NETSH, &["wlan", "connect", &name])?;
        Ok(())
    }

    fn disconnect_network(&self, _ssid: &str) -> WifiResult<()> {
        backend::run_checked(NETSH, &["wlan", "disconnect"])?;
        Ok(())
    }
}

/// cp850 maps every byte, so console decoding itself cannot fail; bad UTF-8
/// never reaches the parsers.
fn decode_console(bytes: &[u8]) -> String {
    decode_string_complete_table(bytes, &DECODING_TABLE_CP850)
}

/// Parse `netsh wlan show networks mode=Bssid` output.
///
/// A stanza opens with an `SSID <n>` header, may carry an authentication
/// line, and is flushed into a record every time a `Signal` field closes a
/// BSSID block, so one SSID with several BSSIDs yields several records
/// (de-duplication happens later in the scan pipeline). Lines that match
/// no known label and blocks with an unreadable signal are dropped.
pub(crate) fn parse_networks(text: &str) -> Vec<NetworkRecord> {
    let mut records = Vec::new();
    let mut ssid: Option<String> = None;
    let mut auth: Option<String> = None;

    for line in text.lines() {
        let Some((key, value)) = split_kv(line.trim()) else {
            continue;
        };
        if key.starts_with("SSID") {
            ssid = Some(value.to_string());
            auth = None;
        } else if key.starts_with("Auth") {
            auth = Some(value.to_string());
        } else if key.starts_with("Signal") {
            let Some(signal) = parse_signal(value) else {
                tracing::warn!(line = line.trim(), "dropping block with unreadable signal");
                continue;
            };
            records.push(NetworkRecord {
                ssid: ssid.clone().unwrap_or_default(),
                signal: Some(signal),
                auth: auth.clone().unwrap_or_else(|| UNKNOWN_AUTH.to_string()),
                connected: false,
            });
        }
    }
    records
}

/// Extract the association SSID from `netsh wlan show interfaces`. The key
/// is exactly `SSID`; the `BSSID` line must not match. No SSID line means
/// no association.
pub(crate) fn parse_current_ssid(text: &str) -> Option<String> {
    for line in text.lines() {
        let Some((key, value)) = split_kv(line.trim()) else {
            continue;
        };
        if key == "SSID" && !value.is_empty() {
            return Some(value.to_string());
        }
    }
    None
}

/// Profile names from `netsh wlan show profiles`. The value rows are the
/// only ones whose key mentions a profile (`All User Profile`,
/// `Profil für alle Benutzer`, ...).
pub(crate) fn parse_profile_names(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| split_kv(line.trim()))
        .filter(|(key, value)| key.contains("Profil") && !value.is_empty())
        .map(|(_, value)| value.to_string())
        .collect()
}

fn parse_signal(value: &str) -> Option<u8> {
    let digits = value.trim_end_matches('%').trim();
    digits.parse::<u8>().ok().map(|signal| signal.min(100))
}

/// Split a netsh key-value line on the first `" : "`. Splitting on the
/// spaced separator keeps colons inside SSIDs and MAC addresses intact;
/// a line ending in `" :"` is a key with an empty value (hidden SSID).
fn split_kv(line: &str) -> Option<(&str, &str)> {
    if let Some(idx) = line.find(" : ") {
        return Some((line[..idx].trim(), line[idx + 3..].trim()));
    }
    if let Some(stripped) = line.strip_suffix(" :") {
        return Some((stripped.trim(), ""));
    }
    None
}
