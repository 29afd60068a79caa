//! Backend for macOS built on `networksetup` plus the Apple80211 `airport`
//! listing tool.
//!
//! `networksetup` addresses the adapter by BSD device name (`en0`, ...), so
//! the backend first walks `-listallhardwareports` for the Wi-Fi hardware
//! port and caches the device for the life of the process.

use std::cell::OnceCell;

use secrecy::ExposeSecret;

use crate::error::{WifiError, WifiResult};
use crate::wifi::backend::{self, NetworkBackend};
use crate::wifi::profile::{ProfileSpec, Security};
use crate::wifi::types::{NetworkRecord, UNKNOWN_AUTH};

const NETWORKSETUP: &str = "networksetup";
const AIRPORT: &str =
    "/System/Library/PrivateFrameworks/Apple80211.framework/Versions/Current/Resources/airport";

pub struct MacBackend {
    device: OnceCell<String>,
}

impl MacBackend {
    pub fn new() -> Self {
        Self {
            device: OnceCell::new(),
        }
    }

    fn device(&self) -> WifiResult<&str> {
        if let Some(device) = self.device.get() {
            return Ok(device);
        }
        let output = backend::run_checked(NETWORKSETUP, &["-listallhardwareports"])?;
        let text = backend::decode_utf8(NETWORKSETUP, &output.stdout)?;
        let device = parse_wifi_device(&text).ok_or(WifiError::NoInterface)?;
        tracing::debug!(device = %device, "resolved Wi-Fi hardware port");
        Ok(self.device.get_or_init(|| device))
    }
}

impl Default for MacBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkBackend for MacBackend {
    fn name(&self) -> &'static str {
        "networksetup"
    }

    fn list_networks(&self) -> WifiResult<Vec<NetworkRecord>> {
        let output = backend::run_checked(AIRPORT, &["-s"])?;
        let text = backend::decode_utf8(AIRPORT, &output.stdout)?;
        Ok(parse_airport_listing(&text))
    }

    fn current_ssid(&self) -> WifiResult<Option<String>> {
        let device = self.device()?;
        // Exits non-zero on some OS versions when not associated, so the
        // output is inspected before the status.
        let output = backend::run(NETWORKSETUP, &["-getairportnetwork", device])?;
        let text = backend::decode_utf8(NETWORKSETUP, &output.stdout)?;
        if let Some(ssid) = parse_current_network(&text) {
            return Ok(Some(ssid));
        }
        if !output.status.success() && !text.contains("not associated") {
            return Err(backend::command_failed(NETWORKSETUP, &output));
        }
        Ok(None)
    }

    fn saved_profiles(&self) -> WifiResult<Vec<String>> {
        let device = self.device()?;
        let output =
            backend::run_checked(NETWORKSETUP, &["-listpreferredwirelessnetworks", device])?;
        let text = backend::decode_utf8(NETWORKSETUP, &output.stdout)?;
        Ok(parse_preferred_networks(&text))
    }

    fn register_profile(&self, profile: &ProfileSpec) -> WifiResult<()> {
        let device = self.device()?;
        let security = match profile.security {
            Security::Wpa2Psk => "WPA2",
            Security::Open => "OPEN",
        };
        let mut args = vec![
            "-addpreferredwirelessnetworkatindex",
            device,
            profile.ssid.as_str(),
            "0",
            security,
        ];
        if let Some(credential) = &profile.credential {
            args.push(credential.expose_secret());
        }
        backend::run_checked(NETWORKSETUP, &args)?;
        Ok(())
    }

    fn connect_network(&self, ssid: &str) -> WifiResult<()> {
        let device = self.device()?;
        let output = backend::run_checked(NETWORKSETUP, &["-setairportnetwork", device, ssid])?;
        // The tool reports join failures on stdout with a zero exit.
        let text = backend::decode_utf8(NETWORKSETUP, &output.stdout)?;
        if let Some(reason) = parse_join_failure(&text) {
            return Err(WifiError::CommandFailed {
                command: NETWORKSETUP.to_string(),
                status: output.status.to_string(),
                detail: reason,
            });
        }
        Ok(())
    }

    fn disconnect_network(&self, _ssid: &str) -> WifiResult<()> {
        backend::run_checked(AIRPORT, &["-z"])?;
        Ok(())
    }
}

/// Find the BSD device of the Wi-Fi hardware port in
/// `networksetup -listallhardwareports` output. Ports come in stanzas of
/// `Hardware Port:` / `Device:` / `Ethernet Address:` lines.
pub(crate) fn parse_wifi_device(text: &str) -> Option<String> {
    let mut in_wifi_port = false;
    for line in text.lines() {
        let line = line.trim();
        if let Some(port) = line.strip_prefix("Hardware Port:") {
            let port = port.trim();
            // "AirPort" appears on older OS versions.
            in_wifi_port = port.contains("Wi-Fi") || port.contains("AirPort");
        } else if let Some(device) = line.strip_prefix("Device:") {
            let device = device.trim();
            if in_wifi_port && !device.is_empty() {
                return Some(device.to_string());
            }
        }
    }
    None
}

/// Parse the `airport -s` column listing. The SSID column is right-aligned
/// and may contain spaces, so rows are anchored on the BSSID MAC token:
/// everything before it is the SSID, the columns after it are
/// RSSI/CHANNEL/HT/CC/SECURITY. Rows without a MAC (the header, hidden
/// shapes we do not know) are dropped.
pub(crate) fn parse_airport_listing(text: &str) -> Vec<NetworkRecord> {
    let mut records = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(bssid_idx) = tokens.iter().position(|token| is_mac(token)) else {
            continue;
        };
        let ssid = tokens[..bssid_idx].join(" ");
        let signal = tokens
            .get(bssid_idx + 1)
            .and_then(|token| token.parse::<i32>().ok())
            .map(rssi_to_percent);
        let auth = if tokens.len() > bssid_idx + 5 {
            tokens[bssid_idx + 5..].join(" ")
        } else {
            UNKNOWN_AUTH.to_string()
        };
        records.push(NetworkRecord {
            ssid,
            signal,
            auth,
            connected: false,
        });
    }
    records
}

/// Extract the SSID from `networksetup -getairportnetwork` output.
pub(crate) fn parse_current_network(text: &str) -> Option<String> {
    for line in text.lines() {
        let line = line.trim();
        for prefix in ["Current Wi-Fi Network:", "Current AirPort Network:"] {
            if let Some(ssid) = line.strip_prefix(prefix) {
                let ssid = ssid.trim();
                if !ssid.is_empty() {
                    return Some(ssid.to_string());
                }
            }
        }
    }
    None
}

/// Preferred network names: every indented line below the
/// `Preferred networks on <dev>:` header.
pub(crate) fn parse_preferred_networks(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| line.starts_with(char::is_whitespace))
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

pub(crate) fn parse_join_failure(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|line| line.starts_with("Failed") || line.starts_with("Could not") || line.contains("Error"))
        .map(str::to_string)
}

/// Map an RSSI in dBm onto the 0–100 quality range the rest of the crate
/// uses (-100 dBm → 0, -50 dBm and better → 100).
fn rssi_to_percent(rssi: i32) -> u8 {
    ((rssi + 100) * 2).clamp(0, 100) as u8
}

fn is_mac(token: &str) -> bool {
    let bytes = token.as_bytes();
    bytes.len() == 17
        && bytes.iter().enumerate().all(|(i, byte)| {
            if i % 3 == 2 {
                *byte == b':'
            } else {
                byte.is_ascii_hexdigit()
            }
        })
}
