//! Backend for Linux built on NetworkManager's `nmcli`.
//!
//! All queries use terse mode (`-t`): one record per line, `:`-separated
//! fields, with literal colons escaped as `\:`. That keeps the parsing
//! locale-proof, unlike the human-readable tables.

use secrecy::ExposeSecret;

use crate::error::WifiResult;
use crate::wifi::backend::{self, NetworkBackend};
use crate::wifi::profile::{ProfileSpec, Security};
use crate::wifi::types::NetworkRecord;

const NMCLI: &str = "nmcli";

pub struct LinuxBackend;

impl LinuxBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LinuxBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkBackend for LinuxBackend {
    fn name(&self) -> &'static str {
        "nmcli"
    }

    fn list_networks(&self) -> WifiResult<Vec<NetworkRecord>> {
        let output = backend::run_checked(
            NMCLI,
            &["-t", "-f", "SSID,SIGNAL,SECURITY", "device", "wifi", "list"],
        )?;
        let text = backend::decode_utf8(NMCLI, &output.stdout)?;
        Ok(parse_terse_networks(&text))
    }

    fn current_ssid(&self) -> WifiResult<Option<String>> {
        let output =
            backend::run_checked(NMCLI, &["-t", "-f", "ACTIVE,SSID", "device", "wifi"])?;
        let text = backend::decode_utf8(NMCLI, &output.stdout)?;
        Ok(parse_active_ssid(&text))
    }

    fn saved_profiles(&self) -> WifiResult<Vec<String>> {
        let output = backend::run_checked(NMCLI, &["-t", "-f", "NAME", "connection", "show"])?;
        let text = backend::decode_utf8(NMCLI, &output.stdout)?;
        Ok(text
            .lines()
            .map(|line| unescape_terse(line.trim()))
            .filter(|name| !name.is_empty())
            .collect())
    }

    fn register_profile(&self, profile: &ProfileSpec) -> WifiResult<()> {
        let mut args = vec![
            "connection",
            "add",
            "type",
            "wifi",
            "con-name",
            profile.ssid.as_str(),
            "ssid",
            profile.ssid.as_str(),
        ];
        if let (Security::Wpa2Psk, Some(credential)) = (profile.security, &profile.credential) {
            args.extend([
                "wifi-sec.key-mgmt",
                "wpa-psk",
                "wifi-sec.psk",
                credential.expose_secret(),
            ]);
        }
        backend::run_checked(NMCLI, &args)?;
        Ok(())
    }

    fn connect_network(&self, ssid: &str) -> WifiResult<()> {
        backend::run_checked(NMCLI, &["connection", "up", "id", ssid])?;
        Ok(())
    }

    fn disconnect_network(&self, ssid: &str) -> WifiResult<()> {
        backend::run_checked(NMCLI, &["connection", "down", "id", ssid])?;
        Ok(())
    }
}

/// Parse `nmcli -t -f SSID,SIGNAL,SECURITY device wifi list` output, one
/// access point per line. Lines with a different field count are dropped.
pub(crate) fn parse_terse_networks(text: &str) -> Vec<NetworkRecord> {
    let mut records = Vec::new();
    for line in text.lines() {
        if line.is_empty() {
            continue;
        }
        let fields = split_terse(line);
        let [ssid, signal, security] = fields.as_slice() else {
            tracing::warn!(line, "dropping scan line with unexpected field count");
            continue;
        };
        records.push(NetworkRecord {
            ssid: ssid.clone(),
            signal: signal.parse::<u8>().ok().map(|s| s.min(100)),
            // An empty SECURITY field is how nmcli renders an open network.
            auth: if security.is_empty() {
                "Open".to_string()
            } else {
                security.clone()
            },
            connected: false,
        });
    }
    records
}

/// SSID of the row flagged active in `nmcli -t -f ACTIVE,SSID device wifi`.
pub(crate) fn parse_active_ssid(text: &str) -> Option<String> {
    for line in text.lines() {
        let fields = split_terse(line);
        let [active, ssid] = fields.as_slice() else {
            continue;
        };
        if active == "yes" && !ssid.is_empty() {
            return Some(ssid.clone());
        }
    }
    None
}

/// Split one terse-mode line into fields, honouring `\:` and `\\` escapes.
pub(crate) fn split_terse(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            ':' => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

fn unescape_terse(line: &str) -> String {
    split_terse(line).join(":")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terse_listing_parses_each_line() {
        let output = "HomeNet:87:WPA2\nCafeGuest:52:\nNeighbor:31:WPA1 WPA2\n";
        let records = parse_terse_networks(output);
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].ssid, "HomeNet");
        assert_eq!(records[0].signal, Some(87));
        assert_eq!(records[0].auth, "WPA2");

        assert_eq!(records[1].auth, "Open");
        assert_eq!(records[2].auth, "WPA1 WPA2");
    }

    #[test]
    fn escaped_colons_stay_in_the_ssid() {
        let records = parse_terse_networks("lab\\:2.4\\:guest:64:WPA2\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ssid, "lab:2.4:guest");
        assert_eq!(records[0].signal, Some(64));
    }

    #[test]
    fn hidden_ssid_is_empty_here() {
        let records = parse_terse_networks(":45:WPA2\n");
        assert_eq!(records[0].ssid, "");
    }

    #[test]
    fn malformed_lines_are_dropped() {
        let records = parse_terse_networks("justonefield\nHomeNet:87:WPA2\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ssid, "HomeNet");
    }

    #[test]
    fn unparseable_signal_becomes_unknown() {
        let records = parse_terse_networks("HomeNet:??:WPA2\n");
        assert_eq!(records[0].signal, None);
    }

    #[test]
    fn active_row_yields_current_ssid() {
        let output = "no:CafeGuest\nyes:HomeNet\nno:Neighbor\n";
        assert_eq!(parse_active_ssid(output), Some("HomeNet".to_string()));
    }

    #[test]
    fn no_active_row_means_not_associated() {
        assert_eq!(parse_active_ssid("no:CafeGuest\nno:Neighbor\n"), None);
        assert_eq!(parse_active_ssid(""), None);
    }

    #[test]
    fn split_terse_handles_escapes() {
        assert_eq!(split_terse("a\\:b:c"), vec!["a:b".to_string(), "c".to_string()]);
        assert_eq!(split_terse("a\\\\:b"), vec!["a\\".to_string(), "b".to_string()]);
        assert_eq!(split_terse(""), vec![String::new()]);
    }
}
