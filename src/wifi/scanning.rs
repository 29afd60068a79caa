use std::collections::HashSet;

use crate::error::WifiResult;
use crate::wifi::WifiManager;
use crate::wifi::types::{NetworkRecord, UNKNOWN_SSID};

impl WifiManager {
    /// Scan for nearby networks: enumerate through the backend, mark the
    /// record matching the current association, then normalise the list
    /// (hidden-SSID sentinel, one record per SSID, connected network first,
    /// strongest signal next).
    ///
    /// A failing backend surfaces as an error; it is never collapsed into an
    /// empty list, so callers can tell "nothing in range" from "scan broke".
    pub fn scan(&self) -> WifiResult<Vec<NetworkRecord>> {
        let mut records = self.backend().list_networks()?;
        let current = self.backend().current_ssid()?;
        annotate_connected(&mut records, current.as_deref());
        let records = normalize(records);
        tracing::debug!(backend = self.backend().name(), count = records.len(), "scan complete");
        Ok(records)
    }
}

/// Mark every record whose SSID matches the current association. Hidden
/// networks still carry their raw (empty) SSID here and can never match.
pub(crate) fn annotate_connected(records: &mut [NetworkRecord], current: Option<&str>) {
    let Some(current) = current else { return };
    for record in records {
        if !record.ssid.is_empty() && record.ssid == current {
            record.connected = true;
        }
    }
}

/// Normalise a parsed scan: substitute the sentinel for unreadable SSIDs
/// (forcing those records disconnected), keep the first record per SSID,
/// and order connected-first then by descending signal with unknown signal
/// at the bottom. The sort is stable, so ties keep scan order.
pub(crate) fn normalize(records: Vec<NetworkRecord>) -> Vec<NetworkRecord> {
    let mut seen = HashSet::new();
    let mut records: Vec<NetworkRecord> = records
        .into_iter()
        .map(|mut record| {
            if record.ssid.is_empty() {
                record.ssid = UNKNOWN_SSID.to_string();
                record.connected = false;
            }
            record
        })
        .filter(|record| seen.insert(record.ssid.clone()))
        .collect();

    records.sort_by_key(|record| {
        let signal = record.signal.map_or(-1i16, i16::from);
        (!record.connected, std::cmp::Reverse(signal))
    });
    records
}
