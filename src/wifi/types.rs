/// Sentinel SSID for hidden networks or entries whose name could not be read.
pub const UNKNOWN_SSID: &str = "Unknown";

/// Sentinel security descriptor when the listing did not include one.
pub const UNKNOWN_AUTH: &str = "Unknown";

/// One Wi-Fi network observed at scan time. Records are built fresh on every
/// scan and never mutated afterwards; a new scan replaces the whole list.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NetworkRecord {
    pub ssid: String,
    /// Signal quality in percent. `None` when the platform does not report
    /// one; unknown sorts below every known value.
    pub signal: Option<u8>,
    /// Security descriptor as the platform printed it.
    pub auth: String,
    /// True iff this record's SSID matches the current association.
    pub connected: bool,
}

/// Terminal result of one connect attempt. These are ordinary return values,
/// not errors; retrying is the caller's decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    Connected,
    TimedOut,
    Failed(String),
    Cancelled,
}
