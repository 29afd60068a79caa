/// Centralized configuration constants for wifijoin

// Timing
pub const CONNECT_TIMEOUT_SECS: u64 = 10;
pub const CONNECT_POLL_INTERVAL_MS: u64 = 1000;
pub const PROFILE_REGISTRATION_DELAY_MS: u64 = 1500;
