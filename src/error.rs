/// Typed errors for wifijoin platform operations
use thiserror::Error;

/// Result type alias for Wi-Fi operations
pub type WifiResult<T> = Result<T, WifiError>;

/// Errors that can occur while driving the platform network tools
#[derive(Error, Debug)]
pub enum WifiError {
    #[error("failed to run {command}: {source}")]
    PlatformUnavailable {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {status}: {detail}")]
    CommandFailed {
        command: String,
        status: String,
        detail: String,
    },

    #[error("{command} produced output that is not valid {encoding}")]
    Decode {
        command: String,
        encoding: &'static str,
    },

    #[error("failed to stage profile for registration: {source}")]
    ProfileStage {
        #[source]
        source: std::io::Error,
    },

    #[error("No Wi-Fi interface found")]
    NoInterface,
}
