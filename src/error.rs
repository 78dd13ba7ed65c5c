//! Error handling for the lanscan discovery engine
//!
//! Only input errors abort a scan. Everything a single probe can run into is
//! absorbed at the probe boundary and turned into a negative value
//! (unreachable, closed, no hostname, no MAC), so most of these variants only
//! ever surface from configuration loading or from the platform layer before
//! the engine downgrades them.

use thiserror::Error;

/// Main error type for discovery operations
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Invalid subnet: {0}")]
    InvalidSubnet(String),

    #[error("Unsupported address family: {0} (only IPv4 subnets can be scanned)")]
    UnsupportedFamily(String),

    #[error("Subnet {subnet} has {hosts} usable hosts, limit is {limit}")]
    SubnetTooLarge { subnet: String, hosts: u64, limit: u64 },

    #[error("Unknown network interface: {0}")]
    UnknownInterface(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Timeout error")]
    TimeoutError,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Output error: {0}")]
    OutputError(String),
}

impl ScanError {
    /// Whether this error is caused by what the user typed, as opposed to the
    /// environment the scan runs in.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ScanError::InvalidSubnet(_)
                | ScanError::UnsupportedFamily(_)
                | ScanError::SubnetTooLarge { .. }
                | ScanError::UnknownInterface(_)
        )
    }
}

/// Result type alias for discovery operations
pub type ScanResult<T> = Result<T, ScanError>;

impl From<std::net::AddrParseError> for ScanError {
    fn from(e: std::net::AddrParseError) -> Self {
        ScanError::InvalidSubnet(e.to_string())
    }
}

impl From<std::num::ParseIntError> for ScanError {
    fn from(e: std::num::ParseIntError) -> Self {
        ScanError::ParseError(e.to_string())
    }
}

impl From<ipnetwork::IpNetworkError> for ScanError {
    fn from(e: ipnetwork::IpNetworkError) -> Self {
        ScanError::InvalidSubnet(e.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for ScanError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        ScanError::TimeoutError
    }
}

impl From<serde_json::Error> for ScanError {
    fn from(e: serde_json::Error) -> Self {
        ScanError::OutputError(e.to_string())
    }
}

impl From<csv::Error> for ScanError {
    fn from(e: csv::Error) -> Self {
        ScanError::OutputError(e.to_string())
    }
}
