//! lanscan - LAN host discovery
//!
//! Ping-sweeps an IPv4 subnet, pairs every responding host with its MAC from
//! the neighbor cache, then either probes a short list of common TCP ports or
//! looks up each host's name.

pub mod config;
pub mod discovery;
pub mod error;
pub mod network;
pub mod output;
pub mod scanner;
pub mod top_ports;
pub mod utils;

// Re-export commonly used types
pub use config::DiscoveryConfig;
pub use discovery::{DiscoveryEngine, RowDetail, ScanMode, ScanReport, ScanRow, ScanStatus};
pub use error::{ScanError, ScanResult};
pub use network::{Platform, SystemPlatform};
pub use top_ports::default_ports;
pub use utils::target_parser::{Subnet, TargetParser};

pub type Result<T> = std::result::Result<T, ScanError>;
