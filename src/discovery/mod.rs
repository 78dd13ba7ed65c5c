//! Host discovery: liveness sweep, neighbor correlation and per-host enrichment
//!
//! A scan runs three strictly sequential phases over one subnet:
//! 1. **Sweep**: one liveness probe per usable host address, under a bounded pool.
//! 2. **Settle + neighbor read**: a short pause, then a single read of the
//!    OS neighbor cache covering every host.
//! 3. **Enrichment**: per responding host, either a TCP port probe or a reverse
//!    lookup, under a second (smaller) bounded pool.
//!
//! Results of all three are joined on the host address into [`ScanRow`]s.

pub mod engine;
pub mod hostname;
pub mod liveness;
pub mod neighbor;
pub mod pool;

use chrono::{DateTime, Utc};
use pnet::util::MacAddr;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::time::Duration;

pub use engine::DiscoveryEngine;
pub use neighbor::NeighborTable;

/// What the enrichment phase collects for each responding host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Reverse DNS name per host
    #[default]
    Hostname,
    /// Open TCP ports from the candidate list per host
    Ports,
}

impl ScanMode {
    pub fn from_port_flag(ports: bool) -> Self {
        if ports {
            ScanMode::Ports
        } else {
            ScanMode::Hostname
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanMode::Hostname => write!(f, "hostname"),
            ScanMode::Ports => write!(f, "port scan"),
        }
    }
}

/// Outcome of one liveness probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessResult {
    pub address: Ipv4Addr,
    pub reachable: bool,
}

/// Outcome of one reverse lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostnameResult {
    pub address: Ipv4Addr,
    pub hostname: Option<String>,
}

/// Sweep progress, reported once per completed liveness probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepProgress {
    pub completed: usize,
    pub total: usize,
    pub responded: usize,
}

/// Per-host enrichment data; exactly one kind per scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowDetail {
    Ports(Vec<u16>),
    Hostname(Option<String>),
}

/// Final joined record for one responding host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRow {
    pub address: Ipv4Addr,
    pub mac: Option<MacAddr>,
    pub detail: RowDetail,
}

impl ScanRow {
    pub fn ports(&self) -> Option<&[u16]> {
        match &self.detail {
            RowDetail::Ports(ports) => Some(ports),
            RowDetail::Hostname(_) => None,
        }
    }

    pub fn hostname(&self) -> Option<&str> {
        match &self.detail {
            RowDetail::Hostname(name) => name.as_deref(),
            RowDetail::Ports(_) => None,
        }
    }
}

/// Terminal state of a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    /// The subnet has no usable host addresses; nothing was probed
    NoHosts,
    /// Every liveness probe failed
    NoResponses,
    Completed,
}

/// Everything one scan produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub subnet: String,
    pub mode: ScanMode,
    pub host_count: u64,
    pub responded: usize,
    /// Sorted ascending by address, one row per responding host
    pub rows: Vec<ScanRow>,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
}

impl ScanReport {
    pub fn status(&self) -> ScanStatus {
        if self.host_count == 0 {
            ScanStatus::NoHosts
        } else if self.responded == 0 {
            ScanStatus::NoResponses
        } else {
            ScanStatus::Completed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(host_count: u64, responded: usize) -> ScanReport {
        ScanReport {
            subnet: "192.168.1.0/24".to_string(),
            mode: ScanMode::Hostname,
            host_count,
            responded,
            rows: Vec::new(),
            started_at: Utc::now(),
            duration: Duration::ZERO,
        }
    }

    #[test]
    fn test_report_status() {
        assert_eq!(report(0, 0).status(), ScanStatus::NoHosts);
        assert_eq!(report(254, 0).status(), ScanStatus::NoResponses);
        assert_eq!(report(254, 3).status(), ScanStatus::Completed);
    }

    #[test]
    fn test_row_detail_accessors() {
        let port_row = ScanRow {
            address: Ipv4Addr::new(10, 0, 0, 1),
            mac: None,
            detail: RowDetail::Ports(vec![22, 443]),
        };
        assert_eq!(port_row.ports(), Some(&[22, 443][..]));
        assert_eq!(port_row.hostname(), None);

        let name_row = ScanRow {
            address: Ipv4Addr::new(10, 0, 0, 2),
            mac: Some(MacAddr(0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff)),
            detail: RowDetail::Hostname(Some("printer.lan".to_string())),
        };
        assert_eq!(name_row.ports(), None);
        assert_eq!(name_row.hostname(), Some("printer.lan"));
    }

    #[test]
    fn test_mode_from_flag() {
        assert_eq!(ScanMode::from_port_flag(true), ScanMode::Ports);
        assert_eq!(ScanMode::from_port_flag(false), ScanMode::Hostname);
        assert_eq!(ScanMode::default(), ScanMode::Hostname);
    }
}
