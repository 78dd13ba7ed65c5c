//! Candidate TCP ports probed on each responding host

use crate::{ScanError, ScanResult};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Common LAN services, in ascending port order
pub const COMMON_LAN_PORTS: &[(u16, &str)] = &[
    (21, "ftp"),
    (22, "ssh"),
    (23, "telnet"),
    (80, "http"),
    (443, "https"),
    (445, "smb"),
    (631, "ipp"),
    (3306, "mysql"),
    (3389, "rdp"),
    (5353, "mdns"),
    (8080, "http-alt"),
    (9100, "jetdirect"),
    (62078, "iphone-sync"),
];

static SERVICE_NAMES: Lazy<HashMap<u16, &'static str>> =
    Lazy::new(|| COMMON_LAN_PORTS.iter().copied().collect());

/// The default candidate port list
pub fn default_ports() -> Vec<u16> {
    COMMON_LAN_PORTS.iter().map(|(port, _)| *port).collect()
}

/// Well-known service label for a candidate port
pub fn service_name(port: u16) -> Option<&'static str> {
    SERVICE_NAMES.get(&port).copied()
}

/// Parse a port list such as `22,80,8000-8010` into an ascending, deduplicated list
pub fn parse_port_list(input: &str) -> ScanResult<Vec<u16>> {
    let mut ports = Vec::new();

    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if let Some((start, end)) = part.split_once('-') {
            let start: u16 = start.trim().parse()?;
            let end: u16 = end.trim().parse()?;
            if start == 0 || start > end {
                return Err(ScanError::ParseError(format!("Invalid port range: {}", part)));
            }
            ports.extend(start..=end);
        } else {
            let port: u16 = part.parse()?;
            if port == 0 {
                return Err(ScanError::ParseError("Port 0 cannot be probed".to_string()));
            }
            ports.push(port);
        }
    }

    if ports.is_empty() {
        return Err(ScanError::ParseError("Empty port list".to_string()));
    }

    ports.sort_unstable();
    ports.dedup();
    Ok(ports)
}
