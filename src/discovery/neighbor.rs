//! Link-layer resolution from the OS neighbor (ARP) cache
//!
//! The cache is read once per scan, after the sweep, and parsed into a
//! [`NeighborTable`]. Three text formats are understood:
//!
//! - BSD/macOS and Linux `arp -an`: `? (192.168.1.1) at a0:b1:c2:d3:e4:f5 on en0 ...`
//! - Windows `arp -a`: `  192.168.1.1     a0-b1-c2-d3-e4-f5     dynamic`
//! - Linux `/proc/net/arp`, recognised by its `HW address` header
//!
//! Unresolved entries are skipped, never stored as empty.

use crate::network::Platform;
use once_cell::sync::Lazy;
use pnet::util::MacAddr;
use regex::Regex;
use std::collections::hash_map::{Entry, HashMap};
use std::net::Ipv4Addr;
use std::time::Duration;

static ARP_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(?(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})\)?\s+at\s+([0-9A-Fa-f:]+)")
        .expect("valid arp regex")
});

static WINDOWS_ARP_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})\s+([0-9A-Fa-f]{2}(?:-[0-9A-Fa-f]{2}){5})\s")
        .expect("valid windows arp regex")
});

/// `/proc/net/arp` flag value for an incomplete entry
const ATF_INCOMPLETE: &str = "0x0";

/// Address to MAC lookup built from one neighbor cache read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NeighborTable {
    entries: HashMap<Ipv4Addr, MacAddr>,
}

impl NeighborTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// MAC for `addr`, if the cache had a complete entry
    pub fn get(&self, addr: &Ipv4Addr) -> Option<MacAddr> {
        self.entries.get(addr).copied()
    }

    /// Insert unless the address is already present. Returns true if stored.
    pub fn insert(&mut self, addr: Ipv4Addr, mac: MacAddr) -> bool {
        match self.entries.entry(addr) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(mac);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Ipv4Addr, &MacAddr)> {
        self.entries.iter()
    }
}

impl FromIterator<(Ipv4Addr, MacAddr)> for NeighborTable {
    fn from_iter<T: IntoIterator<Item = (Ipv4Addr, MacAddr)>>(iter: T) -> Self {
        let mut table = NeighborTable::new();
        for (addr, mac) in iter {
            table.insert(addr, mac);
        }
        table
    }
}

/// Parse a MAC written with `:` or `-` separators and one- or two-digit
/// octets. The all-zero address is what some systems print for unresolved
/// entries and is rejected.
pub fn parse_mac(raw: &str) -> Option<MacAddr> {
    let mac: MacAddr = raw.trim().replace('-', ":").parse().ok()?;
    (mac != MacAddr::zero()).then_some(mac)
}

/// Canonical text form: six lowercase, zero-padded, colon-separated octets
/// (`0:1a:b:c:d:e` becomes `00:1a:0b:0c:0d:0e`)
pub fn normalize_mac(raw: &str) -> Option<String> {
    parse_mac(raw).map(|mac| mac.to_string())
}

/// Parse the raw neighbor cache text into a table
pub fn parse_neighbor_output(output: &str) -> NeighborTable {
    let mut lines = output.lines().peekable();
    let is_proc_table = lines
        .peek()
        .map(|header| header.contains("HW address"))
        .unwrap_or(false);

    if is_proc_table {
        lines.next();
        return lines.filter_map(parse_proc_line).collect();
    }

    lines
        .filter(|line| !line.contains("incomplete"))
        .filter_map(parse_arp_line)
        .collect()
}

fn parse_arp_line(line: &str) -> Option<(Ipv4Addr, MacAddr)> {
    let caps = ARP_LINE
        .captures(line)
        .or_else(|| WINDOWS_ARP_LINE.captures(line))?;
    let addr: Ipv4Addr = caps.get(1)?.as_str().parse().ok()?;
    let mac = parse_mac(caps.get(2)?.as_str())?;
    Some((addr, mac))
}

// IP address  HW type  Flags  HW address  Mask  Device
fn parse_proc_line(line: &str) -> Option<(Ipv4Addr, MacAddr)> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 4 || fields[2] == ATF_INCOMPLETE {
        return None;
    }
    let addr: Ipv4Addr = fields[0].parse().ok()?;
    let mac = parse_mac(fields[3])?;
    Some((addr, mac))
}

/// Read and parse the neighbor cache. A failed read yields an empty table.
pub async fn resolve_all(platform: &dyn Platform, timeout: Duration) -> NeighborTable {
    match platform.read_neighbor_cache(timeout).await {
        Ok(output) => {
            let table = parse_neighbor_output(&output);
            log::debug!("Neighbor cache has {} resolved entries", table.len());
            table
        }
        Err(e) => {
            log::warn!("Could not read neighbor cache, MAC addresses will be missing: {}", e);
            NeighborTable::new()
        }
    }
}
