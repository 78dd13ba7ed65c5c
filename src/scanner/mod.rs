//! Service port prober: TCP connect checks against a candidate list

use crate::network::Platform;
use crate::top_ports::service_name;
use futures::future::join_all;
use std::net::Ipv4Addr;
use std::time::Duration;

/// Open ports found on one host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortScanResult {
    pub address: Ipv4Addr,
    /// Ascending, no duplicates
    pub open_ports: Vec<u16>,
}

/// Try a TCP handshake on every candidate port of `address`.
///
/// The ports of one host are probed concurrently; each probe is bounded by
/// `timeout`, so the whole call takes at most about one timeout. Refused,
/// unreachable and timed-out ports all count as closed.
pub async fn scan_ports(
    platform: &dyn Platform,
    address: Ipv4Addr,
    ports: &[u16],
    timeout: Duration,
) -> PortScanResult {
    let probes = ports.iter().map(|&port| async move {
        let open = platform.connect(address, port, timeout).await;
        (port, open)
    });

    let mut open_ports: Vec<u16> = join_all(probes)
        .await
        .into_iter()
        .filter_map(|(port, open)| open.then_some(port))
        .collect();
    open_ports.sort_unstable();
    open_ports.dedup();

    for port in &open_ports {
        log::debug!(
            "{}:{} open ({})",
            address,
            port,
            service_name(*port).unwrap_or("unknown")
        );
    }
    PortScanResult { address, open_ports }
}
