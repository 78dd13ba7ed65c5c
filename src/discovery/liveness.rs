//! Liveness probing: one echo request per host

use super::LivenessResult;
use crate::network::Platform;
use std::net::Ipv4Addr;
use std::time::Duration;

/// Probe a single host. Failures of any kind (no reply, helper missing,
/// helper hung) report the host as unreachable.
pub async fn probe(platform: &dyn Platform, address: Ipv4Addr, timeout: Duration) -> LivenessResult {
    let reachable = platform.ping(address, timeout).await;
    if reachable {
        log::debug!("{} is up", address);
    }
    LivenessResult { address, reachable }
}
