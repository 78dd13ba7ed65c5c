//! Reverse name resolution for responding hosts

use super::HostnameResult;
use crate::network::Platform;
use std::net::Ipv4Addr;
use std::time::Duration;

/// Resolve `address` to a name. A resolver that just echoes the address back,
/// or answers with an empty name, counts as no name.
pub async fn resolve(platform: &dyn Platform, address: Ipv4Addr, timeout: Duration) -> HostnameResult {
    let hostname = platform
        .reverse_lookup(address, timeout)
        .await
        .map(|name| name.trim().trim_end_matches('.').to_string())
        .filter(|name| !name.is_empty() && *name != address.to_string());

    if let Some(name) = &hostname {
        log::debug!("{} resolves to {}", address, name);
    }
    HostnameResult { address, hostname }
}
