//! Local interface enumeration for named-network targets and `--list`

use crate::utils::target_parser::Subnet;
use pnet::datalink;
use std::collections::HashSet;
use std::net::IpAddr;

/// A local network reachable through a named interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedNetwork {
    pub name: String,
    pub subnet: Subnet,
}

/// True if the interface should be skipped (VPN/tunnel, bridge, unnamed).
/// Matching is a case-insensitive prefix test.
pub fn is_ignored_interface<S: AsRef<str>>(name: &str, ignored_prefixes: &[S]) -> bool {
    if name.is_empty() {
        return true;
    }
    let lower = name.to_lowercase();
    ignored_prefixes
        .iter()
        .any(|prefix| lower.starts_with(&prefix.as_ref().to_lowercase()))
}

/// Every non-ignored interface that carries a non-loopback IPv4 subnet,
/// ordered by interface name, one entry per distinct subnet.
pub fn available_networks<S: AsRef<str>>(ignored_prefixes: &[S]) -> Vec<NamedNetwork> {
    let candidates = datalink::interfaces().into_iter().flat_map(|iface| {
        iface
            .ips
            .iter()
            .filter_map(|net| match net.ip() {
                IpAddr::V4(addr) if !addr.is_loopback() => Some((addr, net.prefix())),
                _ => None,
            })
            .map(|(addr, prefix)| (iface.name.clone(), addr, prefix))
            .collect::<Vec<_>>()
    });

    let mut networks: Vec<NamedNetwork> = candidates
        .filter_map(|(name, addr, prefix)| {
            Subnet::from_parts(addr, prefix)
                .ok()
                .map(|subnet| NamedNetwork { name, subnet })
        })
        .collect();
    log::debug!("Found {} IPv4 interface addresses", networks.len());

    networks.sort_by(|a, b| a.name.cmp(&b.name));
    filter_networks(networks, ignored_prefixes)
}

/// Drop ignored interfaces and repeated subnets, keeping the first occurrence
pub fn filter_networks<S: AsRef<str>>(
    networks: Vec<NamedNetwork>,
    ignored_prefixes: &[S],
) -> Vec<NamedNetwork> {
    let mut seen = HashSet::new();
    networks
        .into_iter()
        .filter(|n| !is_ignored_interface(&n.name, ignored_prefixes))
        .filter(|n| seen.insert(n.subnet))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIXES: &[&str] = &["utun", "ppp", "ipsec", "bridge"];

    fn named(name: &str, cidr: &str) -> NamedNetwork {
        NamedNetwork {
            name: name.to_string(),
            subnet: Subnet::parse(cidr).unwrap(),
        }
    }

    #[test]
    fn test_ignored_interfaces() {
        assert!(is_ignored_interface("utun3", PREFIXES));
        assert!(is_ignored_interface("PPP0", PREFIXES));
        assert!(is_ignored_interface("ipsec0", PREFIXES));
        assert!(is_ignored_interface("bridge100", PREFIXES));
        assert!(is_ignored_interface("", PREFIXES));

        assert!(!is_ignored_interface("en0", PREFIXES));
        assert!(!is_ignored_interface("eth0", PREFIXES));
        assert!(!is_ignored_interface("wlan0", PREFIXES));
    }

    #[test]
    fn test_no_prefixes_ignores_only_empty_names() {
        let none: &[&str] = &[];
        assert!(!is_ignored_interface("utun0", none));
        assert!(is_ignored_interface("", none));
    }

    #[test]
    fn test_filter_networks_dedups_and_skips_vpn() {
        let networks = vec![
            named("en0", "192.168.1.0/24"),
            named("en1", "192.168.1.0/24"),
            named("utun2", "10.8.0.0/24"),
            named("en5", "172.16.0.0/16"),
        ];

        let filtered = filter_networks(networks, PREFIXES);
        assert_eq!(
            filtered,
            vec![named("en0", "192.168.1.0/24"), named("en5", "172.16.0.0/16")]
        );
    }
}
