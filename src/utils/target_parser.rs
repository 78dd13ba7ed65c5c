//! Target parsing: IPv4 subnets in CIDR notation and named networks
//!
//! A target is either a CIDR string (`192.168.1.0/24`) or the name of a local
//! interface (`en0`, `eth0`) whose IPv4 subnet is looked up at parse time.
//! Host bits in a CIDR are accepted and masked off, so `192.168.1.7/24`
//! describes the same subnet as `192.168.1.0/24`.

use crate::network::interface::{available_networks, NamedNetwork};
use crate::{ScanError, ScanResult};
use ipnetwork::{IpNetwork, Ipv4Network};
use std::fmt;
use std::net::Ipv4Addr;

/// An IPv4 network: base address plus prefix length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subnet {
    network: Ipv4Network,
}

impl Subnet {
    /// Parse a CIDR string. IPv6 networks are rejected.
    pub fn parse(input: &str) -> ScanResult<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ScanError::InvalidSubnet("subnet cannot be empty".to_string()));
        }
        if !input.contains('/') {
            return Err(ScanError::InvalidSubnet(format!(
                "{} is not in CIDR notation (e.g. 192.168.1.0/24)",
                input
            )));
        }

        match input.parse::<IpNetwork>()? {
            IpNetwork::V4(v4) => Self::from_parts(v4.ip(), v4.prefix()),
            IpNetwork::V6(_) => Err(ScanError::UnsupportedFamily(input.to_string())),
        }
    }

    /// Build a subnet from any address inside it and a prefix length
    pub fn from_parts(addr: Ipv4Addr, prefix: u8) -> ScanResult<Self> {
        let with_host_bits = Ipv4Network::new(addr, prefix)?;
        let network = Ipv4Network::new(with_host_bits.network(), prefix)?;
        Ok(Self { network })
    }

    pub fn network_address(&self) -> Ipv4Addr {
        self.network.network()
    }

    pub fn broadcast_address(&self) -> Ipv4Addr {
        self.network.broadcast()
    }

    pub fn prefix(&self) -> u8 {
        self.network.prefix()
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        self.network.contains(addr)
    }

    /// Number of usable host addresses (network and broadcast excluded).
    /// `/31` and `/32` have none.
    pub fn host_count(&self) -> u64 {
        match self.prefix() {
            prefix @ 0..=30 => (1u64 << (32 - prefix as u32)) - 2,
            _ => 0,
        }
    }

    /// Lazily enumerate the usable host addresses in ascending order
    pub fn hosts(&self) -> impl DoubleEndedIterator<Item = Ipv4Addr> {
        let first = u32::from(self.network_address()) as u64 + 1;
        let end = first + self.host_count();
        (first..end).map(|addr| Ipv4Addr::from(addr as u32))
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network_address(), self.prefix())
    }
}

impl std::str::FromStr for Subnet {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Subnet::parse(s)
    }
}

/// Target parser with a host-count limit and interface-name lookup
pub struct TargetParser {
    max_hosts: u64,
    ignored_interface_prefixes: Vec<String>,
}

impl Default for TargetParser {
    fn default() -> Self {
        Self {
            max_hosts: 65_534,
            ignored_interface_prefixes: crate::config::DEFAULT_IGNORED_INTERFACE_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

impl TargetParser {
    pub fn new(max_hosts: u64, ignored_interface_prefixes: Vec<String>) -> Self {
        Self {
            max_hosts,
            ignored_interface_prefixes,
        }
    }

    pub fn from_config(config: &crate::config::DiscoveryConfig) -> Self {
        Self::new(config.max_hosts, config.ignored_interface_prefixes.clone())
    }

    /// Parse a CIDR string and enforce the host limit
    pub fn parse_subnet(&self, target: &str) -> ScanResult<Subnet> {
        let subnet = Subnet::parse(target)?;
        self.check_size(subnet)
    }

    /// Resolve a CIDR string or an interface name to a subnet
    pub fn resolve_target(&self, target: &str) -> ScanResult<Subnet> {
        let target = target.trim();
        if target.contains('/') {
            return self.parse_subnet(target);
        }

        let networks = available_networks(&self.ignored_interface_prefixes);
        self.resolve_named(target, &networks)
    }

    /// Look an interface name up in an already-enumerated network list
    pub fn resolve_named(&self, name: &str, networks: &[NamedNetwork]) -> ScanResult<Subnet> {
        if name.is_empty() {
            return Err(ScanError::InvalidSubnet("subnet cannot be empty".to_string()));
        }

        let named = networks
            .iter()
            .find(|n| n.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ScanError::UnknownInterface(name.to_string()))?;
        self.check_size(named.subnet)
    }

    fn check_size(&self, subnet: Subnet) -> ScanResult<Subnet> {
        let hosts = subnet.host_count();
        if hosts > self.max_hosts {
            return Err(ScanError::SubnetTooLarge {
                subnet: subnet.to_string(),
                hosts,
                limit: self.max_hosts,
            });
        }
        Ok(subnet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slash_30_hosts() {
        let subnet = Subnet::parse("10.0.0.0/30").unwrap();
        let hosts: Vec<Ipv4Addr> = subnet.hosts().collect();
        assert_eq!(hosts, vec![Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2)]);
        assert_eq!(subnet.host_count(), 2);
    }

    #[test]
    fn test_slash_24_excludes_network_and_broadcast() {
        let subnet = Subnet::parse("192.168.1.0/24").unwrap();
        let hosts: Vec<Ipv4Addr> = subnet.hosts().collect();
        assert_eq!(hosts.len(), 254);
        assert_eq!(hosts[0], Ipv4Addr::new(192, 168, 1, 1));
        assert_eq!(hosts[253], Ipv4Addr::new(192, 168, 1, 254));
        assert!(!hosts.contains(&Ipv4Addr::new(192, 168, 1, 0)));
        assert!(!hosts.contains(&Ipv4Addr::new(192, 168, 1, 255)));
    }

    #[test]
    fn test_point_to_point_and_single_host_have_no_hosts() {
        for cidr in ["10.0.0.0/31", "10.0.0.5/32"] {
            let subnet = Subnet::parse(cidr).unwrap();
            assert_eq!(subnet.host_count(), 0);
            assert_eq!(subnet.hosts().count(), 0);
        }
    }

    #[test]
    fn test_host_bits_are_masked() {
        let subnet = Subnet::parse("192.168.1.77/24").unwrap();
        assert_eq!(subnet.network_address(), Ipv4Addr::new(192, 168, 1, 0));
        assert_eq!(subnet.broadcast_address(), Ipv4Addr::new(192, 168, 1, 255));
        assert_eq!(subnet.to_string(), "192.168.1.0/24");
    }

    #[test]
    fn test_slash_zero_enumeration_bounds() {
        let subnet = Subnet::parse("0.0.0.0/0").unwrap();
        assert_eq!(subnet.host_count(), u32::MAX as u64 - 1);
        let mut hosts = subnet.hosts();
        assert_eq!(hosts.next(), Some(Ipv4Addr::new(0, 0, 0, 1)));
        assert_eq!(subnet.hosts().next_back(), Some(Ipv4Addr::new(255, 255, 255, 254)));
    }

    #[test]
    fn test_malformed_input() {
        for bad in ["", "   ", "192.168.1.0", "192.168.1.0/33", "192.168.1/24x", "300.1.1.0/24", "foo/24"] {
            let err = Subnet::parse(bad).unwrap_err();
            assert!(err.is_input_error(), "{bad:?} gave {err:?}");
        }
    }

    #[test]
    fn test_ipv6_rejected() {
        let err = Subnet::parse("2001:db8::/120").unwrap_err();
        assert!(matches!(err, ScanError::UnsupportedFamily(_)));
    }

    #[test]
    fn test_parser_enforces_limit() {
        let parser = TargetParser::new(254, vec![]);
        assert!(parser.parse_subnet("192.168.1.0/24").is_ok());
        assert!(matches!(
            parser.parse_subnet("192.168.0.0/23"),
            Err(ScanError::SubnetTooLarge { hosts: 510, limit: 254, .. })
        ));
    }

    #[test]
    fn test_resolve_named_network() {
        let parser = TargetParser::default();
        let networks = vec![
            NamedNetwork {
                name: "en0".to_string(),
                subnet: Subnet::parse("192.168.1.0/24").unwrap(),
            },
            NamedNetwork {
                name: "en1".to_string(),
                subnet: Subnet::parse("10.0.0.0/30").unwrap(),
            },
        ];

        assert_eq!(
            parser.resolve_named("EN1", &networks).unwrap(),
            Subnet::parse("10.0.0.0/30").unwrap()
        );
        assert!(matches!(
            parser.resolve_named("wlan9", &networks),
            Err(ScanError::UnknownInterface(_))
        ));
    }
}
