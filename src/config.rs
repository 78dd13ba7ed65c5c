//! Configuration module for the lanscan discovery engine

use crate::top_ports::default_ports;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Interface name prefixes ignored when enumerating local networks (VPN/tunnel, bridge)
pub const DEFAULT_IGNORED_INTERFACE_PREFIXES: &[&str] = &["utun", "ppp", "ipsec", "bridge"];

/// Upper bound for every pool size setting
pub const MAX_CONCURRENCY: usize = 1024;

/// Main configuration structure for discovery operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Concurrent liveness probes during the sweep phase
    pub sweep_concurrency: usize,

    /// Concurrent hosts during port probing
    pub port_concurrency: usize,

    /// Concurrent hosts during hostname resolution
    pub hostname_concurrency: usize,

    /// Liveness probe timeout in milliseconds
    pub ping_timeout_ms: u64,

    /// Per-port connect timeout in milliseconds
    pub port_timeout_ms: u64,

    /// Reverse lookup timeout in milliseconds
    pub hostname_timeout_ms: u64,

    /// Timeout for reading the neighbor cache in milliseconds
    pub neighbor_cache_timeout_ms: u64,

    /// Pause between the sweep and the neighbor cache read in milliseconds
    pub settle_delay_ms: u64,

    /// Candidate TCP ports probed in port mode
    pub ports: Vec<u16>,

    /// Interface name prefixes skipped when listing local networks
    pub ignored_interface_prefixes: Vec<String>,

    /// Largest number of usable hosts a subnet may have
    pub max_hosts: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            sweep_concurrency: 60,
            port_concurrency: 20,
            hostname_concurrency: 30,
            ping_timeout_ms: 1000,
            port_timeout_ms: 500,
            hostname_timeout_ms: 2000,
            neighbor_cache_timeout_ms: 5000,
            settle_delay_ms: 1000,
            ports: default_ports(),
            ignored_interface_prefixes: DEFAULT_IGNORED_INTERFACE_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            max_hosts: 65_534,
        }
    }
}

impl DiscoveryConfig {
    /// Set the candidate port list
    pub fn with_ports(mut self, ports: Vec<u16>) -> Self {
        self.ports = ports;
        self
    }

    /// Set the sweep concurrency cap
    pub fn with_sweep_concurrency(mut self, workers: usize) -> Self {
        self.sweep_concurrency = workers;
        self
    }

    /// Set the port probing concurrency cap
    pub fn with_port_concurrency(mut self, workers: usize) -> Self {
        self.port_concurrency = workers;
        self
    }

    /// Set the hostname resolution concurrency cap
    pub fn with_hostname_concurrency(mut self, workers: usize) -> Self {
        self.hostname_concurrency = workers;
        self
    }

    /// Set the liveness probe timeout
    pub fn with_ping_timeout(mut self, timeout_ms: u64) -> Self {
        self.ping_timeout_ms = timeout_ms;
        self
    }

    /// Set the per-port connect timeout
    pub fn with_port_timeout(mut self, timeout_ms: u64) -> Self {
        self.port_timeout_ms = timeout_ms;
        self
    }

    /// Set the reverse lookup timeout
    pub fn with_hostname_timeout(mut self, timeout_ms: u64) -> Self {
        self.hostname_timeout_ms = timeout_ms;
        self
    }

    /// Set the settle delay
    pub fn with_settle_delay(mut self, delay_ms: u64) -> Self {
        self.settle_delay_ms = delay_ms;
        self
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout_ms)
    }

    pub fn port_timeout(&self) -> Duration {
        Duration::from_millis(self.port_timeout_ms)
    }

    pub fn hostname_timeout(&self) -> Duration {
        Duration::from_millis(self.hostname_timeout_ms)
    }

    pub fn neighbor_cache_timeout(&self) -> Duration {
        Duration::from_millis(self.neighbor_cache_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Load configuration from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            crate::ScanError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML document; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let mut config: DiscoveryConfig = toml::from_str(content)
            .map_err(|e| crate::ScanError::ConfigError(format!("Failed to parse TOML: {}", e)))?;
        config.normalize_ports();
        Ok(config)
    }

    /// Load configuration from `~/.lanscan.toml`, falling back to defaults
    pub fn load_default_config() -> Self {
        let home_dir = dirs::home_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
        let config_path = home_dir.join(".lanscan.toml");

        if config_path.exists() {
            match Self::from_toml_file(&config_path) {
                Ok(config) => {
                    log::info!("Loaded config from {}", config_path.display());
                    return config;
                }
                Err(e) => log::warn!("Ignoring {}: {}", config_path.display(), e),
            }
        }

        Self::default()
    }

    /// Sort and deduplicate the candidate port list
    pub fn normalize_ports(&mut self) {
        self.ports.sort_unstable();
        self.ports.dedup();
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        let invalid = |msg: &str| Err(crate::ScanError::ConfigError(msg.to_string()));

        if self.sweep_concurrency == 0 {
            return invalid("sweep_concurrency must be greater than 0");
        }
        if self.port_concurrency == 0 || self.hostname_concurrency == 0 {
            return invalid("enrichment concurrency must be greater than 0");
        }
        let largest = self
            .sweep_concurrency
            .max(self.port_concurrency)
            .max(self.hostname_concurrency);
        if largest > MAX_CONCURRENCY {
            return Err(crate::ScanError::ConfigError(format!(
                "concurrency {} exceeds the limit of {}",
                largest, MAX_CONCURRENCY
            )));
        }
        if self.ping_timeout_ms == 0 || self.port_timeout_ms == 0 || self.hostname_timeout_ms == 0 {
            return invalid("probe timeouts must be greater than 0");
        }
        if self.ports.is_empty() {
            return invalid("No ports specified");
        }
        if self.ports.contains(&0) {
            return invalid("Port 0 cannot be probed");
        }
        if self.ports.windows(2).any(|w| w[0] >= w[1]) {
            return invalid("Port list must be ascending without duplicates");
        }
        if self.max_hosts == 0 {
            return invalid("max_hosts must be greater than 0");
        }

        Ok(())
    }
}
