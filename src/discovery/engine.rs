//! Scan orchestrator: sweep, settle, neighbor read, enrichment, join

use super::pool::run_bounded;
use super::{
    hostname, liveness, neighbor, LivenessResult, NeighborTable, RowDetail, ScanMode, ScanReport,
    ScanRow, SweepProgress,
};
use crate::config::DiscoveryConfig;
use crate::network::{Platform, SystemPlatform};
use crate::scanner::{self, PortScanResult};
use crate::utils::target_parser::{Subnet, TargetParser};
use crate::{ScanError, ScanResult};
use chrono::Utc;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Called once per completed liveness probe
pub type ProgressCallback = Arc<dyn Fn(SweepProgress) + Send + Sync>;

/// Runs one scan per call; holds no state between scans
pub struct DiscoveryEngine {
    config: DiscoveryConfig,
    platform: Arc<dyn Platform>,
    progress: Option<ProgressCallback>,
}

impl DiscoveryEngine {
    pub fn new(config: DiscoveryConfig, platform: Arc<dyn Platform>) -> Self {
        Self {
            config,
            platform,
            progress: None,
        }
    }

    /// Engine backed by the system `ping`, `arp`, sockets and resolver
    pub fn with_system_platform(config: DiscoveryConfig) -> Self {
        let platform = SystemPlatform::with_lookup_limit(config.hostname_concurrency);
        Self::new(config, Arc::new(platform))
    }

    /// Report sweep progress through `callback`
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(SweepProgress) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Resolve a CIDR or interface name, then scan it
    pub async fn scan_target(&self, target: &str, mode: ScanMode) -> ScanResult<ScanReport> {
        let subnet = TargetParser::from_config(&self.config).resolve_target(target)?;
        self.scan(&subnet, mode).await
    }

    /// Scan every usable host of `subnet`.
    ///
    /// Only an oversized subnet is an error. Probe failures, an unreadable
    /// neighbor cache and empty results all produce a normal report.
    pub async fn scan(&self, subnet: &Subnet, mode: ScanMode) -> ScanResult<ScanReport> {
        let started_at = Utc::now();
        let start = Instant::now();
        let host_count = subnet.host_count();

        if host_count > self.config.max_hosts {
            return Err(ScanError::SubnetTooLarge {
                subnet: subnet.to_string(),
                hosts: host_count,
                limit: self.config.max_hosts,
            });
        }

        let mut report = ScanReport {
            subnet: subnet.to_string(),
            mode,
            host_count,
            responded: 0,
            rows: Vec::new(),
            started_at,
            duration: Duration::ZERO,
        };

        if host_count == 0 {
            log::info!("{} has no usable host addresses", subnet);
            return Ok(report);
        }

        log::info!("Sweeping {} ({} hosts, {} mode)", subnet, host_count, mode);
        let reachable = self.sweep(subnet).await;
        report.responded = reachable.len();
        log::info!("{} of {} hosts responded", reachable.len(), host_count);

        if reachable.is_empty() {
            report.duration = start.elapsed();
            return Ok(report);
        }

        let settle = self.config.settle_delay();
        if !settle.is_zero() {
            log::debug!("Waiting {:?} for the neighbor cache to settle", settle);
            tokio::time::sleep(settle).await;
        }

        let neighbors =
            neighbor::resolve_all(self.platform.as_ref(), self.config.neighbor_cache_timeout()).await;

        report.rows = match mode {
            ScanMode::Ports => {
                let mut open = self.probe_ports(&reachable).await;
                join_rows(&reachable, &neighbors, |addr| {
                    RowDetail::Ports(open.remove(&addr).unwrap_or_default())
                })
            }
            ScanMode::Hostname => {
                let mut names = self.resolve_hostnames(&reachable).await;
                join_rows(&reachable, &neighbors, |addr| {
                    RowDetail::Hostname(names.remove(&addr).flatten())
                })
            }
        };
        report.duration = start.elapsed();

        log::info!("Scan of {} finished in {:?}", subnet, report.duration);
        Ok(report)
    }

    /// Liveness phase. Returns the responding addresses, ascending.
    async fn sweep(&self, subnet: &Subnet) -> Vec<Ipv4Addr> {
        let platform = Arc::clone(&self.platform);
        let ping_timeout = self.config.ping_timeout();
        let total = subnet.host_count() as usize;
        let progress = self.progress.clone();
        let mut completed = 0;
        let mut responded = 0;

        let results = run_bounded(
            subnet.hosts(),
            self.config.sweep_concurrency,
            |addr| {
                let platform = Arc::clone(&platform);
                async move { liveness::probe(platform.as_ref(), addr, ping_timeout).await }
            },
            |result: &LivenessResult| {
                completed += 1;
                if result.reachable {
                    responded += 1;
                }
                if let Some(callback) = &progress {
                    callback(SweepProgress {
                        completed,
                        total,
                        responded,
                    });
                }
            },
        )
        .await;

        let mut reachable: Vec<Ipv4Addr> = results
            .into_iter()
            .filter(|r| r.reachable)
            .map(|r| r.address)
            .collect();
        reachable.sort_unstable();
        reachable.dedup();
        reachable
    }

    async fn probe_ports(&self, hosts: &[Ipv4Addr]) -> HashMap<Ipv4Addr, Vec<u16>> {
        let platform = Arc::clone(&self.platform);
        let ports: Arc<[u16]> = self.config.ports.clone().into();
        let port_timeout = self.config.port_timeout();

        let results = run_bounded(
            hosts.iter().copied(),
            self.config.port_concurrency,
            |addr| {
                let platform = Arc::clone(&platform);
                let ports = Arc::clone(&ports);
                async move { scanner::scan_ports(platform.as_ref(), addr, &ports, port_timeout).await }
            },
            |_: &PortScanResult| {},
        )
        .await;

        results
            .into_iter()
            .map(|r| (r.address, r.open_ports))
            .collect()
    }

    async fn resolve_hostnames(&self, hosts: &[Ipv4Addr]) -> HashMap<Ipv4Addr, Option<String>> {
        let platform = Arc::clone(&self.platform);
        let lookup_timeout = self.config.hostname_timeout();

        let results = run_bounded(
            hosts.iter().copied(),
            self.config.hostname_concurrency,
            |addr| {
                let platform = Arc::clone(&platform);
                async move { hostname::resolve(platform.as_ref(), addr, lookup_timeout).await }
            },
            |_| {},
        )
        .await;

        results
            .into_iter()
            .map(|r| (r.address, r.hostname))
            .collect()
    }
}

/// One row per reachable host, sorted by address. Hosts missing from the
/// enrichment results still get a row; `detail` supplies the empty value.
fn join_rows<F>(reachable: &[Ipv4Addr], neighbors: &NeighborTable, mut detail: F) -> Vec<ScanRow>
where
    F: FnMut(Ipv4Addr) -> RowDetail,
{
    let mut rows: Vec<ScanRow> = reachable
        .iter()
        .map(|&address| ScanRow {
            address,
            mac: neighbors.get(&address),
            detail: detail(address),
        })
        .collect();
    rows.sort_by_key(|row| row.address);
    rows
}
