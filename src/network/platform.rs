//! Platform capabilities the discovery engine depends on
//!
//! Everything that touches the operating system (spawning `ping`, reading the
//! neighbor cache, opening TCP connections, reverse DNS) goes through the
//! [`Platform`] trait so the orchestrator can be exercised against a fake.
//!
//! Resources opened here are scoped to a single call: helper processes are
//! spawned with `kill_on_drop` and wrapped in a timeout, sockets are dropped
//! before the call returns.

use crate::{ScanError, ScanResult};
use async_trait::async_trait;
use dns_lookup::lookup_addr;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio::time::timeout;

/// Grace period on top of the probe timeout before a `ping` child is killed
const PING_GRACE: Duration = Duration::from_secs(1);

/// Linux kernel ARP table
const PROC_NET_ARP: &str = "/proc/net/arp";

/// Blocking resolver threads allowed at once when no limit is given
const DEFAULT_LOOKUP_LIMIT: usize = 30;

/// OS capabilities used by the probers
#[async_trait]
pub trait Platform: Send + Sync {
    /// Send one liveness probe; `true` if the host answered within `timeout`
    async fn ping(&self, addr: Ipv4Addr, timeout: Duration) -> bool;

    /// Raw text of the neighbor (ARP) cache
    async fn read_neighbor_cache(&self, timeout: Duration) -> ScanResult<String>;

    /// Attempt a TCP handshake; `true` if it completed within `timeout`
    async fn connect(&self, addr: Ipv4Addr, port: u16, timeout: Duration) -> bool;

    /// Reverse lookup of `addr`, bounded by `timeout`
    async fn reverse_lookup(&self, addr: Ipv4Addr, timeout: Duration) -> Option<String>;
}

/// Real implementation backed by system utilities and sockets
#[derive(Debug, Clone)]
pub struct SystemPlatform {
    /// Held by each resolver thread until `lookup_addr` returns, even after
    /// the caller has timed out
    lookup_slots: Arc<Semaphore>,
}

impl SystemPlatform {
    pub fn new() -> Self {
        Self::with_lookup_limit(DEFAULT_LOOKUP_LIMIT)
    }

    /// At most `limit` blocking reverse lookups run at a time
    pub fn with_lookup_limit(limit: usize) -> Self {
        Self {
            lookup_slots: Arc::new(Semaphore::new(limit.clamp(1, Semaphore::MAX_PERMITS))),
        }
    }
}

impl Default for SystemPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Platform for SystemPlatform {
    async fn ping(&self, addr: Ipv4Addr, probe_timeout: Duration) -> bool {
        let mut cmd = ping_command(addr, probe_timeout);

        match timeout(probe_timeout + PING_GRACE, cmd.status()).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(e)) => {
                log::debug!("Failed to spawn ping for {}: {}", addr, e);
                false
            }
            Err(_) => {
                log::trace!("ping {} did not exit in time", addr);
                false
            }
        }
    }

    async fn read_neighbor_cache(&self, read_timeout: Duration) -> ScanResult<String> {
        // -n skips DNS and gives the most consistent output
        let numeric = run_command("arp", &["-an"], read_timeout).await;
        let err = match numeric {
            Ok(out) => return Ok(out),
            Err(e) => e,
        };
        log::debug!("arp -an failed ({}), retrying with arp -a", err);

        let err = match run_command("arp", &["-a"], read_timeout).await {
            Ok(out) => return Ok(out),
            Err(e) => e,
        };

        if cfg!(target_os = "linux") {
            log::debug!("arp -a failed ({}), reading {}", err, PROC_NET_ARP);
            return Ok(tokio::fs::read_to_string(PROC_NET_ARP).await?);
        }

        Err(err)
    }

    async fn connect(&self, addr: Ipv4Addr, port: u16, connect_timeout: Duration) -> bool {
        let socket_addr = SocketAddr::new(IpAddr::V4(addr), port);
        match timeout(connect_timeout, TcpStream::connect(socket_addr)).await {
            Ok(Ok(stream)) => {
                drop(stream);
                true
            }
            Ok(Err(_)) | Err(_) => false,
        }
    }

    async fn reverse_lookup(&self, addr: Ipv4Addr, lookup_timeout: Duration) -> Option<String> {
        // getnameinfo cannot be cancelled; on timeout the blocking thread is
        // left to finish and its answer is discarded. The thread keeps its
        // slot until then, so abandoned lookups cannot pile up.
        let ip = IpAddr::V4(addr);
        let slots = Arc::clone(&self.lookup_slots);
        let lookup = async move {
            let slot = slots.acquire_owned().await.ok()?;
            let joined = tokio::task::spawn_blocking(move || {
                let _slot = slot;
                lookup_addr(&ip)
            })
            .await;
            Some(joined)
        };

        match timeout(lookup_timeout, lookup).await {
            Ok(Some(Ok(Ok(name)))) => Some(name),
            Ok(Some(Ok(Err(e)))) => {
                log::trace!("No PTR record for {}: {}", addr, e);
                None
            }
            Ok(Some(Err(e))) => {
                log::debug!("Reverse lookup task for {} failed: {}", addr, e);
                None
            }
            Ok(None) | Err(_) => None,
        }
    }
}

/// Build a single-echo `ping` invocation with the platform's wait flag
fn ping_command(addr: Ipv4Addr, probe_timeout: Duration) -> Command {
    let mut cmd = Command::new("ping");

    if cfg!(windows) {
        cmd.arg("-n")
            .arg("1")
            .arg("-w")
            .arg(probe_timeout.as_millis().max(1).to_string());
    } else {
        // BSD ping takes the overall deadline with -t, Linux ping the reply wait with -W
        let wait_flag = if cfg!(any(
            target_os = "macos",
            target_os = "ios",
            target_os = "freebsd",
            target_os = "openbsd",
            target_os = "netbsd",
            target_os = "dragonfly"
        )) {
            "-t"
        } else {
            "-W"
        };
        // Whole seconds only; round up so the wait is never shorter than asked
        let secs = probe_timeout.as_millis().div_ceil(1000).max(1);
        cmd.arg("-c").arg("1").arg(wait_flag).arg(secs.to_string());
    }

    cmd.arg(addr.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);
    cmd
}

/// Run a utility and capture its stdout; non-zero exit is an error
async fn run_command(program: &str, args: &[&str], run_timeout: Duration) -> ScanResult<String> {
    let mut cmd = Command::new(program);
    cmd.args(args).stdin(Stdio::null()).kill_on_drop(true);

    let output = timeout(run_timeout, cmd.output()).await??;
    if !output.status.success() {
        return Err(ScanError::CommandFailed(format!(
            "{} {} exited with {}",
            program,
            args.join(" "),
            output.status
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
