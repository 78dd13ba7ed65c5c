//! Performance benchmarks for lanscan

use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lanscan::{
    config::DiscoveryConfig,
    discovery::{neighbor::parse_neighbor_output, DiscoveryEngine, ScanMode},
    Platform, ScanResult, Subnet,
};
use std::fmt::Write;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

/// Every odd host answers; nothing else is open or named
struct OddHostsUp;

#[async_trait]
impl Platform for OddHostsUp {
    async fn ping(&self, addr: Ipv4Addr, _timeout: Duration) -> bool {
        addr.octets()[3] % 2 == 1
    }

    async fn read_neighbor_cache(&self, _timeout: Duration) -> ScanResult<String> {
        Ok(arp_table(254))
    }

    async fn connect(&self, _addr: Ipv4Addr, port: u16, _timeout: Duration) -> bool {
        port == 22
    }

    async fn reverse_lookup(&self, _addr: Ipv4Addr, _timeout: Duration) -> Option<String> {
        None
    }
}

fn arp_table(entries: u32) -> String {
    let mut out = String::new();
    for i in 0..entries {
        let _ = writeln!(
            out,
            "? (10.{}.{}.{}) at {:x}:1b:2c:{:x}:4e:5f on en0 ifscope [ethernet]",
            (i >> 16) & 0xff,
            (i >> 8) & 0xff,
            i & 0xff,
            i & 0xff,
            (i >> 8) & 0xff
        );
    }
    out
}

/// Benchmark neighbor cache parsing
fn bench_neighbor_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("neighbor_parsing");

    for entries in [254u32, 4096, 65_534] {
        let output = arp_table(entries);
        group.bench_with_input(BenchmarkId::from_parameter(entries), &output, |b, output| {
            b.iter(|| black_box(parse_neighbor_output(black_box(output))))
        });
    }

    group.finish();
}

/// Benchmark subnet host enumeration
fn bench_host_enumeration(c: &mut Criterion) {
    let mut group = c.benchmark_group("host_enumeration");

    for cidr in ["192.168.1.0/24", "10.0.0.0/20", "172.16.0.0/16"] {
        let subnet = Subnet::parse(cidr).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(cidr), &subnet, |b, subnet| {
            b.iter(|| black_box(subnet.hosts().count()))
        });
    }

    group.finish();
}

/// Benchmark a full /24 scan against an instant platform
fn bench_engine_overhead(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let subnet = Subnet::parse("10.0.0.0/24").unwrap();
    let config = DiscoveryConfig::default().with_settle_delay(0);

    let mut group = c.benchmark_group("engine_overhead");
    group.sample_size(20);

    for mode in [ScanMode::Hostname, ScanMode::Ports] {
        let engine = DiscoveryEngine::new(config.clone(), Arc::new(OddHostsUp));
        group.bench_function(mode.to_string(), |b| {
            b.iter(|| rt.block_on(async { black_box(engine.scan(&subnet, mode).await.unwrap()) }))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_neighbor_parsing,
    bench_host_enumeration,
    bench_engine_overhead
);
criterion_main!(benches);
