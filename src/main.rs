use anyhow::Context;
use clap::{Arg, ArgAction, Command};
use colored::*;
use std::process;
use std::time::Duration;

use lanscan::{
    config::DiscoveryConfig,
    discovery::{DiscoveryEngine, ScanMode, ScanStatus},
    network::available_networks,
    output::{
        summary_line, OutputConfig, OutputFormat, OutputManager, SweepProgressBar,
        NO_HOSTS_MESSAGE, NO_RESPONSES_MESSAGE,
    },
    top_ports::parse_port_list,
    utils::target_parser::TargetParser,
    ScanError,
};

fn build_cli() -> Command {
    Command::new("lanscan")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Ping-sweep a LAN subnet and list IP, MAC and hostname or open ports")
        .arg(
            Arg::new("target")
                .value_name("TARGET")
                .help("Subnet in CIDR notation (e.g. 192.168.1.0/24) or an interface name (e.g. en0)")
                .index(1),
        )
        .arg(
            Arg::new("ports")
                .long("ports")
                .help("Probe common TCP ports instead of resolving hostnames")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list")
                .long("list")
                .help("List the local networks that can be scanned by name")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("TOML configuration file (default: ~/.lanscan.toml)"),
        )
        .arg(
            Arg::new("sweep-concurrency")
                .long("sweep-concurrency")
                .value_name("N")
                .help("Concurrent liveness probes")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("port-concurrency")
                .long("port-concurrency")
                .value_name("N")
                .help("Hosts port-probed at the same time")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("hostname-concurrency")
                .long("hostname-concurrency")
                .value_name("N")
                .help("Concurrent reverse lookups")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("MS")
                .help("Liveness probe timeout in milliseconds")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("port-timeout")
                .long("port-timeout")
                .value_name("MS")
                .help("Per-port connect timeout in milliseconds")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("settle-delay")
                .long("settle-delay")
                .value_name("MS")
                .help("Pause before reading the neighbor cache in milliseconds")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("port-list")
                .short('p')
                .long("port-list")
                .value_name("PORTS")
                .help("Ports to probe with --ports (e.g. 22,80,8000-8010)"),
        )
        .arg(
            Arg::new("output-format")
                .short('o')
                .long("output-format")
                .value_name("FORMAT")
                .help("Output format")
                .value_parser(["text", "json", "csv"])
                .default_value("text"),
        )
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .help("Disable coloured output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Hide the summary line and progress bar")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Verbose logging")
                .action(ArgAction::SetTrue),
        )
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn load_config(matches: &clap::ArgMatches) -> anyhow::Result<DiscoveryConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => DiscoveryConfig::from_toml_file(path)
            .with_context(|| format!("could not load configuration from {}", path))?,
        None => DiscoveryConfig::load_default_config(),
    };

    if let Some(&n) = matches.get_one::<usize>("sweep-concurrency") {
        config = config.with_sweep_concurrency(n);
    }
    if let Some(&n) = matches.get_one::<usize>("port-concurrency") {
        config = config.with_port_concurrency(n);
    }
    if let Some(&n) = matches.get_one::<usize>("hostname-concurrency") {
        config = config.with_hostname_concurrency(n);
    }
    if let Some(&ms) = matches.get_one::<u64>("timeout") {
        config = config.with_ping_timeout(ms);
    }
    if let Some(&ms) = matches.get_one::<u64>("port-timeout") {
        config = config.with_port_timeout(ms);
    }
    if let Some(&ms) = matches.get_one::<u64>("settle-delay") {
        config = config.with_settle_delay(ms);
    }
    if let Some(list) = matches.get_one::<String>("port-list") {
        config = config.with_ports(parse_port_list(list).context("invalid --port-list")?);
    }

    config.normalize_ports();
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn print_networks(config: &DiscoveryConfig) {
    let networks = available_networks(&config.ignored_interface_prefixes);
    if networks.is_empty() {
        println!("No scannable networks found.");
        return;
    }
    for network in networks {
        println!("{:<12} {}", network.name.bold(), network.subnet);
    }
}

fn exit_with_usage(message: Option<String>) -> ! {
    if let Some(message) = message {
        eprintln!("{}", message.red());
    }
    eprintln!("{}", build_cli().render_usage());
    eprintln!("  default: IP, MAC, hostname");
    eprintln!("  --ports: IP, MAC, open ports");
    process::exit(1);
}

/// How long shutdown waits for blocking resolver calls that outlived their timeout
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

fn main() -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("could not start the async runtime")?;
    let result = runtime.block_on(run());
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

async fn run() -> anyhow::Result<()> {
    let matches = build_cli().get_matches();
    init_logging(matches.get_flag("verbose"));

    let no_color = matches.get_flag("no-color");
    if no_color {
        colored::control::set_override(false);
    }

    let config = load_config(&matches)?;

    if matches.get_flag("list") {
        print_networks(&config);
        return Ok(());
    }

    let target = match matches.get_one::<String>("target") {
        Some(target) => target,
        None => exit_with_usage(None),
    };

    let subnet = match TargetParser::from_config(&config).resolve_target(target) {
        Ok(subnet) => subnet,
        Err(e @ (ScanError::InvalidSubnet(_) | ScanError::UnsupportedFamily(_))) => {
            exit_with_usage(Some(format!("Invalid CIDR: {}", e)))
        }
        Err(e) if e.is_input_error() => exit_with_usage(Some(e.to_string())),
        Err(e) => return Err(e.into()),
    };

    let format: OutputFormat = matches
        .get_one::<String>("output-format")
        .map(|f| f.parse())
        .transpose()
        .map_err(anyhow::Error::msg)?
        .unwrap_or_default();
    let mode = ScanMode::from_port_flag(matches.get_flag("ports"));
    let chatty = format == OutputFormat::Text && !matches.get_flag("quiet");
    let host_count = subnet.host_count();

    if chatty && host_count > 0 {
        println!("{}", summary_line(&subnet.to_string(), host_count, mode));
        println!();
    }

    let progress = SweepProgressBar::new(host_count, chatty && host_count > 0);
    let engine = DiscoveryEngine::with_system_platform(config).with_progress(progress.callback());
    let report = engine.scan(&subnet, mode).await;
    progress.finish();
    let report = report?;

    let output = OutputManager::new(OutputConfig {
        format,
        colored: !no_color,
    });

    if format == OutputFormat::Text {
        match report.status() {
            ScanStatus::NoHosts => println!("{}", NO_HOSTS_MESSAGE),
            ScanStatus::NoResponses => println!("{}", NO_RESPONSES_MESSAGE),
            ScanStatus::Completed => print!("{}", output.render(&report)?),
        }
    } else {
        println!("{}", output.render(&report)?);
    }

    Ok(())
}
