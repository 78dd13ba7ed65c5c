//! Output formatting for scan reports

use crate::discovery::{RowDetail, ScanMode, ScanReport, ScanRow, SweepProgress};
use crate::{ScanError, ScanResult};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shown for an absent MAC, hostname or empty port list
pub const PLACEHOLDER: &str = "—";

const IP_WIDTH: usize = 16;
const MAC_WIDTH: usize = 18;
const SEPARATOR_WIDTH: usize = 60;

/// Output format options
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub colored: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            colored: true,
        }
    }
}

/// Renders reports in the configured format
pub struct OutputManager {
    config: OutputConfig,
}

impl OutputManager {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Render the whole report. For text this is the table plus the
    /// completion line; the summary line is printed before the scan starts.
    pub fn render(&self, report: &ScanReport) -> ScanResult<String> {
        match self.config.format {
            OutputFormat::Text => Ok(self.format_text(report)),
            OutputFormat::Json => format_json(report),
            OutputFormat::Csv => format_csv(report),
        }
    }

    fn format_text(&self, report: &ScanReport) -> String {
        let mut out = String::new();

        let header = format!(
            "{:<ip$} {:<mac$} {}",
            "IP",
            "MAC",
            detail_header(report.mode),
            ip = IP_WIDTH,
            mac = MAC_WIDTH
        );
        out.push_str(&self.paint(&header, |s| s.bold().to_string()));
        out.push('\n');
        out.push_str(&"-".repeat(SEPARATOR_WIDTH));
        out.push('\n');

        for row in &report.rows {
            out.push_str(&self.format_row(row));
            out.push('\n');
        }

        out.push('\n');
        out.push_str(&completion_line(report.responded));
        out.push('\n');
        out
    }

    fn format_row(&self, row: &ScanRow) -> String {
        // Pad before colouring so escape codes do not skew the columns
        let ip = format!("{:<width$}", row.address.to_string(), width = IP_WIDTH);
        let mac_text = row
            .mac
            .map(|mac| mac.to_string())
            .unwrap_or_else(|| PLACEHOLDER.to_string());
        let mac = format!("{:<width$}", mac_text, width = MAC_WIDTH);
        let detail = detail_text(&row.detail);

        let ip = self.paint(&ip, |s| s.green().to_string());
        let mac = match row.mac {
            Some(_) => mac,
            None => self.paint(&mac, |s| s.dimmed().to_string()),
        };
        let detail = if detail == PLACEHOLDER {
            self.paint(&detail, |s| s.dimmed().to_string())
        } else {
            self.paint(&detail, |s| s.cyan().to_string())
        };

        format!("{} {} {}", ip, mac, detail)
    }

    fn paint<F: Fn(&str) -> String>(&self, text: &str, style: F) -> String {
        if self.config.colored {
            style(text)
        } else {
            text.to_string()
        }
    }
}

fn detail_header(mode: ScanMode) -> &'static str {
    match mode {
        ScanMode::Ports => "Open ports",
        ScanMode::Hostname => "Hostname",
    }
}

fn detail_text(detail: &RowDetail) -> String {
    match detail {
        RowDetail::Ports(ports) if ports.is_empty() => PLACEHOLDER.to_string(),
        RowDetail::Ports(ports) => ports
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", "),
        RowDetail::Hostname(name) => name.as_deref().unwrap_or(PLACEHOLDER).to_string(),
    }
}

/// `Scanning 192.168.1.0/24 (254 hosts) — port scan...`
pub fn summary_line(subnet: &str, host_count: u64, mode: ScanMode) -> String {
    let suffix = match mode {
        ScanMode::Ports => " — port scan",
        ScanMode::Hostname => "",
    };
    format!("Scanning {} ({} hosts){}...", subnet, host_count, suffix)
}

pub fn completion_line(responded: usize) -> String {
    format!("Done. {} host(s) responded.", responded)
}

pub const NO_HOSTS_MESSAGE: &str = "No hosts in subnet";
pub const NO_RESPONSES_MESSAGE: &str = "No hosts responded.";

fn format_json(report: &ScanReport) -> ScanResult<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

fn format_csv(report: &ScanReport) -> ScanResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let detail_column = match report.mode {
        ScanMode::Ports => "open_ports",
        ScanMode::Hostname => "hostname",
    };
    writer.write_record(["ip", "mac", detail_column])?;

    for row in &report.rows {
        let detail = match &row.detail {
            RowDetail::Ports(ports) => ports
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(" "),
            RowDetail::Hostname(name) => name.clone().unwrap_or_default(),
        };
        writer.write_record([
            row.address.to_string(),
            row.mac.map(|mac| mac.to_string()).unwrap_or_default(),
            detail,
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ScanError::OutputError(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ScanError::OutputError(e.to_string()))
}

/// Terminal progress bar for the sweep phase
pub struct SweepProgressBar {
    bar: ProgressBar,
}

impl SweepProgressBar {
    pub fn new(total: u64, visible: bool) -> Self {
        if !visible {
            return Self {
                bar: ProgressBar::hidden(),
            };
        }

        let bar = ProgressBar::new(total);
        let style = ProgressStyle::with_template(
            "{spinner:.green} Sweeping [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
        bar.set_style(style);
        Self { bar }
    }

    /// Callback for `DiscoveryEngine::with_progress`
    pub fn callback(&self) -> impl Fn(SweepProgress) + Send + Sync + 'static {
        let bar = self.bar.clone();
        move |progress: SweepProgress| {
            bar.set_position(progress.completed as u64);
            bar.set_message(format!("({} up)", progress.responded));
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pnet::util::MacAddr;
    use std::net::Ipv4Addr;
    use std::time::Duration;

    fn port_report() -> ScanReport {
        ScanReport {
            subnet: "192.168.1.0/24".to_string(),
            mode: ScanMode::Ports,
            host_count: 254,
            responded: 2,
            rows: vec![
                ScanRow {
                    address: Ipv4Addr::new(192, 168, 1, 1),
                    mac: Some(MacAddr(0xa0, 0xb1, 0xc2, 0xd3, 0xe4, 0xf5)),
                    detail: RowDetail::Ports(vec![22, 443]),
                },
                ScanRow {
                    address: Ipv4Addr::new(192, 168, 1, 20),
                    mac: None,
                    detail: RowDetail::Ports(vec![]),
                },
            ],
            started_at: Utc::now(),
            duration: Duration::from_millis(1500),
        }
    }

    fn plain() -> OutputManager {
        OutputManager::new(OutputConfig {
            format: OutputFormat::Text,
            colored: false,
        })
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("TXT".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert_eq!("csv".parse::<OutputFormat>(), Ok(OutputFormat::Csv));
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_summary_line() {
        assert_eq!(
            summary_line("10.0.0.0/30", 2, ScanMode::Hostname),
            "Scanning 10.0.0.0/30 (2 hosts)..."
        );
        assert_eq!(
            summary_line("192.168.1.0/24", 254, ScanMode::Ports),
            "Scanning 192.168.1.0/24 (254 hosts) — port scan..."
        );
    }

    #[test]
    fn test_text_table_layout() {
        let text = plain().render(&port_report()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], format!("{:<16} {:<18} {}", "IP", "MAC", "Open ports"));
        assert_eq!(lines[1], "-".repeat(60));
        assert_eq!(lines[2], format!("{:<16} {:<18} {}", "192.168.1.1", "a0:b1:c2:d3:e4:f5", "22, 443"));
        assert_eq!(lines[3], format!("{:<16} {:<18} {}", "192.168.1.20", "—", "—"));
        assert_eq!(lines.last().copied(), Some("Done. 2 host(s) responded."));
    }

    #[test]
    fn test_hostname_placeholder() {
        let mut report = port_report();
        report.mode = ScanMode::Hostname;
        report.rows = vec![ScanRow {
            address: Ipv4Addr::new(192, 168, 1, 5),
            mac: None,
            detail: RowDetail::Hostname(None),
        }];
        let text = plain().render(&report).unwrap();
        assert!(text.lines().next().unwrap().ends_with("Hostname"));
        assert!(text.contains(&format!("{:<16} {:<18} {}", "192.168.1.5", "—", "—")));
    }

    #[test]
    fn test_csv_output() {
        let manager = OutputManager::new(OutputConfig {
            format: OutputFormat::Csv,
            colored: false,
        });
        let csv = manager.render(&port_report()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "ip,mac,open_ports");
        assert_eq!(lines[1], "192.168.1.1,a0:b1:c2:d3:e4:f5,22 443");
        assert_eq!(lines[2], "192.168.1.20,,");
    }

    #[test]
    fn test_json_output() {
        let manager = OutputManager::new(OutputConfig {
            format: OutputFormat::Json,
            colored: false,
        });
        let json = manager.render(&port_report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["subnet"], "192.168.1.0/24");
        assert_eq!(value["mode"], "ports");
        assert_eq!(value["responded"], 2);
        assert_eq!(value["rows"][0]["address"], "192.168.1.1");
        assert_eq!(value["rows"][0]["detail"]["ports"][1], 443);
        assert_eq!(value["rows"][0]["mac"], "a0:b1:c2:d3:e4:f5");
        assert!(value["rows"][1]["mac"].is_null());
    }
}
