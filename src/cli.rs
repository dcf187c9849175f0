//! Command-line interface definitions for trawl.
//!
//! Uses `clap` derive macros for declarative argument parsing.

use crate::config::{AppSettings, OutputFormat, Paths};
use crate::generator::{
    FileIpGenerator, FileIpPortGenerator, IpPortGenerator, LiveRequestGenerator,
    RangePortGenerator, RequestGenerator, SubnetIpGenerator,
};
use crate::output;
use crate::scanner::{run_scan, Scanner, Socks5Scanner};
use crate::types::{MacAddr, PortRange, Range};
use anyhow::Context;
use clap::Parser;
use ipnetwork::IpNetwork;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Ports probed when none are given.
const DEFAULT_PORTS: &str = "1080";

/// Find open SOCKS5 proxies across address and port ranges.
#[derive(Parser, Debug)]
#[command(name = "trawl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Find open SOCKS5 proxies", long_about = None)]
pub struct Args {
    /// Destination subnet in CIDR notation (e.g. "10.0.0.0/24")
    #[arg(short, long, value_name = "CIDR", conflicts_with = "file")]
    pub subnet: Option<String>,

    /// Ports to scan (e.g., "1080", "1080,9050", "1000-2000") [default: 1080]
    #[arg(short, long)]
    pub ports: Option<String>,

    /// Read targets from a JSON-lines file ({"ip": "...", "port": N} per line)
    ///
    /// Without --ports each record's own port is used; with --ports every
    /// record's address is combined with every listed port.
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Keep rescanning the targets until interrupted
    #[arg(long)]
    pub live: bool,

    /// Seconds between live rescans
    #[arg(long, value_name = "SECS", requires = "live")]
    pub interval: Option<u64>,

    /// Connection timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub dial_timeout: Option<u64>,

    /// Read/write timeout in milliseconds, applied per operation
    #[arg(long, value_name = "MS")]
    pub data_timeout: Option<u64>,

    /// Maximum number of concurrent scans
    #[arg(short = 'c', long)]
    pub concurrency: Option<usize>,

    /// Also report proxies that require username/password
    #[arg(long)]
    pub detect_auth: bool,

    /// Output format for results
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Source address recorded on every request
    #[arg(long, value_name = "IP")]
    pub src_ip: Option<IpAddr>,

    /// Source hardware address recorded on every request
    #[arg(long, value_name = "MAC")]
    pub src_mac: Option<MacAddr>,

    /// Path to a settings file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write the effective settings to the settings file and exit
    #[arg(long)]
    pub save_settings: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Load settings and apply command-line overrides on top.
    pub fn settings(&self) -> anyhow::Result<AppSettings> {
        let mut settings = match &self.config {
            Some(path) if self.save_settings && !path.exists() => AppSettings::default(),
            Some(path) => AppSettings::load_from(path)?,
            None => AppSettings::load()?,
        };

        if let Some(ms) = self.dial_timeout {
            settings.dial_timeout_ms = ms;
        }
        if let Some(ms) = self.data_timeout {
            settings.data_timeout_ms = ms;
        }
        if let Some(n) = self.concurrency {
            settings.concurrency = n;
        }
        if let Some(secs) = self.interval {
            settings.live_interval_secs = secs;
        }
        if let Some(format) = self.output {
            settings.output_format = format;
        }
        settings.detect_auth |= self.detect_auth;

        Ok(settings)
    }

    /// Write `settings` to the `--config` file, or the default location.
    pub fn persist(&self, settings: &AppSettings) -> anyhow::Result<PathBuf> {
        let path = match &self.config {
            Some(path) => path.clone(),
            None => Paths::resolve()?.settings_file(),
        };
        settings.save_to(&path)?;
        Ok(path)
    }

    /// Build the scan range from the target flags.
    pub fn range(&self) -> anyhow::Result<Range> {
        let mut range = Range {
            src_ip: self.src_ip,
            src_mac: self.src_mac,
            ..Range::default()
        };

        if let Some(subnet) = &self.subnet {
            let subnet: IpNetwork = subnet
                .parse()
                .with_context(|| format!("invalid subnet '{}'", subnet))?;
            range.dst_subnet = Some(subnet);
        }

        let ports = match (&self.ports, &self.file) {
            (Some(ports), _) => Some(ports.as_str()),
            (None, Some(_)) => None,
            (None, None) => Some(DEFAULT_PORTS),
        };
        if let Some(ports) = ports {
            range.ports = PortRange::parse_list(ports)?;
        }

        Ok(range)
    }

    /// Pick the request generator matching the target flags.
    pub fn generator(&self, settings: &AppSettings) -> Arc<dyn RequestGenerator> {
        let generator: Arc<dyn RequestGenerator> = match (&self.file, &self.ports) {
            (Some(path), None) => Arc::new(FileIpPortGenerator::from_path(path)),
            (Some(path), Some(_)) => Arc::new(IpPortGenerator::new(
                Arc::new(FileIpGenerator::from_path(path)),
                Arc::new(RangePortGenerator::new()),
            )),
            (None, _) => Arc::new(IpPortGenerator::new(
                Arc::new(SubnetIpGenerator::new()),
                Arc::new(RangePortGenerator::new()),
            )),
        };

        if self.live {
            Arc::new(LiveRequestGenerator::new(generator, settings.live_interval()))
        } else {
            generator
        }
    }

    /// Run the scan until the targets are exhausted or Ctrl-C is pressed.
    pub async fn execute(self) -> anyhow::Result<()> {
        let settings = self.settings()?;
        if self.save_settings {
            let path = self.persist(&settings)?;
            info!(path = %path.display(), "settings saved");
            return Ok(());
        }

        let range = self.range()?;
        let generator = self.generator(&settings);

        let cancel = CancellationToken::new();
        let interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupted, stopping");
                interrupt.cancel();
            }
        });

        let requests = generator.generate_requests(&cancel, &range)?;

        let scanner = Socks5Scanner::new()
            .with_dial_timeout(settings.dial_timeout())
            .with_data_timeout(settings.data_timeout())
            .with_auth_detection(settings.detect_auth);
        info!(
            scan = scanner.scan_type(),
            concurrency = settings.concurrency,
            live = self.live,
            "starting scan"
        );

        let format = settings.output_format;
        let stats = run_scan(&scanner, requests, &cancel, settings.concurrency, |result| {
            if let Err(e) = output::print_result(result, format) {
                warn!(error = %e, "failed to write result");
            }
        })
        .await;

        info!(
            scanned = stats.scanned,
            found = stats.found,
            record_errors = stats.record_errors,
            scan_errors = stats.scan_errors,
            "scan finished"
        );
        Ok(())
    }
}
