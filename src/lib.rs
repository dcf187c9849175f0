//! # Trawl - An Open SOCKS5 Proxy Finder
//!
//! Trawl walks address and port ranges, attempts a SOCKS5 greeting against
//! each endpoint, and reports the ones that accept clients without
//! authentication.
//!
//! ## Features
//!
//! - **Streaming Generators**: Requests are produced lazily over bounded channels
//! - **Flexible Targeting**: CIDR subnets, port lists and JSON-lines target files
//! - **Live Mode**: Periodic rescans of the same targets
//! - **Cancellation**: Every stage stops promptly on a shared token
//! - **Multiple Output Formats**: Plain text and JSON
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use trawl::generator::{IpPortGenerator, RangePortGenerator, RequestGenerator, SubnetIpGenerator};
//! use trawl::scanner::{run_scan, Socks5Scanner};
//! use trawl::types::{PortRange, Range};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cancel = CancellationToken::new();
//!     let range = Range::default()
//!         .with_subnet("192.168.1.0/24".parse()?)
//!         .with_ports(vec![PortRange::single(1080)]);
//!
//!     let generator = IpPortGenerator::new(
//!         Arc::new(SubnetIpGenerator::new()),
//!         Arc::new(RangePortGenerator::new()),
//!     );
//!     let requests = generator.generate_requests(&cancel, &range)?;
//!
//!     let scanner = Socks5Scanner::new();
//!     run_scan(&scanner, requests, &cancel, 100, |result| println!("{}", result)).await;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Ranges, requests and address value types
//! - [`generator`] - Port, address and request generators
//! - [`scanner`] - The `Scanner` trait, the SOCKS5 scanner and the scan driver
//! - [`config`] - Settings storage
//! - [`error`] - Error types
//! - [`output`] - Result formatting
//! - [`logging`] - Diagnostic logging setup

pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod logging;
pub mod output;
pub mod scanner;
pub mod types;

// Re-export commonly used types
pub use error::{GenerateError, RecordError, ScanError};
pub use generator::{Feed, IpGenerator, PortGenerator, RequestGenerator};
pub use scanner::{ScanResult, Scanner, Socks5Result, Socks5Scanner};
pub use types::{AddressValue, PortRange, Range, Request};
