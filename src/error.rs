//! Error types for trawl.
//!
//! Uses `thiserror` for ergonomic error definitions.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors returned synchronously by a generator call.
///
/// No feed is produced when one of these is returned.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("no ports to scan")]
    NoPorts,

    #[error("invalid port range: start ({start}) > end ({end})")]
    InvalidPortRange { start: u16, end: u16 },

    #[error("no destination subnet")]
    NoSubnet,

    #[error("invalid port specification: {0}")]
    InvalidPortSpec(String),

    #[error("failed to open source: {0}")]
    Open(#[source] io::Error),
}

/// Recoverable per-record errors carried inside a feed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordError {
    #[error("invalid json")]
    Json,

    #[error("invalid ip")]
    Ip,

    #[error("invalid port")]
    Port,
}

/// Errors surfaced by a protocol scanner for a single target.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("{0} timed out")]
    Timeout(&'static str),

    #[error("scan cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to encode request: {0}")]
    Encode(String),
}

/// Errors loading or saving settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("failed to write {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    #[error("invalid settings format: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias for generator calls.
pub type GenerateResult<T> = Result<T, GenerateError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
