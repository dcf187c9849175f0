//! Generators reading newline-delimited JSON records from a byte source.
//!
//! Each line is decoded on its own as `{"ip": "...", "port": N}`. A line
//! that fails to decode becomes an error-tagged item and the stream goes
//! on with the next line.

use super::{AddressItem, Emitter, Feed, IpGenerator, RequestGenerator, RequestItem};
use crate::error::{GenerateError, GenerateResult, RecordError};
use crate::types::{AddressValue, Range, Request};
use serde::Deserialize;
use std::io;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// A readable byte source. Dropping it closes it.
pub type Source = Box<dyn AsyncRead + Send + Unpin>;

/// Opens a fresh [`Source`] each time it is called.
pub type Opener = Arc<dyn Fn() -> io::Result<Source> + Send + Sync>;

/// One input line. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct FileRecord {
    #[serde(default)]
    ip: String,
    #[serde(default)]
    port: Option<serde_json::Number>,
}

fn parse_line(line: &[u8]) -> Result<(IpAddr, Option<serde_json::Number>), RecordError> {
    let record: FileRecord = serde_json::from_slice(line).map_err(|_| RecordError::Json)?;
    let ip = record.ip.parse().map_err(|_| RecordError::Ip)?;
    Ok((ip, record.port))
}

fn parse_address(line: &[u8]) -> AddressItem {
    parse_line(line).map(|(ip, _)| AddressValue::from(ip))
}

fn parse_request(line: &[u8]) -> RequestItem {
    let (ip, port) = parse_line(line)?;
    let port = match port {
        Some(n) => n
            .as_u64()
            .and_then(|p| u16::try_from(p).ok())
            .ok_or(RecordError::Port)?,
        None => 0,
    };
    Ok(Request::new(ip, port))
}

fn path_opener(path: impl Into<PathBuf>) -> Opener {
    let path = path.into();
    Arc::new(move || {
        let file = std::fs::File::open(&path)?;
        Ok(Box::new(tokio::fs::File::from_std(file)) as Source)
    })
}

/// Read `source` line by line, emitting `decode(line)` for each one.
///
/// Lines are handed over as raw bytes, so a line that is not valid UTF-8
/// fails to decode on its own instead of ending the stream.
async fn stream_lines<T, F>(source: Source, emitter: Emitter<T>, decode: F)
where
    T: Send + 'static,
    F: Fn(&[u8]) -> T,
{
    let cancel = emitter.token().clone();
    let mut lines = BufReader::new(source).split(b'\n');
    loop {
        let line = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            line = lines.next_segment() => line,
        };
        match line {
            Ok(Some(line)) => {
                let line = line.strip_suffix(b"\r").unwrap_or(&line);
                if !emitter.emit(decode(line)).await {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "failed to read input source");
                break;
            }
        }
    }
    debug!("file generation finished");
}

/// Reads target addresses from a JSON-lines source.
///
/// The `Range` argument is ignored; no subnet validation is done.
#[derive(Clone)]
pub struct FileIpGenerator {
    opener: Opener,
}

impl FileIpGenerator {
    pub fn new<F>(opener: F) -> Self
    where
        F: Fn() -> io::Result<Source> + Send + Sync + 'static,
    {
        Self {
            opener: Arc::new(opener),
        }
    }

    /// Read records from the file at `path`, opened on every call.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            opener: path_opener(path),
        }
    }
}

impl IpGenerator for FileIpGenerator {
    fn ips(&self, cancel: &CancellationToken, _range: &Range) -> GenerateResult<Feed<AddressItem>> {
        let source = (self.opener)().map_err(GenerateError::Open)?;
        let (emitter, feed) = Feed::channel(cancel);
        tokio::spawn(stream_lines(source, emitter, parse_address));
        Ok(feed)
    }
}

/// Reads target address/port pairs from a JSON-lines source.
///
/// A record without `port` yields port 0. The `Range` argument is ignored.
#[derive(Clone)]
pub struct FileIpPortGenerator {
    opener: Opener,
}

impl FileIpPortGenerator {
    pub fn new<F>(opener: F) -> Self
    where
        F: Fn() -> io::Result<Source> + Send + Sync + 'static,
    {
        Self {
            opener: Arc::new(opener),
        }
    }

    /// Read records from the file at `path`, opened on every call.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            opener: path_opener(path),
        }
    }
}

impl RequestGenerator for FileIpPortGenerator {
    fn generate_requests(
        &self,
        cancel: &CancellationToken,
        _range: &Range,
    ) -> GenerateResult<Feed<RequestItem>> {
        let source = (self.opener)().map_err(GenerateError::Open)?;
        let (emitter, feed) = Feed::channel(cancel);
        tokio::spawn(stream_lines(source, emitter, parse_request));
        Ok(feed)
    }
}
