//! Scanner module - protocol probes run against generated requests.
//!
//! A [`Scanner`] owns the network I/O for one target per call and keeps no
//! per-call state, so a single instance can be shared across concurrent
//! tasks. [`run_scan`] drives a scanner over a request feed with bounded
//! concurrency.

pub mod socks5;

use crate::error::ScanError;
use crate::generator::{Feed, RequestItem};
use crate::types::Request;
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub use socks5::{Socks5Result, Socks5Scanner};

/// A finding produced by a scanner.
///
/// Serializes as the variant's own record, e.g.
/// `{"scan":"socks","version":5,"ip":"10.0.0.1","port":1080}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScanResult {
    Socks5(Socks5Result),
}

impl ScanResult {
    /// Stable identity of the target, used to deduplicate across rescans.
    pub fn id(&self) -> String {
        match self {
            Self::Socks5(r) => r.id(),
        }
    }

    /// Scan type tag of the producing scanner.
    pub fn scan_type(&self) -> &str {
        match self {
            Self::Socks5(r) => &r.scan_type,
        }
    }
}

impl fmt::Display for ScanResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Socks5(r) => write!(f, "{}", r),
        }
    }
}

/// Trait for protocol scanner implementations.
///
/// `Ok(None)` means the target was probed and nothing was found; errors are
/// reserved for failures to probe it at all.
///
/// # Example
///
/// ```ignore
/// use trawl::scanner::{Scanner, Socks5Scanner};
///
/// let scanner = Socks5Scanner::new();
/// if let Some(found) = scanner.scan(&cancel, &request).await? {
///     println!("{found}");
/// }
/// ```
#[async_trait]
pub trait Scanner: Send + Sync {
    /// Scan type tag, e.g. `"socks"`.
    fn scan_type(&self) -> &'static str;

    /// Probe a single target.
    async fn scan(
        &self,
        cancel: &CancellationToken,
        request: &Request,
    ) -> Result<Option<ScanResult>, ScanError>;
}

/// Counters for a finished [`run_scan`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Requests handed to the scanner.
    pub scanned: u64,
    /// Findings reported.
    pub found: u64,
    /// Feed items that carried a per-record error.
    pub record_errors: u64,
    /// Scans that ended with an error.
    pub scan_errors: u64,
}

#[derive(Default)]
struct Counters {
    scanned: AtomicU64,
    found: AtomicU64,
    record_errors: AtomicU64,
    scan_errors: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> ScanStats {
        ScanStats {
            scanned: self.scanned.load(Ordering::Relaxed),
            found: self.found.load(Ordering::Relaxed),
            record_errors: self.record_errors.load(Ordering::Relaxed),
            scan_errors: self.scan_errors.load(Ordering::Relaxed),
        }
    }
}

/// Run `scanner` over every request in `requests`, at most `concurrency`
/// at a time, passing each finding to `on_result`.
///
/// Per-record and per-target errors are logged and counted; they never
/// stop the run. The run ends when the feed ends or `cancel` fires.
pub async fn run_scan<S, F>(
    scanner: &S,
    requests: Feed<RequestItem>,
    cancel: &CancellationToken,
    concurrency: usize,
    on_result: F,
) -> ScanStats
where
    S: Scanner + ?Sized,
    F: Fn(&ScanResult) + Sync,
{
    let counters = Counters::default();

    requests
        .take_until(cancel.cancelled())
        .for_each_concurrent(concurrency.max(1), |item| {
            let counters = &counters;
            let on_result = &on_result;
            async move {
                let request = match item {
                    Ok(request) => request,
                    Err(e) => {
                        warn!(error = %e, "skipping invalid record");
                        counters.record_errors.fetch_add(1, Ordering::Relaxed);
                        return;
                    }
                };

                counters.scanned.fetch_add(1, Ordering::Relaxed);
                match scanner.scan(cancel, &request).await {
                    Ok(Some(result)) => {
                        counters.found.fetch_add(1, Ordering::Relaxed);
                        on_result(&result);
                    }
                    Ok(None) => {}
                    Err(ScanError::Cancelled) => {}
                    Err(e) => {
                        debug!(dst = %request, error = %e, "scan failed");
                        counters.scan_errors.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
        })
        .await;

    counters.snapshot()
}
