//! Continuous rescanning by re-running an inner generator on an interval.

use super::{Emitter, Feed, RequestGenerator, RequestItem};
use crate::error::GenerateResult;
use crate::types::Range;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Re-invokes an inner generator every `interval` until cancelled.
///
/// The first pass is started synchronously so its validation error is
/// returned to the caller. A later pass that fails to start is logged and
/// skipped; the loop waits for the next interval and tries again.
#[derive(Clone)]
pub struct LiveRequestGenerator {
    inner: Arc<dyn RequestGenerator>,
    interval: Duration,
}

impl LiveRequestGenerator {
    pub fn new(inner: Arc<dyn RequestGenerator>, interval: Duration) -> Self {
        Self { inner, interval }
    }

    /// The rescan interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl RequestGenerator for LiveRequestGenerator {
    fn generate_requests(
        &self,
        cancel: &CancellationToken,
        range: &Range,
    ) -> GenerateResult<Feed<RequestItem>> {
        let first = self.inner.generate_requests(cancel, range)?;

        let (emitter, feed) = Feed::channel(cancel);
        tokio::spawn(rescan_loop(
            Arc::clone(&self.inner),
            self.interval,
            range.clone(),
            first,
            emitter,
        ));

        Ok(feed)
    }
}

async fn rescan_loop(
    inner: Arc<dyn RequestGenerator>,
    interval: Duration,
    range: Range,
    first: Feed<RequestItem>,
    emitter: Emitter<RequestItem>,
) {
    let cancel = emitter.token().clone();
    let mut pass = Some(first);
    let mut cycle: u64 = 0;

    loop {
        if let Some(mut requests) = pass.take() {
            while let Some(item) = requests.recv_or_cancel(&cancel).await {
                if !emitter.emit(item).await {
                    debug!(cycle, "live generation stopped");
                    return;
                }
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
        if emitter.is_stopped() {
            break;
        }

        cycle += 1;
        match inner.generate_requests(&cancel, &range) {
            Ok(requests) => pass = Some(requests),
            Err(e) => warn!(cycle, error = %e, "skipping rescan cycle"),
        }
    }
    debug!(cycle, "live generation stopped");
}
