//! Port enumeration over a list of port ranges.

use super::{Feed, PortGenerator};
use crate::error::{GenerateError, GenerateResult};
use crate::types::Range;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Expands `Range::ports` into an ordered stream of ports.
///
/// Ranges are concatenated in declaration order without merging, sorting
/// or deduplication. Every range is validated before anything is produced.
#[derive(Debug, Clone, Copy, Default)]
pub struct RangePortGenerator;

impl RangePortGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl PortGenerator for RangePortGenerator {
    fn ports(&self, cancel: &CancellationToken, range: &Range) -> GenerateResult<Feed<u16>> {
        if range.ports.is_empty() {
            return Err(GenerateError::NoPorts);
        }
        for port_range in &range.ports {
            port_range.validate()?;
        }

        let ranges = range.ports.clone();
        let (emitter, feed) = Feed::channel(cancel);
        tokio::spawn(async move {
            for port in ranges.iter().flat_map(|r| r.iter()) {
                if !emitter.emit(port).await {
                    debug!("port generation stopped early");
                    return;
                }
            }
        });

        Ok(feed)
    }
}
