//! Request generation pipeline.
//!
//! Every generator call validates its input synchronously, then spawns one
//! producer task on the ambient tokio runtime and returns a [`Feed`] the
//! caller consumes until it ends. Producers race every hand-off against the
//! caller's [`CancellationToken`], so a cancelled or abandoned feed never
//! leaves a task blocked.
//!
//! Generator calls must be made from within a tokio runtime.

mod file;
mod ip;
mod live;
mod port;
mod request;

pub use file::{FileIpGenerator, FileIpPortGenerator, Opener, Source};
pub use ip::SubnetIpGenerator;
pub use live::LiveRequestGenerator;
pub use port::RangePortGenerator;
pub use request::{IpPortGenerator, IpRequestGenerator};

use crate::error::{GenerateResult, RecordError};
use crate::types::{AddressValue, Range, Request};
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// An address, or the per-record error that replaced it.
pub type AddressItem = Result<AddressValue, RecordError>;

/// A request, or the per-record error that replaced it.
pub type RequestItem = Result<Request, RecordError>;

/// Produces the ports described by a [`Range`].
pub trait PortGenerator: Send + Sync {
    fn ports(&self, cancel: &CancellationToken, range: &Range) -> GenerateResult<Feed<u16>>;
}

/// Produces the addresses described by a [`Range`].
pub trait IpGenerator: Send + Sync {
    fn ips(&self, cancel: &CancellationToken, range: &Range) -> GenerateResult<Feed<AddressItem>>;
}

/// Produces scan requests.
pub trait RequestGenerator: Send + Sync {
    fn generate_requests(
        &self,
        cancel: &CancellationToken,
        range: &Range,
    ) -> GenerateResult<Feed<RequestItem>>;
}

/// A single-pass stream of generated values.
///
/// The feed ends once its producer finishes, fails, or observes
/// cancellation. Dropping the feed stops the producer at its next send.
#[derive(Debug)]
pub struct Feed<T> {
    rx: mpsc::Receiver<T>,
}

impl<T: Send + 'static> Feed<T> {
    /// Create a connected emitter/feed pair.
    ///
    /// Capacity is one: the producer runs at most one value ahead.
    pub(crate) fn channel(cancel: &CancellationToken) -> (Emitter<T>, Self) {
        let (tx, rx) = mpsc::channel(1);
        (
            Emitter {
                tx,
                cancel: cancel.clone(),
            },
            Self { rx },
        )
    }

    /// Receive the next value, or `None` once the feed has ended.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Receive the next value unless `cancel` fires first.
    pub async fn recv_or_cancel(&mut self, cancel: &CancellationToken) -> Option<T> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            value = self.rx.recv() => value,
        }
    }

    /// Drain the feed into a vector.
    pub async fn collect_all(mut self) -> Vec<T> {
        let mut values = Vec::new();
        while let Some(value) = self.rx.recv().await {
            values.push(value);
        }
        values
    }
}

impl<T> Stream for Feed<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.rx.poll_recv(cx)
    }
}

/// Producer half of a [`Feed`].
#[derive(Debug)]
pub(crate) struct Emitter<T> {
    tx: mpsc::Sender<T>,
    cancel: CancellationToken,
}

impl<T> Emitter<T> {
    /// Hand a value to the consumer.
    ///
    /// Returns `false` when the producer must stop: the token was cancelled
    /// or the feed was dropped. Cancellation wins if both are ready.
    pub(crate) async fn emit(&self, value: T) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = self.tx.send(value) => sent.is_ok(),
        }
    }

    /// The token this emitter observes.
    pub(crate) fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled() || self.tx.is_closed()
    }
}
