// ── Reactive snapshot stream ──
//
// Subscription type for consuming counter state changes.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::counter::CounterSnapshot;

/// A subscription to a counter's state.
///
/// Provides both point-in-time snapshot access and change notification
/// via [`changed()`](Self::changed) or by converting to a `Stream`.
pub struct SnapshotStream {
    current: CounterSnapshot,
    receiver: watch::Receiver<CounterSnapshot>,
}

impl SnapshotStream {
    pub(crate) fn new(receiver: watch::Receiver<CounterSnapshot>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation time or by the last `changed()`.
    pub fn current(&self) -> &CounterSnapshot {
        &self.current
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` once the counter has been dropped.
    pub async fn changed(&mut self) -> Option<CounterSnapshot> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    ///
    /// The stream yields the current snapshot first, then one item per change.
    pub fn into_stream(self) -> SnapshotWatchStream {
        SnapshotWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
pub struct SnapshotWatchStream {
    inner: WatchStream<CounterSnapshot>,
}

impl Stream for SnapshotWatchStream {
    type Item = CounterSnapshot;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
