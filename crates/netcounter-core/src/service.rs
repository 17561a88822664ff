// ── Delivery loop ──
//
// Applies inbound manager calls and availability changes to a counter,
// one at a time, on a single task.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use netcounter_api::InboundCall;

use crate::counter::Counter;

const CALL_CHANNEL_SIZE: usize = 64;

/// Single-consumer delivery loop for one [`Counter`].
///
/// Calls sent through the returned `mpsc::Sender` are applied in the
/// order they were sent. Availability changes observed on the manager are
/// queued into the same channel as [`InboundCall::AvailabilityChanged`],
/// so they take their place behind calls that arrived earlier.
pub struct CounterService {
    counter: Counter,
    calls: mpsc::Receiver<InboundCall>,
    sender: mpsc::WeakSender<InboundCall>,
    availability: watch::Receiver<bool>,
    cancel: CancellationToken,
}

impl CounterService {
    /// Build the loop and the sender the transport delivers calls into.
    pub fn new(counter: Counter, cancel: CancellationToken) -> (Self, mpsc::Sender<InboundCall>) {
        let (tx, calls) = mpsc::channel(CALL_CHANNEL_SIZE);
        let availability = counter.availability();
        let service = Self {
            counter,
            calls,
            sender: tx.downgrade(),
            availability,
            cancel,
        };
        (service, tx)
    }

    /// Spawn the loop onto the current runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run until cancelled or until every call sender is dropped.
    pub async fn run(self) {
        let Self {
            counter,
            mut calls,
            sender,
            availability,
            cancel,
        } = self;
        info!(path = %counter.path(), "counter service started");

        let forwarder = tokio::spawn(forward_availability(availability, sender, cancel.clone()));

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                call = calls.recv() => {
                    let Some(call) = call else { break };
                    counter.deliver(call);
                }
            }
        }

        forwarder.abort();
        debug!(path = %counter.path(), "counter service stopped");
    }
}

/// Queue each observed availability change behind the calls already sent.
///
/// Holds only a weak sender, so the loop still ends once the transport
/// drops its senders.
async fn forward_availability(
    mut availability: watch::Receiver<bool>,
    sender: mpsc::WeakSender<InboundCall>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            changed = availability.changed() => {
                if changed.is_err() {
                    debug!("availability source closed");
                    break;
                }
                let available = *availability.borrow_and_update();
                let Some(tx) = sender.upgrade() else { break };
                if tx.send(InboundCall::AvailabilityChanged(available)).await.is_err() {
                    break;
                }
            }
        }
    }
}
