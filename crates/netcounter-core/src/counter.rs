// ── Counter ──
//
// Registration lifecycle and home/roaming accounting for one usage
// counter. Inputs are owner setters and inbound manager calls; every
// change goes out as `CounterEvent`s and a fresh `CounterSnapshot`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use netcounter_api::{
    ConnectivityManager, CounterBus, CounterMap, InboundCall, ObjectPath, UsageSample,
};

use crate::bucket::UsageBucket;
use crate::config::CounterConfig;
use crate::error::CoreError;
use crate::event::CounterEvent;
use crate::stream::SnapshotStream;

// ── CounterSnapshot ──────────────────────────────────────────────

/// Point-in-time view of everything a counter tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    pub path: ObjectPath,
    /// Reporting threshold in kilobytes.
    pub accuracy: u32,
    /// Reporting period in seconds.
    pub interval: u32,
    /// Registered and active with the manager.
    pub running: bool,
    /// What the owner asked for; may differ from `running` while the
    /// manager is away.
    pub should_be_running: bool,
    /// Context of the most recent usage report.
    pub roaming: bool,
    pub home_usage: UsageBucket,
    pub roaming_usage: UsageBucket,
}

impl CounterSnapshot {
    /// The bucket selected by the current roaming state.
    pub fn current(&self) -> &UsageBucket {
        if self.roaming {
            &self.roaming_usage
        } else {
            &self.home_usage
        }
    }

    fn bucket_mut(&mut self, roaming: bool) -> &mut UsageBucket {
        if roaming {
            &mut self.roaming_usage
        } else {
            &mut self.home_usage
        }
    }
}

// ── Counter ──────────────────────────────────────────────────────

/// A usage counter registered with the connectivity manager.
///
/// Cheaply cloneable via `Arc<CounterInner>`; all clones drive the same
/// counter. Setters never fail: when the manager is unreachable the
/// request is remembered and reconciled once it comes back.
///
/// Manager calls are issued while the state lock is held, so manager
/// and bus implementations must not call back into the counter.
#[derive(Clone)]
pub struct Counter {
    inner: Arc<CounterInner>,
}

struct CounterInner {
    path: ObjectPath,
    manager: Arc<dyn ConnectivityManager>,
    bus: Arc<dyn CounterBus>,
    /// Seen-marker for availability, taken before the constructor reads
    /// availability, so a delivery loop started later misses no transition.
    availability: watch::Receiver<bool>,
    state: watch::Sender<CounterSnapshot>,
    event_tx: broadcast::Sender<Arc<CounterEvent>>,
    shut_down: AtomicBool,
}

impl Counter {
    /// Create a counter with a fresh unique identity.
    ///
    /// If the manager is already available the counter exposes itself
    /// and reconciles its run state immediately.
    pub fn new(
        config: &CounterConfig,
        manager: Arc<dyn ConnectivityManager>,
        bus: Arc<dyn CounterBus>,
    ) -> Result<Self, CoreError> {
        let path = ObjectPath::unique(&config.path_prefix)?;
        let availability = manager.availability();
        let (state, _) = watch::channel(CounterSnapshot {
            path: path.clone(),
            accuracy: config.accuracy,
            interval: config.interval,
            running: false,
            should_be_running: config.start_running,
            roaming: false,
            home_usage: UsageBucket::default(),
            roaming_usage: UsageBucket::default(),
        });
        let (event_tx, _) = broadcast::channel(config.event_capacity.max(1));

        let counter = Self {
            inner: Arc::new(CounterInner {
                path,
                manager,
                bus,
                availability,
                state,
                event_tx,
                shut_down: AtomicBool::new(false),
            }),
        };
        debug!(path = %counter.inner.path, "counter created");

        let available = *counter.inner.availability.borrow();
        if available {
            counter.on_manager_availability_changed(true);
        }
        Ok(counter)
    }

    /// Create a counter whose manager also acts as its transport.
    pub fn with_manager<M>(config: &CounterConfig, manager: Arc<M>) -> Result<Self, CoreError>
    where
        M: ConnectivityManager + CounterBus + 'static,
    {
        Self::new(config, manager.clone(), manager)
    }

    /// The counter's identity on the bus.
    pub fn path(&self) -> &ObjectPath {
        &self.inner.path
    }

    // ── Registration parameters ──────────────────────────────────

    /// Set the reporting threshold (KB) and re-register.
    ///
    /// Re-registration happens on every call, even mid-run, and leaves
    /// the accounting buckets alone.
    pub fn set_accuracy(&self, accuracy: u32) {
        self.update(|state, events| {
            state.accuracy = accuracy;
            self.re_register(state);
            events.push(CounterEvent::AccuracyChanged { value: accuracy });
        });
    }

    /// Set the reporting period (s) and re-register.
    pub fn set_interval(&self, interval: u32) {
        self.update(|state, events| {
            state.interval = interval;
            self.re_register(state);
            events.push(CounterEvent::IntervalChanged { value: interval });
        });
    }

    /// Request the counter to run or stop.
    ///
    /// With the manager available this registers (or unregisters) and
    /// emits `RunningChanged` every time, repeated requests included.
    /// Otherwise the request is only remembered.
    pub fn set_running(&self, on: bool) {
        self.update(|state, events| self.apply_running(state, events, on));
    }

    // ── Manager-driven inputs ────────────────────────────────────

    /// React to the manager appearing on or leaving the bus.
    ///
    /// On `true` the counter makes sure it is exposed at its path, then
    /// reconciles its run state with the pending request. On `false`
    /// nothing happens: `running` keeps its value until the next
    /// explicit `set_running` or the next reconciliation.
    pub fn on_manager_availability_changed(&self, available: bool) {
        if !available {
            debug!(path = %self.inner.path, "manager unavailable");
            return;
        }
        if self.is_shut_down() {
            return;
        }
        if let Err(e) = self.inner.bus.expose(&self.inner.path) {
            warn!(path = %self.inner.path, error = %e, "could not register counter on the bus");
            return;
        }
        self.update(|state, events| {
            let pending = state.should_be_running;
            self.apply_running(state, events, pending);
        });
    }

    /// Fold one single-context usage report into the accounting.
    ///
    /// `roaming` selects the bucket that is written and becomes the
    /// counter's roaming state. Zero or missing values leave their field
    /// untouched and raise no field event.
    pub fn apply_usage_report(&self, service: ObjectPath, counters: CounterMap, roaming: bool) {
        let sample = UsageSample::from_counters(&counters);
        debug!(
            %service,
            roaming,
            rx_bytes = sample.rx_bytes,
            tx_bytes = sample.tx_bytes,
            online_secs = sample.online_secs,
            "usage report"
        );

        self.update(|state, events| {
            events.push(CounterEvent::UsageChanged {
                service,
                counters,
                roaming,
            });

            if roaming != state.roaming {
                state.roaming = roaming;
                events.push(CounterEvent::RoamingChanged { roaming });
            }

            state.bucket_mut(roaming).absorb(sample);

            if sample.rx_bytes != 0 {
                events.push(CounterEvent::BytesReceivedChanged {
                    value: sample.rx_bytes,
                });
            }
            if sample.tx_bytes != 0 {
                events.push(CounterEvent::BytesTransmittedChanged {
                    value: sample.tx_bytes,
                });
            }
            if sample.online_secs != 0 {
                events.push(CounterEvent::SecondsOnlineChanged {
                    value: sample.online_secs,
                });
            }
        });
    }

    /// The manager is revoking this counter's registration.
    ///
    /// No state changes; observers get a `Released` event and decide.
    pub fn release(&self) {
        info!(path = %self.inner.path, "counter released by manager");
        self.emit(CounterEvent::Released);
    }

    /// Apply one inbound call.
    ///
    /// A `Usage` call is applied as up to two reports, home first.
    pub fn deliver(&self, call: InboundCall) {
        match call {
            InboundCall::Release => self.release(),
            InboundCall::AvailabilityChanged(available) => {
                self.on_manager_availability_changed(available);
            }
            usage @ InboundCall::Usage { .. } => {
                for report in usage.usage_reports() {
                    self.apply_usage_report(report.service, report.counters, report.roaming);
                }
            }
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Unregister from the manager (if reachable) and withdraw from the
    /// bus. Runs once; dropping the last handle does the same.
    pub fn shutdown(&self) {
        self.inner.shutdown();
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::SeqCst)
    }

    // ── Accessors (current bucket) ───────────────────────────────

    pub fn roaming(&self) -> bool {
        self.inner.state.borrow().roaming
    }

    pub fn bytes_received(&self) -> u64 {
        self.inner.state.borrow().current().bytes_in
    }

    pub fn bytes_transmitted(&self) -> u64 {
        self.inner.state.borrow().current().bytes_out
    }

    pub fn seconds_online(&self) -> u32 {
        self.inner.state.borrow().current().seconds_online
    }

    pub fn accuracy(&self) -> u32 {
        self.inner.state.borrow().accuracy
    }

    pub fn interval(&self) -> u32 {
        self.inner.state.borrow().interval
    }

    pub fn running(&self) -> bool {
        self.inner.state.borrow().running
    }

    // ── State observation ────────────────────────────────────────

    /// Copy of the full counter state.
    pub fn snapshot(&self) -> CounterSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn state(&self) -> watch::Receiver<CounterSnapshot> {
        self.inner.state.subscribe()
    }

    /// Subscribe to state changes as a [`SnapshotStream`].
    pub fn snapshots(&self) -> SnapshotStream {
        SnapshotStream::new(self.inner.state.subscribe())
    }

    /// Subscribe to the event broadcast stream.
    pub fn events(&self) -> broadcast::Receiver<Arc<CounterEvent>> {
        self.inner.event_tx.subscribe()
    }

    /// Availability receiver sharing the counter's seen-marker.
    pub(crate) fn availability(&self) -> watch::Receiver<bool> {
        self.inner.availability.clone()
    }

    // ── Internals ────────────────────────────────────────────────

    /// Mutate state under the watch lock, then broadcast the events the
    /// mutation produced, in order. Watchers wake only on a real change.
    fn update(&self, f: impl FnOnce(&mut CounterSnapshot, &mut Vec<CounterEvent>)) {
        let mut events = Vec::new();
        self.inner.state.send_if_modified(|state| {
            let before = state.clone();
            f(state, &mut events);
            *state != before
        });
        for event in events {
            self.emit(event);
        }
    }

    fn emit(&self, event: CounterEvent) {
        // No subscribers is fine.
        let _ = self.inner.event_tx.send(Arc::new(event));
    }

    fn apply_running(&self, state: &mut CounterSnapshot, events: &mut Vec<CounterEvent>, on: bool) {
        state.should_be_running = on;
        if self.is_shut_down() {
            return;
        }
        let manager = &self.inner.manager;
        if !manager.is_available() {
            debug!(path = %self.inner.path, running = on, "manager unavailable, run request deferred");
            return;
        }

        if on {
            manager.register_counter(&self.inner.path, state.accuracy, state.interval);
        } else {
            manager.unregister_counter(&self.inner.path);
        }
        state.running = on;
        events.push(CounterEvent::RunningChanged { running: on });
        info!(path = %self.inner.path, running = on, "counter running state applied");
    }

    fn re_register(&self, state: &CounterSnapshot) {
        let manager = &self.inner.manager;
        if self.is_shut_down() || !manager.is_available() {
            return;
        }
        debug!(
            path = %self.inner.path,
            accuracy = state.accuracy,
            interval = state.interval,
            "re-registering counter"
        );
        manager.unregister_counter(&self.inner.path);
        manager.register_counter(&self.inner.path, state.accuracy, state.interval);
    }
}

impl CounterInner {
    fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        if self.manager.is_available() {
            self.manager.unregister_counter(&self.path);
        }
        self.bus.withdraw(&self.path);

        let was_running = self.state.send_if_modified(|state| {
            let was_running = state.running;
            state.running = false;
            was_running
        });
        if was_running {
            let _ = self
                .event_tx
                .send(Arc::new(CounterEvent::RunningChanged { running: false }));
        }
        info!(path = %self.path, "counter shut down");
    }
}

impl Drop for CounterInner {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Counter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Counter")
            .field("path", &self.inner.path)
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

// ── Tests ────────────────────────────────────────────────────────
