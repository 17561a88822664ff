//! Recorded manager sessions.
//!
//! A session is a JSON-lines script of what happened on the manager side
//! (availability flips, `Usage` and `Release` calls) interleaved with
//! owner-side setter calls. [`ReplayManager`] stands in for the real
//! manager and transport while a session is replayed: it tracks
//! availability, records every outbound call and keeps the set of
//! exposed counter paths.
//!
//! # Example
//!
//! ```text
//! # comments and blank lines are skipped
//! {"type":"set_running","value":true}
//! {"type":"availability","available":true}
//! {"type":"usage","service":"/net/connman/service/wifi_1","home":{"RX.Bytes":100,"Time":30}}
//! {"type":"set_accuracy","value":2048}
//! {"type":"release"}
//! ```

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::bus::CounterBus;
use crate::call::InboundCall;
use crate::error::Error;
use crate::manager::{ConnectivityManager, ManagerCall};
use crate::path::ObjectPath;
use crate::usage::CounterMap;

// ── SessionStep ──────────────────────────────────────────────────────

/// One line of a recorded session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionStep {
    /// The manager appeared on (`true`) or left (`false`) the bus.
    Availability { available: bool },
    /// A `Usage` call from the manager.
    Usage {
        service: ObjectPath,
        #[serde(default)]
        home: CounterMap,
        #[serde(default)]
        roaming: CounterMap,
    },
    /// A `Release` call from the manager.
    Release,
    /// Owner sets the reporting threshold (KB).
    SetAccuracy { value: u32 },
    /// Owner sets the reporting period (s).
    SetInterval { value: u32 },
    /// Owner requests the counter to run or stop.
    SetRunning { value: bool },
    /// Make the transport refuse (or accept again) object exposure.
    RefuseExposure { refuse: bool },
}

impl SessionStep {
    /// The inbound call this step delivers, if it comes from the manager side.
    pub fn inbound(&self) -> Option<InboundCall> {
        match self {
            Self::Availability { available } => Some(InboundCall::AvailabilityChanged(*available)),
            Self::Usage {
                service,
                home,
                roaming,
            } => Some(InboundCall::Usage {
                service: service.clone(),
                home: home.clone(),
                roaming: roaming.clone(),
            }),
            Self::Release => Some(InboundCall::Release),
            Self::SetAccuracy { .. }
            | Self::SetInterval { .. }
            | Self::SetRunning { .. }
            | Self::RefuseExposure { .. } => None,
        }
    }
}

/// Parse a JSON-lines session.
///
/// Blank lines and lines starting with `#` are skipped. Errors carry the
/// 1-based line number.
pub fn parse_session(text: &str) -> Result<Vec<SessionStep>, Error> {
    let mut steps = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let step = serde_json::from_str(trimmed).map_err(|e| Error::Session {
            line: idx + 1,
            message: e.to_string(),
        })?;
        steps.push(step);
    }
    Ok(steps)
}

// ── ReplayManager ────────────────────────────────────────────────────

/// In-process manager and transport used for replaying sessions.
///
/// Register/unregister calls are recorded, not sent anywhere. Exposure
/// succeeds unless refusal was switched on with
/// [`set_refuse_exposure`](Self::set_refuse_exposure).
pub struct ReplayManager {
    available: watch::Sender<bool>,
    calls: Mutex<Vec<ManagerCall>>,
    exposed: Mutex<BTreeSet<ObjectPath>>,
    refuse_exposure: AtomicBool,
}

impl ReplayManager {
    pub fn new(available: bool) -> Self {
        let (available, _) = watch::channel(available);
        Self {
            available,
            calls: Mutex::new(Vec::new()),
            exposed: Mutex::new(BTreeSet::new()),
            refuse_exposure: AtomicBool::new(false),
        }
    }

    /// Flip manager reachability. Subscribers are only woken on a change.
    pub fn set_available(&self, available: bool) {
        let changed = self.available.send_if_modified(|current| {
            let changed = *current != available;
            *current = available;
            changed
        });
        if changed {
            tracing::debug!(available, "manager availability changed");
        }
    }

    pub fn set_refuse_exposure(&self, refuse: bool) {
        self.refuse_exposure.store(refuse, Ordering::SeqCst);
    }

    /// Every outbound call so far, oldest first.
    pub fn calls(&self) -> Vec<ManagerCall> {
        lock(&self.calls).clone()
    }

    /// Drain the recorded calls.
    pub fn take_calls(&self) -> Vec<ManagerCall> {
        std::mem::take(&mut *lock(&self.calls))
    }

    pub fn is_exposed(&self, path: &ObjectPath) -> bool {
        lock(&self.exposed).contains(path)
    }

    pub fn exposed_count(&self) -> usize {
        lock(&self.exposed).len()
    }
}

impl Default for ReplayManager {
    fn default() -> Self {
        Self::new(false)
    }
}

impl ConnectivityManager for ReplayManager {
    fn availability(&self) -> watch::Receiver<bool> {
        self.available.subscribe()
    }

    fn is_available(&self) -> bool {
        *self.available.borrow()
    }

    fn register_counter(&self, path: &ObjectPath, accuracy: u32, interval: u32) {
        tracing::debug!(%path, accuracy, interval, "register counter");
        lock(&self.calls).push(ManagerCall::Register {
            path: path.clone(),
            accuracy,
            interval,
        });
    }

    fn unregister_counter(&self, path: &ObjectPath) {
        tracing::debug!(%path, "unregister counter");
        lock(&self.calls).push(ManagerCall::Unregister { path: path.clone() });
    }
}

impl CounterBus for ReplayManager {
    fn expose(&self, path: &ObjectPath) -> Result<(), Error> {
        if self.refuse_exposure.load(Ordering::SeqCst) {
            return Err(Error::Exposure {
                path: path.to_string(),
                reason: "object path refused by transport".into(),
            });
        }
        if lock(&self.exposed).insert(path.clone()) {
            tracing::debug!(%path, "counter exposed");
        }
        Ok(())
    }

    fn withdraw(&self, path: &ObjectPath) {
        if lock(&self.exposed).remove(path) {
            tracing::debug!(%path, "counter withdrawn");
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Tests ────────────────────────────────────────────────────────────
