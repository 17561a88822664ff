//! Usage counter core for `netcounter`.
//!
//! - **[`Counter`]**: the state machine. Registers with the
//!   connectivity manager using the configured accuracy and interval,
//!   follows manager availability, and folds incoming usage reports into
//!   separate home and roaming buckets. Cheaply cloneable; every clone
//!   drives the same counter.
//!
//! - **[`CounterEvent`]**: change notifications, fanned out through a
//!   `tokio::sync::broadcast` channel ([`Counter::events()`]).
//!
//! - **[`CounterSnapshot`]**: point-in-time view of all counter state,
//!   published through a `watch` channel ([`Counter::state()`],
//!   [`Counter::snapshots()`]).
//!
//! - **[`CounterService`]**: the delivery loop that applies inbound
//!   manager calls and availability changes one at a time, in arrival order.

pub mod bucket;
pub mod config;
pub mod counter;
pub mod error;
pub mod event;
pub mod service;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bucket::UsageBucket;
pub use config::CounterConfig;
pub use counter::{Counter, CounterSnapshot};
pub use error::CoreError;
pub use event::CounterEvent;
pub use service::CounterService;
pub use stream::SnapshotStream;

// The manager boundary types consumers need alongside the counter.
pub use netcounter_api::{
    ConnectivityManager, CounterBus, CounterMap, InboundCall, ManagerCall, ObjectPath,
    ReplayManager, SessionStep, UsageReport, UsageSample, parse_session,
};
