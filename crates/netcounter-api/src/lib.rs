// netcounter-api: the connectivity-manager side of a usage counter.
//
// Everything the counter needs to know about the outside world lives
// here: object paths, usage payload decoding, the manager and bus seams,
// inbound call dispatch, and a recorded-session transport.

pub mod bus;
pub mod call;
pub mod error;
pub mod manager;
pub mod path;
pub mod session;
pub mod usage;

pub use bus::CounterBus;
pub use call::{InboundCall, UsageReport};
pub use error::Error;
pub use manager::{ConnectivityManager, ManagerCall};
pub use path::ObjectPath;
pub use session::{ReplayManager, SessionStep, parse_session};
pub use usage::{CounterMap, UsageSample};
