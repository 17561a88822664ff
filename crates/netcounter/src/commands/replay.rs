//! `replay`: drive a fresh counter through a recorded manager session.
//!
//! Steps are applied one at a time on the calling thread, so the event
//! log attributes every event to the step that caused it. The session's
//! manager side is played by a [`ReplayManager`], which records the
//! register/unregister traffic the counter produces.

use std::fmt::Write as _;
use std::io::Read;
use std::sync::Arc;

use serde::Serialize;
use tabled::Tabled;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info, warn};

use netcounter_core::{
    CoreError, Counter, CounterConfig, CounterEvent, CounterSnapshot, ManagerCall, ReplayManager,
    SessionStep, UsageBucket, parse_session,
};

use super::Ctx;
use crate::cli::ReplayArgs;
use crate::error::CliError;
use crate::output;

// ── Report ───────────────────────────────────────────────────────────

/// One event, tagged with the 1-based step that raised it. `None` marks
/// events raised by the final shutdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub step: Option<usize>,
    pub event: CounterEvent,
}

#[derive(Debug, Serialize)]
pub struct ReplayReport {
    pub steps: usize,
    pub events: Vec<EventRecord>,
    /// State after the last step, before shutdown.
    pub counter: CounterSnapshot,
    /// Every manager call, shutdown included.
    pub calls: Vec<ManagerCall>,
}

// ── Handler ──────────────────────────────────────────────────────────

pub fn handle(args: &ReplayArgs, ctx: &Ctx) -> Result<(), CliError> {
    let mut counter_config =
        netcounter_config::load_config(ctx.config_path.as_deref())?.counter_config()?;
    if let Some(accuracy) = args.accuracy {
        counter_config.accuracy = accuracy;
    }
    if let Some(interval) = args.interval {
        counter_config.interval = interval;
    }
    if args.start {
        counter_config.start_running = true;
    }

    let text = read_input(&args.input)?;
    let steps = parse_session(&text).map_err(CoreError::from)?;
    info!(input = %args.input, steps = steps.len(), "replaying session");

    let report = replay_session(steps, &counter_config)?;
    let out = output::render(
        ctx.output,
        &report,
        |r| render_table(r, ctx.color),
        render_plain,
    )?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}

fn read_input(input: &str) -> Result<String, CliError> {
    if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|source| CliError::Input {
                source_name: "stdin".into(),
                source,
            })?;
        return Ok(buf);
    }
    std::fs::read_to_string(input).map_err(|source| CliError::Input {
        source_name: input.into(),
        source,
    })
}

// ── Replay ───────────────────────────────────────────────────────────

/// Run `steps` against a new counter whose manager starts out unavailable.
pub fn replay_session(
    steps: Vec<SessionStep>,
    config: &CounterConfig,
) -> Result<ReplayReport, CliError> {
    let manager = Arc::new(ReplayManager::new(false));
    let counter = Counter::with_manager(config, Arc::clone(&manager))?;
    let mut rx = counter.events();
    let mut events = Vec::new();

    let total = steps.len();
    for (idx, step) in steps.into_iter().enumerate() {
        let number = idx + 1;
        debug!(step = number, ?step, "applying step");
        apply_step(&counter, &manager, step);
        drain(&mut rx, Some(number), &mut events);
    }

    let snapshot = counter.snapshot();
    counter.shutdown();
    drain(&mut rx, None, &mut events);

    Ok(ReplayReport {
        steps: total,
        events,
        counter: snapshot,
        calls: manager.take_calls(),
    })
}

fn apply_step(counter: &Counter, manager: &ReplayManager, step: SessionStep) {
    match step {
        SessionStep::SetAccuracy { value } => counter.set_accuracy(value),
        SessionStep::SetInterval { value } => counter.set_interval(value),
        SessionStep::SetRunning { value } => counter.set_running(value),
        SessionStep::RefuseExposure { refuse } => manager.set_refuse_exposure(refuse),
        other => {
            if let SessionStep::Availability { available } = other {
                manager.set_available(available);
            }
            if let Some(call) = other.inbound() {
                counter.deliver(call);
            }
        }
    }
}

fn drain(
    rx: &mut broadcast::Receiver<Arc<CounterEvent>>,
    step: Option<usize>,
    log: &mut Vec<EventRecord>,
) {
    loop {
        match rx.try_recv() {
            Ok(event) => log.push(EventRecord {
                step,
                event: (*event).clone(),
            }),
            Err(TryRecvError::Lagged(missed)) => {
                warn!(missed, "event log fell behind; raise counter.event_capacity");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

// ── Rendering ────────────────────────────────────────────────────────

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "Step")]
    step: String,
    #[tabled(rename = "Event")]
    event: &'static str,
    #[tabled(rename = "Detail")]
    detail: String,
}

#[derive(Tabled)]
struct BucketRow {
    #[tabled(rename = "Context")]
    context: &'static str,
    #[tabled(rename = "Received (B)")]
    bytes_in: u64,
    #[tabled(rename = "Transmitted (B)")]
    bytes_out: u64,
    #[tabled(rename = "Online (s)")]
    seconds_online: u32,
}

#[derive(Tabled)]
struct CallRow {
    #[tabled(rename = "Call")]
    call: &'static str,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Accuracy (KB)")]
    accuracy: String,
    #[tabled(rename = "Interval (s)")]
    interval: String,
}

fn context(roaming: bool) -> &'static str {
    if roaming { "roaming" } else { "home" }
}

fn step_label(step: Option<usize>) -> String {
    step.map_or_else(|| "end".into(), |n| n.to_string())
}

fn event_detail(event: &CounterEvent) -> String {
    match event {
        CounterEvent::UsageChanged {
            service,
            counters,
            roaming,
        } => format!(
            "{service} [{}] {}",
            context(*roaming),
            serde_json::Value::Object(counters.clone())
        ),
        CounterEvent::RoamingChanged { roaming } => context(*roaming).into(),
        CounterEvent::BytesReceivedChanged { value }
        | CounterEvent::BytesTransmittedChanged { value } => format!("{value} B"),
        CounterEvent::SecondsOnlineChanged { value } | CounterEvent::IntervalChanged { value } => {
            format!("{value} s")
        }
        CounterEvent::AccuracyChanged { value } => format!("{value} KB"),
        CounterEvent::RunningChanged { running } => running.to_string(),
        _ => String::new(),
    }
}

fn bucket_row(context: &'static str, bucket: &UsageBucket) -> BucketRow {
    BucketRow {
        context,
        bytes_in: bucket.bytes_in,
        bytes_out: bucket.bytes_out,
        seconds_online: bucket.seconds_online,
    }
}

fn call_row(call: &ManagerCall) -> CallRow {
    let path = call.path().to_string();
    match call {
        ManagerCall::Register {
            accuracy, interval, ..
        } => CallRow {
            call: "register",
            path,
            accuracy: accuracy.to_string(),
            interval: interval.to_string(),
        },
        ManagerCall::Unregister { .. } => CallRow {
            call: "unregister",
            path,
            accuracy: "-".into(),
            interval: "-".into(),
        },
    }
}

fn render_table(report: &ReplayReport, color: bool) -> String {
    let snap = &report.counter;
    let events: Vec<EventRow> = report
        .events
        .iter()
        .map(|r| EventRow {
            step: step_label(r.step),
            event: r.event.name(),
            detail: event_detail(&r.event),
        })
        .collect();
    let buckets = [
        bucket_row("home", &snap.home_usage),
        bucket_row("roaming", &snap.roaming_usage),
    ];
    let calls: Vec<CallRow> = report.calls.iter().map(call_row).collect();

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({} steps)",
        output::heading("Events", color),
        report.steps
    );
    let _ = writeln!(out, "{}", output::table(&events));
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{} {}  {}  {}  accuracy {} KB  interval {} s",
        output::heading("Counter", color),
        snap.path,
        output::flag(snap.running, "running", "stopped", color),
        output::flag(snap.roaming, "roaming", "home", color),
        snap.accuracy,
        snap.interval,
    );
    let _ = writeln!(out, "{}", output::table(&buckets));
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", output::heading("Manager calls", color));
    out.push_str(&output::table(&calls));
    out
}

fn render_plain(report: &ReplayReport) -> String {
    report
        .events
        .iter()
        .map(|r| {
            format!(
                "{}\t{}\t{}",
                step_label(r.step),
                r.event.name(),
                event_detail(&r.event)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use netcounter_core::ObjectPath;

    fn session(text: &str) -> Vec<SessionStep> {
        parse_session(text).unwrap()
    }

    fn names(report: &ReplayReport) -> Vec<(Option<usize>, &'static str)> {
        report
            .events
            .iter()
            .map(|r| (r.step, r.event.name()))
            .collect()
    }

    #[test]
    fn deferred_start_registers_once_manager_appears() {
        let steps = session(
            r#"
{"type":"set_running","value":true}
{"type":"availability","available":true}
{"type":"usage","service":"/net/connman/service/wifi_1","home":{"RX.Bytes":100,"Time":30}}
"#,
        );
        let report = replay_session(steps, &CounterConfig::default()).unwrap();

        assert_eq!(report.steps, 3);
        assert_eq!(
            names(&report),
            vec![
                (Some(2), "running-changed"),
                (Some(3), "usage-changed"),
                (Some(3), "bytes-received-changed"),
                (Some(3), "seconds-online-changed"),
                (None, "running-changed"),
            ]
        );
        assert!(report.counter.running);
        assert_eq!(report.counter.home_usage.bytes_in, 100);
        assert_eq!(report.counter.home_usage.seconds_online, 30);

        let path = report.counter.path.clone();
        assert_eq!(
            report.calls,
            vec![
                ManagerCall::Register {
                    path: path.clone(),
                    accuracy: 1024,
                    interval: 1,
                },
                ManagerCall::Unregister { path },
            ]
        );
    }

    #[test]
    fn refused_exposure_keeps_counter_idle() {
        let steps = session(
            r#"
{"type":"refuse_exposure","refuse":true}
{"type":"set_running","value":true}
{"type":"availability","available":true}
"#,
        );
        let report = replay_session(steps, &CounterConfig::default()).unwrap();
        // Exposure failed, so the pending start was never reconciled.
        assert!(!report.counter.running);
        assert!(report.events.is_empty());
    }

    #[test]
    fn owner_setters_reregister() {
        let steps = session(
            r#"
{"type":"availability","available":true}
{"type":"set_accuracy","value":2048}
"#,
        );
        let report = replay_session(steps, &CounterConfig::default()).unwrap();
        assert_eq!(report.counter.accuracy, 2048);
        assert!(report.calls.contains(&ManagerCall::Register {
            path: report.counter.path.clone(),
            accuracy: 2048,
            interval: 1,
        }));
        assert!(
            report
                .events
                .iter()
                .any(|r| r.event == CounterEvent::AccuracyChanged { value: 2048 })
        );
    }

    #[test]
    fn plain_lists_one_event_per_line() {
        let steps = session(r#"{"type":"release"}"#);
        let report = replay_session(steps, &CounterConfig::default()).unwrap();
        assert_eq!(render_plain(&report), "1\treleased\t");
    }

    #[test]
    fn table_shows_both_buckets_and_calls() {
        let steps = session(
            r#"
{"type":"availability","available":true}
{"type":"set_running","value":true}
{"type":"usage","service":"/net/connman/service/cell_1","roaming":{"TX.Bytes":7}}
"#,
        );
        let report = replay_session(steps, &CounterConfig::default()).unwrap();
        let text = render_table(&report, false);
        assert!(text.contains("Events (3 steps)"));
        assert!(text.contains("roaming-changed"));
        assert!(text.contains("roaming"));
        assert!(text.contains("running"));
        assert!(text.contains("register"));
        assert!(text.contains("unregister"));
    }

    #[test]
    fn call_rows_carry_the_counter_path() {
        let path = ObjectPath::parse("/ConnectivityCounter/abc").unwrap();
        let register = call_row(&ManagerCall::Register {
            path: path.clone(),
            accuracy: 2048,
            interval: 5,
        });
        assert_eq!(register.call, "register");
        assert_eq!(register.path, "/ConnectivityCounter/abc");
        assert_eq!(register.accuracy, "2048");
        assert_eq!(register.interval, "5");

        let unregister = call_row(&ManagerCall::Unregister { path });
        assert_eq!(unregister.call, "unregister");
        assert_eq!(unregister.path, "/ConnectivityCounter/abc");
        assert_eq!(unregister.accuracy, "-");
    }
}
