use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

use chrono::{DateTime, FixedOffset, Local, TimeDelta};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, Duration, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

pub const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_secs(30);
pub const DEBUG_WATCH_INTERVAL: Duration = Duration::from_secs(5);

/// Wall clock may drift this far from the monotonic clock between two samples
/// before it counts as a discontinuity.
const DRIFT_THRESHOLD_SECS: i64 = 60;

/// Events after which an absolute-time timer can no longer be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextChange {
    SystemWake,
    ClockChanged,
    TimeZoneChanged,
    CalendarDayChanged,
}

impl fmt::Display for ContextChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContextChange::SystemWake => "system wake",
            ContextChange::ClockChanged => "clock changed",
            ContextChange::TimeZoneChanged => "time zone changed",
            ContextChange::CalendarDayChanged => "calendar day changed",
        };
        f.write_str(name)
    }
}

/// Cloneable, non-blocking handle for delivering context changes to the
/// scheduler from any thread.
#[derive(Debug, Clone)]
pub struct ContextChangeSender {
    tx: mpsc::UnboundedSender<ContextChange>,
    listening: Arc<AtomicBool>,
}

impl ContextChangeSender {
    pub(crate) fn new(
        tx: mpsc::UnboundedSender<ContextChange>,
        listening: Arc<AtomicBool>,
    ) -> Self {
        Self { tx, listening }
    }

    /// Returns false, dropping the change, unless the scheduler has been
    /// started and not yet shut down.
    pub fn notify(&self, change: ContextChange) -> bool {
        if !self.listening.load(Ordering::Acquire) {
            return false;
        }
        self.tx.send(change).is_ok()
    }
}

#[derive(Debug, Clone, Copy)]
struct ClockSample {
    monotonic: Instant,
    wall: DateTime<FixedOffset>,
}

impl ClockSample {
    fn now() -> Self {
        Self {
            monotonic: Instant::now(),
            wall: Local::now().fixed_offset(),
        }
    }
}

/// Compares two consecutive wall-clock readings taken `monotonic_elapsed`
/// apart and reports every discontinuity between them.
pub fn detect_changes(
    previous: &DateTime<FixedOffset>,
    current: &DateTime<FixedOffset>,
    monotonic_elapsed: Duration,
) -> Vec<ContextChange> {
    let mut changes = Vec::new();

    let wall_elapsed = current.signed_duration_since(*previous);
    let monotonic = TimeDelta::from_std(monotonic_elapsed).unwrap_or(TimeDelta::MAX);
    let drift = wall_elapsed - monotonic;
    let threshold = TimeDelta::seconds(DRIFT_THRESHOLD_SECS);

    if wall_elapsed < TimeDelta::zero() || drift < -threshold {
        changes.push(ContextChange::ClockChanged);
    } else if drift > threshold {
        // Monotonic time stands still while the machine sleeps.
        changes.push(ContextChange::SystemWake);
    }

    if previous.offset() != current.offset() {
        changes.push(ContextChange::TimeZoneChanged);
    }

    if previous.date_naive() != current.date_naive() {
        changes.push(ContextChange::CalendarDayChanged);
    }

    changes
}

async fn clock_watch_loop(
    sender: ContextChangeSender,
    interval: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = ClockSample::now();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let current = ClockSample::now();
                let elapsed = current.monotonic.saturating_duration_since(last.monotonic);
                for change in detect_changes(&last.wall, &current.wall, elapsed) {
                    log_info!("Scheduling context changed: {}", change);
                    if !sender.notify(change) {
                        log_debug!("scheduler no longer listening; dropping {}", change);
                    }
                }
                last = current;
            }
            _ = cancel_token.cancelled() => {
                log_info!("clock watcher shutting down");
                break;
            }
        }
    }
}

/// Owns the background task that turns wall-clock discontinuities into
/// `ContextChange` signals.
pub struct ClockWatcher {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl ClockWatcher {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn start(&mut self, sender: ContextChangeSender, interval: Duration) {
        if self.handle.is_some() {
            return;
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(clock_watch_loop(sender, interval, cancel_token.clone()));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
    }

    pub async fn stop(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            match handle.await {
                Ok(()) => {}
                Err(err) if err.is_cancelled() => {
                    log_warn!("clock watcher task was cancelled before stopping");
                }
                Err(err) => log_error!("clock watcher task failed to join: {err}"),
            }
        }
    }
}

impl Default for ClockWatcher {
    fn default() -> Self {
        Self::new()
    }
}
