use chrono::{DateTime, Local};
use log::info;
use serde::Serialize;
use uuid::Uuid;

/// Payload handed to the notification collaborator when a check-in is due.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckinSignal {
    pub id: Uuid,
    pub scheduled_for: DateTime<Local>,
    pub fired_at: DateTime<Local>,
    pub question: String,
}

impl CheckinSignal {
    pub fn new(scheduled_for: DateTime<Local>, question: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            scheduled_for,
            fired_at: Local::now(),
            question,
        }
    }
}

/// Receives check-in signals from the scheduler.
///
/// Called while the scheduler holds its timer lock, so implementations must
/// return promptly and hand any real work (showing a prompt, waiting for the
/// user) to another task.
pub trait CheckinEmitter: Send + Sync {
    fn fire_checkin(&self, signal: CheckinSignal);
}

/// Headless emitter that only records the signal in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingEmitter;

impl CheckinEmitter for LoggingEmitter {
    fn fire_checkin(&self, signal: CheckinSignal) {
        info!(
            "Check-in due ({}) scheduled for {}: {}",
            signal.id,
            signal.scheduled_for.format("%Y-%m-%d %H:%M:%S"),
            signal.question
        );
    }
}

/// Forwards signals into a channel; used by the headless runner and tests.
#[derive(Debug, Clone)]
pub struct ChannelEmitter {
    tx: tokio::sync::mpsc::UnboundedSender<CheckinSignal>,
}

impl ChannelEmitter {
    pub fn new() -> (Self, tokio::sync::mpsc::UnboundedReceiver<CheckinSignal>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl CheckinEmitter for ChannelEmitter {
    fn fire_checkin(&self, signal: CheckinSignal) {
        if self.tx.send(signal).is_err() {
            log::warn!("Check-in signal dropped: receiver closed");
        }
    }
}
