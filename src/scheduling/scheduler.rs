use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::{bail, Result};
use chrono::{DateTime, Local, TimeZone};
use log::{info, warn};
use serde::Serialize;
use tokio::{
    sync::{mpsc, Mutex},
    task::JoinHandle,
    time::{self, Duration},
};
use tokio_util::sync::CancellationToken;

use crate::{
    models::NotificationWindow,
    settings::{pick_question, SettingsRepository},
};

use super::{
    context::{ContextChange, ContextChangeSender},
    emitter::{CheckinEmitter, CheckinSignal},
    window::next_allowed_instant,
};

const MIN_WAIT: Duration = Duration::from_secs(1);

/// Target instant for the next timer and how long to sleep until it.
fn plan_timer<Tz: TimeZone>(
    now: &DateTime<Tz>,
    window: &NotificationWindow,
) -> (DateTime<Tz>, Duration) {
    let target = next_allowed_instant(now, window);
    let wait = (target.clone() - now.clone())
        .to_std()
        .unwrap_or_default()
        .max(MIN_WAIT);
    (target, wait)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum SchedulerState {
    Idle,
    Armed {
        target: DateTime<Local>,
        generation: u64,
    },
}

struct PendingTimer {
    target: DateTime<Local>,
    cancel_token: CancellationToken,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct TimerSlot {
    generation: u64,
    pending: Option<PendingTimer>,
}

impl TimerSlot {
    fn disarm(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.cancel_token.cancel();
            pending.handle.abort();
        }
    }
}

/// Keeps exactly one check-in timer armed and re-arms it after every firing
/// and every context change.
#[derive(Clone)]
pub struct CheckinScheduler {
    settings: Arc<dyn SettingsRepository>,
    emitter: Arc<dyn CheckinEmitter>,
    timer: Arc<Mutex<TimerSlot>>,
    shutdown_token: CancellationToken,
    context_tx: mpsc::UnboundedSender<ContextChange>,
    context_rx: Arc<Mutex<Option<mpsc::UnboundedReceiver<ContextChange>>>>,
    listening: Arc<AtomicBool>,
    listener: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl CheckinScheduler {
    pub fn new(settings: Arc<dyn SettingsRepository>, emitter: Arc<dyn CheckinEmitter>) -> Self {
        let (context_tx, context_rx) = mpsc::unbounded_channel();

        Self {
            settings,
            emitter,
            timer: Arc::new(Mutex::new(TimerSlot::default())),
            shutdown_token: CancellationToken::new(),
            context_tx,
            context_rx: Arc::new(Mutex::new(Some(context_rx))),
            listening: Arc::new(AtomicBool::new(false)),
            listener: Arc::new(Mutex::new(None)),
        }
    }

    /// Handle for delivering system wake / clock / zone / day changes.
    pub fn context_sender(&self) -> ContextChangeSender {
        ContextChangeSender::new(self.context_tx.clone(), self.listening.clone())
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }

    /// Starts listening for context changes and arms the first timer.
    pub async fn start(&self) -> Result<DateTime<Local>> {
        self.spawn_listener().await;
        self.schedule_next().await
    }

    pub async fn state(&self) -> SchedulerState {
        let slot = self.timer.lock().await;
        match &slot.pending {
            Some(pending) => SchedulerState::Armed {
                target: pending.target,
                generation: slot.generation,
            },
            None => SchedulerState::Idle,
        }
    }

    /// Replaces any pending timer with one aimed at the next allowed instant
    /// under the current notification window.
    pub async fn schedule_next(&self) -> Result<DateTime<Local>> {
        let mut slot = self.timer.lock().await;
        if self.shutdown_token.is_cancelled() {
            bail!("check-in scheduler has been shut down");
        }
        Ok(self.arm_locked(&mut slot))
    }

    /// Cancels the pending timer and stops listening for context changes.
    pub async fn shutdown(&self) {
        self.listening.store(false, Ordering::Release);
        self.shutdown_token.cancel();
        self.timer.lock().await.disarm();

        if let Some(handle) = self.listener.lock().await.take() {
            if let Err(err) = handle.await {
                if !err.is_cancelled() {
                    warn!("Context listener failed to join: {err}");
                }
            }
        }

        info!("Check-in scheduler shut down");
    }

    fn arm_locked(&self, slot: &mut TimerSlot) -> DateTime<Local> {
        let now = Local::now();
        let window = self.settings.notification_window();
        let (target, wait) = plan_timer(&now, &window);

        slot.disarm();
        slot.generation = slot.generation.wrapping_add(1);
        let generation = slot.generation;

        // Child tokens are born cancelled once shutdown has started.
        let cancel_token = self.shutdown_token.child_token();
        let token = cancel_token.clone();
        let scheduler = self.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = time::sleep(wait) => scheduler.on_timer_fired(generation).await,
                _ = token.cancelled() => {}
            }
        });

        slot.pending = Some(PendingTimer {
            target,
            cancel_token,
            handle,
        });

        info!(
            "Next check-in at {} (window {:02}-{:02}, in {}s)",
            target.format("%Y-%m-%d %H:%M:%S"),
            window.start_hour(),
            window.end_hour(),
            wait.as_secs()
        );

        target
    }

    async fn on_timer_fired(&self, generation: u64) {
        let mut slot = self.timer.lock().await;
        if slot.generation != generation || self.shutdown_token.is_cancelled() {
            return;
        }

        // This task is the pending timer; drop it without aborting ourselves.
        let Some(fired) = slot.pending.take() else {
            return;
        };

        let question = pick_question(&self.settings.questions());
        self.emitter
            .fire_checkin(CheckinSignal::new(fired.target, question));

        self.arm_locked(&mut slot);
    }

    async fn spawn_listener(&self) {
        let Some(mut context_rx) = self.context_rx.lock().await.take() else {
            return;
        };
        if self.shutdown_token.is_cancelled() {
            return;
        }
        self.listening.store(true, Ordering::Release);

        let scheduler = self.clone();
        let shutdown_token = self.shutdown_token.clone();
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    change = context_rx.recv() => {
                        let Some(change) = change else { break };
                        info!("Rescheduling check-in after {change}");
                        if let Err(err) = scheduler.schedule_next().await {
                            warn!("Failed to reschedule after {change}: {err}");
                        }
                    }
                    _ = shutdown_token.cancelled() => break,
                }
            }
        });

        *self.listener.lock().await = Some(handle);
    }
}
