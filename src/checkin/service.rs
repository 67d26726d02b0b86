use std::sync::Arc;

use anyhow::anyhow;
use chrono::{DateTime, Local, NaiveDate};
use log::{error, info};
use thiserror::Error;
use tokio::{sync::Mutex, time::Duration};

use crate::{
    log_store::{LogStore, LogStoreError},
    models::{CheckinState, DailyLogBreakdown, LogEntry, NotificationWindow},
    scheduling::{
        context::DEFAULT_WATCH_INTERVAL, CheckinEmitter, CheckinScheduler, ClockWatcher,
        ContextChangeSender, SchedulerState,
    },
    settings::{pick_question, SettingsRepository},
    stats::{StatsAggregator, StatsSnapshot},
};

use super::classifier::classify_response;

#[derive(Debug, Error)]
pub enum CheckinError {
    #[error("response must not be empty")]
    EmptyResponse,
    #[error(transparent)]
    LogWrite(#[from] LogStoreError),
    #[error("failed to save settings: {0:#}")]
    Settings(anyhow::Error),
    #[error("failed to reschedule check-in: {0:#}")]
    Scheduler(anyhow::Error),
    #[error("log worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// The one owned service behind every check-in interaction: answer
/// ingestion, statistics, settings updates and the scheduler lifecycle.
#[derive(Clone)]
pub struct CheckinService {
    settings: Arc<dyn SettingsRepository>,
    log_store: LogStore,
    stats: StatsAggregator,
    scheduler: CheckinScheduler,
    clock_watcher: Arc<Mutex<ClockWatcher>>,
    watch_interval: Duration,
}

impl CheckinService {
    pub fn new(
        settings: Arc<dyn SettingsRepository>,
        log_store: LogStore,
        emitter: Arc<dyn CheckinEmitter>,
    ) -> Self {
        Self {
            scheduler: CheckinScheduler::new(settings.clone(), emitter),
            stats: StatsAggregator::new(log_store.clone()),
            settings,
            log_store,
            clock_watcher: Arc::new(Mutex::new(ClockWatcher::new())),
            watch_interval: DEFAULT_WATCH_INTERVAL,
        }
    }

    pub fn with_watch_interval(mut self, interval: Duration) -> Self {
        self.watch_interval = interval;
        self
    }

    /// Arms the first check-in and begins watching for clock discontinuities.
    pub async fn start(&self) -> anyhow::Result<DateTime<Local>> {
        let target = self.scheduler.start().await?;
        self.clock_watcher
            .lock()
            .await
            .start(self.scheduler.context_sender(), self.watch_interval);
        info!("Check-in service started");
        Ok(target)
    }

    pub async fn shutdown(&self) {
        self.clock_watcher.lock().await.stop().await;
        self.scheduler.shutdown().await;
        info!("Check-in service stopped");
    }

    /// For hosts that receive wake / clock / zone notifications from the OS.
    pub fn context_sender(&self) -> ContextChangeSender {
        self.scheduler.context_sender()
    }

    pub async fn scheduler_state(&self) -> SchedulerState {
        self.scheduler.state().await
    }

    pub fn next_question(&self) -> String {
        pick_question(&self.settings.questions())
    }

    pub async fn submit_answer(
        &self,
        response: &str,
        state: CheckinState,
    ) -> Result<LogEntry, CheckinError> {
        self.submit_answer_with_question(None, response, state)
            .await
    }

    /// Classifies the answer from its text before recording it.
    pub async fn submit_classified_answer(
        &self,
        question: Option<&str>,
        response: &str,
    ) -> Result<LogEntry, CheckinError> {
        let state = classify_response(response);
        self.submit_answer_with_question(question, response, state)
            .await
    }

    /// Counts the answer, then appends it to today's log. Counters are kept
    /// even when the append fails.
    pub async fn submit_answer_with_question(
        &self,
        question: Option<&str>,
        response: &str,
        state: CheckinState,
    ) -> Result<LogEntry, CheckinError> {
        let response = response.trim();
        if response.is_empty() {
            return Err(CheckinError::EmptyResponse);
        }

        let now = Local::now();
        let mut entry = LogEntry::at(now.time(), response, state);
        if let Some(question) = question {
            entry = entry.with_question(question);
        }

        let stats = self.stats.record_checkin(state).await;

        let log_store = self.log_store.clone();
        let to_append = entry.clone();
        let day = now.date_naive();
        let appended =
            tokio::task::spawn_blocking(move || log_store.append(&to_append, day)).await?;
        if let Err(err) = appended {
            error!("Failed to append check-in for {day}: {err}");
            return Err(err.into());
        }

        info!(
            "Recorded {} check-in at {} ({} today)",
            state.as_str(),
            entry.time,
            stats.checkin_count
        );
        Ok(entry)
    }

    pub fn notification_window(&self) -> NotificationWindow {
        self.settings.notification_window()
    }

    /// Persists the window and immediately re-arms the scheduler under it.
    /// Nothing is saved once the service has been shut down.
    pub async fn set_notification_window(
        &self,
        window: NotificationWindow,
    ) -> Result<DateTime<Local>, CheckinError> {
        if self.scheduler.is_shut_down() {
            return Err(CheckinError::Scheduler(anyhow!(
                "check-in scheduler has been shut down"
            )));
        }
        self.settings
            .set_notification_window(window)
            .map_err(CheckinError::Settings)?;
        self.scheduler
            .schedule_next()
            .await
            .map_err(CheckinError::Scheduler)
    }

    pub fn questions(&self) -> Vec<String> {
        self.settings.questions()
    }

    pub fn set_questions(&self, questions: Vec<String>) -> Result<(), CheckinError> {
        let questions = questions
            .into_iter()
            .map(|question| question.trim().to_string())
            .filter(|question| !question.is_empty())
            .collect();
        self.settings
            .set_questions(questions)
            .map_err(CheckinError::Settings)
    }

    pub async fn stats_snapshot(&self) -> StatsSnapshot {
        self.stats.snapshot().await
    }

    pub async fn recent_breakdown(&self, days: u32) -> Result<Vec<DailyLogBreakdown>, CheckinError> {
        Ok(self.stats.recent_breakdown(days).await?)
    }

    pub async fn recent_breakdown_until(
        &self,
        days: u32,
        today: NaiveDate,
    ) -> Result<Vec<DailyLogBreakdown>, CheckinError> {
        Ok(self.stats.recent_breakdown_until(days, today).await?)
    }

    pub async fn entries_for(&self, day: NaiveDate) -> Result<Vec<LogEntry>, CheckinError> {
        let log_store = self.log_store.clone();
        let entries = tokio::task::spawn_blocking(move || log_store.read_day(day)).await??;
        Ok(entries)
    }

    pub async fn today_entries(&self) -> Result<Vec<LogEntry>, CheckinError> {
        self.entries_for(Local::now().date_naive()).await
    }

    pub async fn logged_days(&self) -> Result<Vec<NaiveDate>, CheckinError> {
        let log_store = self.log_store.clone();
        let days = tokio::task::spawn_blocking(move || log_store.list_days()).await??;
        Ok(days)
    }
}
