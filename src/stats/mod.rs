mod types;

pub use types::StatsSnapshot;

use chrono::{Local, NaiveDate};
use std::sync::Arc;
use tokio::{sync::Mutex, task::JoinError};

use crate::{
    log_store::LogStore,
    models::{CheckinState, DailyLogBreakdown},
};

/// Session counters plus log-derived history.
///
/// Counters start at zero with every process and are not rebuilt from the
/// log files; `recent_breakdown` always reads from disk.
#[derive(Clone)]
pub struct StatsAggregator {
    inner: Arc<Mutex<StatsSnapshot>>,
    log_store: LogStore,
}

impl StatsAggregator {
    pub fn new(log_store: LogStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StatsSnapshot::default())),
            log_store,
        }
    }

    pub async fn record_checkin(&self, state: CheckinState) -> StatsSnapshot {
        let mut stats = self.inner.lock().await;

        stats.checkin_count += 1;
        match state {
            CheckinState::Focused => stats.focused_count += 1,
            CheckinState::Wandering => stats.wandering_count += 1,
            CheckinState::Resting => stats.resting_count += 1,
        }

        *stats
    }

    pub async fn snapshot(&self) -> StatsSnapshot {
        *self.inner.lock().await
    }

    pub async fn reset(&self) {
        *self.inner.lock().await = StatsSnapshot::default();
    }

    pub async fn recent_breakdown(&self, days: u32) -> Result<Vec<DailyLogBreakdown>, JoinError> {
        self.recent_breakdown_until(days, Local::now().date_naive())
            .await
    }

    /// The `days` calendar days ending at `today`, oldest first.
    pub async fn recent_breakdown_until(
        &self,
        days: u32,
        today: NaiveDate,
    ) -> Result<Vec<DailyLogBreakdown>, JoinError> {
        let log_store = self.log_store.clone();
        tokio::task::spawn_blocking(move || log_store.recent_daily_breakdown(days, today)).await
    }
}
