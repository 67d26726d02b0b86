use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::CheckinState;

/// Wall-clock format used for the `time` field of every record.
pub const TIME_FORMAT: &str = "%H:%M";

/// One completed check-in. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub time: String,
    pub response: String,
    #[serde(rename = "type")]
    pub state: CheckinState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
}

impl LogEntry {
    pub fn new(time: impl Into<String>, response: impl Into<String>, state: CheckinState) -> Self {
        Self {
            time: time.into(),
            response: response.into(),
            state,
            question: None,
        }
    }

    pub fn at(time: NaiveTime, response: impl Into<String>, state: CheckinState) -> Self {
        Self::new(time.format(TIME_FORMAT).to_string(), response, state)
    }

    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.question = Some(question.into());
        self
    }
}

/// Per-day tally derived from the log store. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLogBreakdown {
    pub date: NaiveDate,
    pub focused: u32,
    pub wandering: u32,
    pub resting: u32,
}

impl DailyLogBreakdown {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            focused: 0,
            wandering: 0,
            resting: 0,
        }
    }

    pub fn from_entries<'a>(date: NaiveDate, entries: impl IntoIterator<Item = &'a LogEntry>) -> Self {
        let mut breakdown = Self::empty(date);
        for entry in entries {
            match entry.state {
                CheckinState::Focused => breakdown.focused += 1,
                CheckinState::Wandering => breakdown.wandering += 1,
                CheckinState::Resting => breakdown.resting += 1,
            }
        }
        breakdown
    }

    pub fn total(&self) -> u32 {
        self.focused + self.wandering + self.resting
    }
}
