use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub const DEFAULT_START_HOUR: u32 = 9;
pub const DEFAULT_END_HOUR: u32 = 20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("hour {0} is outside 0..=23")]
    HourOutOfRange(u32),
}

/// Hours of the day during which automatic check-ins may fire.
///
/// Equal bounds mean the window is unrestricted. `start < end` allows
/// `[start, end)`; `start > end` wraps past midnight.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationWindow {
    start_hour: u32,
    end_hour: u32,
}

impl Default for NotificationWindow {
    fn default() -> Self {
        Self {
            start_hour: DEFAULT_START_HOUR,
            end_hour: DEFAULT_END_HOUR,
        }
    }
}

impl NotificationWindow {
    pub fn new(start_hour: u32, end_hour: u32) -> Result<Self, WindowError> {
        for hour in [start_hour, end_hour] {
            if hour > 23 {
                return Err(WindowError::HourOutOfRange(hour));
            }
        }
        Ok(Self {
            start_hour,
            end_hour,
        })
    }

    pub fn unrestricted() -> Self {
        Self {
            start_hour: 0,
            end_hour: 0,
        }
    }

    pub fn start_hour(&self) -> u32 {
        self.start_hour
    }

    pub fn end_hour(&self) -> u32 {
        self.end_hour
    }

    pub fn is_unrestricted(&self) -> bool {
        self.start_hour == self.end_hour
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawWindow {
    start_hour: Option<u32>,
    end_hour: Option<u32>,
}

impl<'de> Deserialize<'de> for NotificationWindow {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Out-of-range persisted hours are clamped, never rejected.
        let raw = RawWindow::deserialize(deserializer)?;
        Ok(Self {
            start_hour: raw.start_hour.unwrap_or(DEFAULT_START_HOUR).min(23),
            end_hour: raw.end_hour.unwrap_or(DEFAULT_END_HOUR).min(23),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_hours() {
        assert_eq!(
            NotificationWindow::new(24, 5),
            Err(WindowError::HourOutOfRange(24))
        );
        assert_eq!(
            NotificationWindow::new(5, 99),
            Err(WindowError::HourOutOfRange(99))
        );
        assert!(NotificationWindow::new(23, 0).is_ok());
    }

    #[test]
    fn persisted_values_are_clamped_and_defaulted() {
        let window: NotificationWindow =
            serde_json::from_str(r#"{"startHour":42}"#).expect("deserialize");
        assert_eq!(window.start_hour(), 23);
        assert_eq!(window.end_hour(), DEFAULT_END_HOUR);
    }

    #[test]
    fn default_matches_daytime_hours() {
        let window = NotificationWindow::default();
        assert_eq!((window.start_hour(), window.end_hour()), (9, 20));
        assert!(!window.is_unrestricted());
    }
}
