mod checkin_state;
mod log_entry;
mod window;

pub use checkin_state::CheckinState;
pub use log_entry::{DailyLogBreakdown, LogEntry, TIME_FORMAT};
pub use window::{NotificationWindow, WindowError};
