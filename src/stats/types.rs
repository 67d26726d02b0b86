use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub checkin_count: u64,
    pub focused_count: u64,
    pub wandering_count: u64,
    pub resting_count: u64,
}

impl StatsSnapshot {
    /// Menu-bar style one-line summary.
    pub fn summary(&self) -> String {
        format!(
            "Check-ins today: {} (focused {} / wandering {} / resting {})",
            self.checkin_count, self.focused_count, self.wandering_count, self.resting_count
        )
    }
}
